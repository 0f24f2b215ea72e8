// SPDX-License-Identifier: MIT
#![cfg_attr(not(test), no_std)]

pub mod boot;
pub mod console;
pub mod logging;

pub use boot::{BootConfig, BootReport, Platform, VolumeFormat, kernel_main};

#[cfg(all(feature = "x86", target_arch = "x86_64"))]
pub use boot::boot_x86;
