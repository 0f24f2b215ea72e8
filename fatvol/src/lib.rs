// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core Modules
pub mod core;
pub mod fs;

// Reusable types and traits
pub use crate::core::traits::*;

/// FAT12/16/32 read-only driver.
///
/// See [`fat::FatFilesystem`] and [`fat::FatFormat`].
pub mod fat {
    pub use super::fs::fat::prelude::*;
}
