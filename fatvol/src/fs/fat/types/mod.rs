// SPDX-License-Identifier: MIT

mod boot;
mod entries;
mod file;

pub use boot::*;
pub use entries::*;
pub use file::*;
