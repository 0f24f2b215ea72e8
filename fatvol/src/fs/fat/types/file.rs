// SPDX-License-Identifier: MIT

use crate::fs::fat::{format::FatFormat, types::DirEntry, utils::ShortName};

/// Handle returned by a successful open.
///
/// Holds no read position: every read walks the chain from `first_cluster`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatFile {
    pub name: ShortName,
    pub size: u32,
    pub first_cluster: u32,
    pub is_dir: bool,
}

impl FatFile {
    pub fn from_entry(entry: &DirEntry, format: &FatFormat) -> Self {
        Self {
            name: entry.display_name(),
            size: entry.size(),
            first_cluster: entry.first_cluster(format),
            is_dir: entry.is_dir(),
        }
    }
}
