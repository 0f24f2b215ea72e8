// SPDX-License-Identifier: MIT

use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::core::errors::*;
use crate::fs::fat::{attr::*, constant::*, format::*, utils::ShortName};

/// 32-byte short directory entry.
#[derive(FromBytes, KnownLayout, Immutable, Unaligned, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct DirEntry {
    pub name: [u8; FAT_NAME_LEN],
    pub ext: [u8; FAT_EXT_LEN],
    pub attr: u8,
    pub nt_reserved: u8,
    pub creation_time_tenth: u8,
    pub creation_time: U16,
    pub creation_date: U16,
    pub access_date: U16,
    pub first_cluster_high: U16,
    pub write_time: U16,
    pub write_date: U16,
    pub first_cluster_low: U16,
    pub file_size: U32,
}

impl DirEntry {
    pub fn from_raw(raw: &[u8]) -> FsParsingResult<Self> {
        DirEntry::read_from_bytes(raw).map_err(|_| FsParsingError::Invalid("Invalid Dir entry"))
    }

    /// First byte 0x00: nothing follows in this directory.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.name[0] == FAT_ENTRY_END_OF_DIR
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.name[0] == FAT_ENTRY_DELETED
    }

    #[inline]
    pub fn attributes(&self) -> FatAttributes {
        FatAttributes::from_bits_retain(self.attr)
    }

    #[inline]
    pub fn is_volume_label(&self) -> bool {
        self.attributes().is_volume_label()
    }

    #[inline]
    pub fn is_long_name(&self) -> bool {
        self.attributes().is_long_name()
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.attributes().is_dir()
    }

    /// Entries a listing or a lookup should consider.
    #[inline]
    pub fn is_visible(&self) -> bool {
        !self.is_deleted() && !self.is_volume_label() && !self.is_long_name()
    }

    /// FAT12/16 only store the low word; the high word is reused for
    /// other metadata there.
    pub fn first_cluster(&self, format: &FatFormat) -> u32 {
        let low = self.first_cluster_low.get() as u32;
        match format.kind {
            FatKind::Fat12 | FatKind::Fat16 => low,
            FatKind::Fat32 => ((self.first_cluster_high.get() as u32) << 16) | low,
        }
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.file_size.get()
    }

    #[inline]
    pub fn display_name(&self) -> ShortName {
        ShortName::from_parts(&self.name, &self.ext)
    }

    #[inline]
    pub fn matches(&self, name: &[u8; FAT_NAME_LEN], ext: &[u8; FAT_EXT_LEN]) -> bool {
        &self.name == name && &self.ext == ext
    }
}
