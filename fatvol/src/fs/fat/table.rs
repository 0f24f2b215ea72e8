// SPDX-License-Identifier: MIT

use diskio::prelude::*;

use crate::core::errors::*;
use crate::fs::fat::{constant::*, format::*, meta::FatGeometry};

// === Pure decoders ===

#[inline]
fn le_u16_at(bytes: &[u8], off: usize) -> Option<u16> {
    let raw = bytes.get(off..off.checked_add(2)?)?;
    Some(u16::from_le_bytes([raw[0], raw[1]]))
}

#[inline]
fn le_u32_at(bytes: &[u8], off: usize) -> Option<u32> {
    let raw = bytes.get(off..off.checked_add(4)?)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Two 12-bit entries share three bytes: the word at `c + c/2` holds entry
/// `c` in its low 12 bits when `c` is even, in its high 12 bits when odd.
pub fn fat12_entry(fat: &[u8], cluster: u32) -> Option<u32> {
    let c = cluster as usize;
    let word = le_u16_at(fat, c + c / 2)? as u32;
    Some(if cluster & 1 == 1 {
        word >> 4
    } else {
        word & FAT12_MASK
    })
}

pub fn fat16_entry(fat: &[u8], cluster: u32) -> Option<u32> {
    le_u16_at(fat, (cluster as usize).checked_mul(2)?).map(u32::from)
}

/// Top 4 bits are reserved and masked off.
pub fn fat32_entry(fat: &[u8], cluster: u32) -> Option<u32> {
    le_u32_at(fat, (cluster as usize).checked_mul(4)?).map(|v| v & FAT32_MASK)
}

/// Decodes the entry of `cluster` from a buffer laid out like the FAT.
#[inline]
pub fn decode_entry(kind: FatKind, fat: &[u8], cluster: u32) -> Option<u32> {
    match kind {
        FatKind::Fat12 => fat12_entry(fat, cluster),
        FatKind::Fat16 => fat16_entry(fat, cluster),
        FatKind::Fat32 => fat32_entry(fat, cluster),
    }
}

// === Table ===

/// Source of FAT lookups for a mounted volume.
#[derive(Clone)]
pub enum FatTable {
    /// First FAT copy held in memory; `len` bytes are valid.
    Cached {
        bytes: [u8; FAT_CACHE_BYTES],
        len: usize,
    },
    /// Every lookup reads the sector holding the entry.
    ReadThrough,
}

impl core::fmt::Debug for FatTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FatTable::Cached { len, .. } => write!(f, "FatTable::Cached({len} bytes)"),
            FatTable::ReadThrough => f.write_str("FatTable::ReadThrough"),
        }
    }
}

impl FatTable {
    /// Prepares lookups according to the format's caching policy.
    pub fn load<IO>(io: &mut IO, format: &FatFormat, geo: &FatGeometry) -> FsParsingResult<Self>
    where
        IO: BlockIO + ?Sized,
    {
        match format.caching {
            FatCaching::OnDemand => Ok(FatTable::ReadThrough),
            FatCaching::Eager => {
                let len = geo.fat_sectors as usize * FAT_SECTOR_SIZE as usize;
                crate::ensure!(
                    len <= FAT_CACHE_BYTES,
                    FsParsingError::Unsupported("FAT larger than the in-memory cache")
                );
                let mut bytes = [0u8; FAT_CACHE_BYTES];
                io.read_sectors(geo.fat_start, &mut bytes[..len])?;
                Ok(FatTable::Cached { bytes, len })
            }
        }
    }

    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, FatTable::Cached { .. })
    }

    /// Reads the entry of `cluster` in the first FAT copy.
    pub fn entry<IO>(
        &self,
        io: &mut IO,
        format: &FatFormat,
        geo: &FatGeometry,
        cluster: u32,
    ) -> FsCursorResult<u32>
    where
        IO: BlockIO + ?Sized,
    {
        match self {
            FatTable::Cached { bytes, len } => decode_entry(format.kind, &bytes[..*len], cluster)
                .ok_or(FsCursorError::InvalidCluster(cluster)),
            FatTable::ReadThrough => {
                let off = format.entry_offset(cluster);
                let width = format.entry_bytes();
                let fat_bytes = geo.fat_sectors as u64 * FAT_SECTOR_SIZE as u64;
                if off + width as u64 > fat_bytes {
                    return Err(FsCursorError::InvalidCluster(cluster));
                }

                let at = geo.fat_start as u64 * FAT_SECTOR_SIZE as u64 + off;
                let value = match format.kind {
                    FatKind::Fat12 => {
                        let word = io.read_u16_at(at)? as u32;
                        if cluster & 1 == 1 { word >> 4 } else { word & FAT12_MASK }
                    }
                    FatKind::Fat16 => io.read_u16_at(at)? as u32,
                    FatKind::Fat32 => io.read_u32_at(at)? & FAT32_MASK,
                };
                Ok(value)
            }
        }
    }
}
