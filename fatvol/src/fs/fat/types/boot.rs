// SPDX-License-Identifier: MIT

use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::core::errors::*;
use crate::fs::fat::{constant::*, format::*};

/// Common BIOS parameter block, bytes 0..36 of every FAT boot sector.
#[derive(FromBytes, KnownLayout, Immutable, Unaligned, Copy, Clone, Debug)]
#[repr(C)]
pub struct BiosParameterBlock {
    pub jump_boot: [u8; 3],
    pub oem_name: [u8; 8],
    pub bytes_per_sector: U16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: U16,
    pub num_fats: u8,
    pub root_entry_count: U16,
    pub total_sectors_16: U16,
    pub media: u8,
    pub fat_size_16: U16,
    pub sectors_per_track: U16,
    pub num_heads: U16,
    pub hidden_sectors: U32,
    pub total_sectors_32: U32,
}

/// FAT12/16 extended boot record, bytes 36..62.
#[derive(FromBytes, KnownLayout, Immutable, Unaligned, Copy, Clone, Debug)]
#[repr(C)]
pub struct ExtendedBootRecord {
    pub drive_number: u8,
    pub reserved1: u8,
    pub boot_signature: u8,
    pub volume_id: U32,
    pub volume_label: [u8; 11],
    pub fs_type: [u8; 8],
}

/// FAT32 extended boot record, bytes 36..90.
#[derive(FromBytes, KnownLayout, Immutable, Unaligned, Copy, Clone, Debug)]
#[repr(C)]
pub struct Fat32ExtendedBootRecord {
    pub fat_size_32: U32,
    pub ext_flags: U16,
    pub fs_version: U16,
    pub root_cluster: U32,
    pub fsinfo_sector: U16,
    pub backup_boot_sector: U16,
    pub reserved: [u8; 12],
    pub drive_number: u8,
    pub reserved1: u8,
    pub boot_signature: u8,
    pub volume_id: U32,
    pub volume_label: [u8; 11],
    pub fs_type: [u8; 8],
}

/// Decoded boot sector, in native integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootSector {
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub root_entries: u16,
    pub sectors_per_fat: u32,
    pub total_sectors: u32,
    /// 0 unless the format keeps its root directory in a cluster chain.
    pub root_cluster: u32,
    pub fs_type: [u8; 8],
}

impl BiosParameterBlock {
    pub fn decode(sector: &[u8]) -> FsParsingResult<Self> {
        BiosParameterBlock::read_from_prefix(sector)
            .map(|(bpb, _)| bpb)
            .map_err(|_| FsParsingError::Invalid("Boot sector too short"))
    }

    #[inline]
    pub fn total_sectors(&self) -> u32 {
        match self.total_sectors_16.get() {
            0 => self.total_sectors_32.get(),
            n => n as u32,
        }
    }
}

impl BootSector {
    /// Decodes and validates sector 0 for `format`.
    pub fn decode(sector: &[u8], format: &FatFormat) -> FsParsingResult<Self> {
        let bpb = BiosParameterBlock::decode(sector)?;
        let ext = sector
            .get(FAT_BPB_SIZE..)
            .ok_or(FsParsingError::Invalid("Boot sector too short"))?;

        let (sectors_per_fat, root_cluster, fs_type) = match format.root {
            RootDirSource::FixedRegion => {
                let (ebr, _) = ExtendedBootRecord::read_from_prefix(ext)
                    .map_err(|_| FsParsingError::Invalid("Boot sector too short"))?;
                (bpb.fat_size_16.get() as u32, 0, ebr.fs_type)
            }
            RootDirSource::ClusterChain => {
                let (ebr, _) = Fat32ExtendedBootRecord::read_from_prefix(ext)
                    .map_err(|_| FsParsingError::Invalid("Boot sector too short"))?;
                (ebr.fat_size_32.get(), ebr.root_cluster.get(), ebr.fs_type)
            }
        };

        let boot = BootSector {
            oem_name: bpb.oem_name,
            bytes_per_sector: bpb.bytes_per_sector.get(),
            sectors_per_cluster: bpb.sectors_per_cluster,
            reserved_sectors: bpb.reserved_sectors.get(),
            num_fats: bpb.num_fats,
            root_entries: bpb.root_entry_count.get(),
            sectors_per_fat,
            total_sectors: bpb.total_sectors(),
            root_cluster,
            fs_type,
        };
        boot.validate(format)?;
        Ok(boot)
    }

    fn validate(&self, format: &FatFormat) -> FsParsingResult {
        if format.signature == SignatureCheck::FatPrefix {
            crate::ensure!(
                self.fs_type.starts_with(FAT_FS_SIGNATURE),
                FsParsingError::Invalid("Not a FAT filesystem")
            );
        }
        crate::ensure!(
            self.bytes_per_sector != 0 && self.sectors_per_cluster != 0,
            FsParsingError::Invalid("Invalid boot sector")
        );
        crate::ensure!(
            self.bytes_per_sector == FAT_SECTOR_SIZE,
            FsParsingError::Unsupported("Sector size other than 512 bytes")
        );
        crate::ensure!(self.num_fats != 0, FsParsingError::Invalid("No FAT copies"));
        crate::ensure!(
            self.sectors_per_fat != 0,
            FsParsingError::Invalid("Zero sectors per FAT")
        );
        if format.root == RootDirSource::ClusterChain {
            crate::ensure!(
                self.root_cluster >= FAT_FIRST_CLUSTER,
                FsParsingError::Invalid("Invalid root cluster")
            );
        }
        Ok(())
    }

    /// `fs_type` label without its space padding, for diagnostics.
    pub fn fs_type_str(&self) -> &str {
        trimmed_label(&self.fs_type)
    }

    pub fn oem_name_str(&self) -> &str {
        trimmed_label(&self.oem_name)
    }
}

fn trimmed_label(raw: &[u8]) -> &str {
    let end = raw.iter().rposition(|&b| b != b' ' && b != 0).map_or(0, |i| i + 1);
    core::str::from_utf8(&raw[..end]).unwrap_or("?")
}
