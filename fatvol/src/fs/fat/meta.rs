// SPDX-License-Identifier: MIT

use diskio::prelude::*;

use crate::core::{cursor::ClusterMeta, errors::*};
use crate::fs::fat::{constant::*, format::*, table::FatTable, types::BootSector};

/// Sector layout derived from the boot sector. Computed once at mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatGeometry {
    pub fat_start: u32,
    /// Sectors in one FAT copy.
    pub fat_sectors: u32,
    /// First sector of the fixed root region (FAT12/16); first sector of
    /// the root cluster otherwise.
    pub root_dir_start: u32,
    /// 0 when the root directory lives in a cluster chain.
    pub root_dir_sectors: u32,
    pub data_start: u32,
    pub sectors_per_cluster: u32,
    pub bytes_per_cluster: u32,
    pub cluster_count: u32,
    pub last_cluster: u32,
    pub root_cluster: u32,
}

impl FatGeometry {
    pub fn new(boot: &BootSector, format: &FatFormat) -> FsParsingResult<Self> {
        let bps = boot.bytes_per_sector as u32;
        let spc = boot.sectors_per_cluster as u32;
        crate::ensure!(
            bps != 0 && spc != 0,
            FsParsingError::Invalid("Invalid boot sector")
        );
        let fat_start = boot.reserved_sectors as u32;
        let fats_end = (boot.num_fats as u32)
            .checked_mul(boot.sectors_per_fat)
            .and_then(|n| n.checked_add(fat_start))
            .ok_or(FsParsingError::Invalid("FAT region overflows"))?;

        let (root_dir_start, root_dir_sectors, data_start) = match format.root {
            RootDirSource::FixedRegion => {
                let root_bytes = boot.root_entries as u32 * FAT_DIR_ENTRY_SIZE as u32;
                let root_dir_sectors = root_bytes.div_ceil(bps);
                (fats_end, root_dir_sectors, fats_end + root_dir_sectors)
            }
            RootDirSource::ClusterChain => {
                let root_start = boot
                    .root_cluster
                    .checked_sub(FAT_FIRST_CLUSTER)
                    .and_then(|n| n.checked_mul(spc))
                    .and_then(|n| n.checked_add(fats_end))
                    .ok_or(FsParsingError::Invalid("Invalid root cluster"))?;
                (root_start, 0, fats_end)
            }
        };

        crate::ensure!(
            boot.total_sectors > data_start,
            FsParsingError::Invalid("Volume smaller than its metadata")
        );
        let cluster_count = (boot.total_sectors - data_start) / spc;

        // Entries the FAT can actually describe also bound the chain.
        let fat_entries = (boot.sectors_per_fat as u64 * bps as u64 * 8) / format.entry_bits as u64;
        let last_cluster = (cluster_count as u64 + 1).min(fat_entries.saturating_sub(1)) as u32;

        let geo = FatGeometry {
            fat_start,
            fat_sectors: boot.sectors_per_fat,
            root_dir_start,
            root_dir_sectors,
            data_start,
            sectors_per_cluster: spc,
            bytes_per_cluster: spc * bps,
            cluster_count,
            last_cluster,
            root_cluster: boot.root_cluster,
        };
        if format.root == RootDirSource::ClusterChain {
            crate::ensure!(
                geo.root_cluster <= geo.last_cluster,
                FsParsingError::Invalid("Invalid root cluster")
            );
        }
        Ok(geo)
    }

    /// `data_start + (cluster - 2) * sectors_per_cluster`
    #[inline]
    pub fn cluster_first_sector(&self, cluster: u32) -> u32 {
        self.data_start + (cluster - FAT_FIRST_CLUSTER) * self.sectors_per_cluster
    }
}

/// Everything a mounted volume knows about itself, apart from the device.
#[derive(Debug, Clone)]
pub struct FatMeta {
    pub format: FatFormat,
    pub boot: BootSector,
    pub geometry: FatGeometry,
    pub table: FatTable,
}

impl FatMeta {
    /// Reads and validates sector 0, derives the geometry and prepares FAT lookups.
    pub fn read<IO>(io: &mut IO, format: FatFormat) -> FsParsingResult<Self>
    where
        IO: BlockIO + ?Sized,
    {
        let sector = io.read_sector(FAT_BOOT_SECTOR)?;
        let boot = BootSector::decode(&sector, &format)?;
        let geometry = FatGeometry::new(&boot, &format)?;
        let table = FatTable::load(io, &format, &geometry)?;
        Ok(Self {
            format,
            boot,
            geometry,
            table,
        })
    }
}

impl ClusterMeta for FatMeta {
    fn last_cluster(&self) -> u32 {
        self.geometry.last_cluster
    }

    fn cluster_count(&self) -> u32 {
        self.geometry.cluster_count
    }

    fn is_eoc(&self, value: u32) -> bool {
        self.format.is_eoc(value)
    }

    fn next_cluster<IO>(&self, io: &mut IO, cluster: u32) -> FsCursorResult<u32>
    where
        IO: BlockIO + ?Sized,
    {
        self.table.entry(io, &self.format, &self.geometry, cluster)
    }
}
