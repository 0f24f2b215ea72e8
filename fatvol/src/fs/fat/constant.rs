// SPDX-License-Identifier: MIT

// === Disk Layout Parameters ===

pub const FAT_SECTOR_SIZE: u16 = 512; // BPB_BytsPerSec, the only size the transports move
pub const FAT_BOOT_SECTOR: u32 = 0;
pub const FAT_FIRST_CLUSTER: u32 = 2;

// === Boot Sector Offsets ===

pub const FAT_BPB_SIZE: usize = 36;
pub const FAT_FS_TYPE_OFFSET: usize = 82; // BS_FilSysType (FAT32)
pub const FAT_FS_SIGNATURE: &[u8; 3] = b"FAT";

// === FAT Region Parameters ===

pub const FAT12_EOC: u32 = 0xFF8;
pub const FAT16_EOC: u32 = 0xFFF8;
pub const FAT32_EOC: u32 = 0x0FFF_FFF8;

pub const FAT12_MASK: u32 = 0xFFF;
pub const FAT16_MASK: u32 = 0xFFFF;
pub const FAT32_MASK: u32 = 0x0FFF_FFFF;

/// Cluster counts below these select FAT12 / FAT16.
pub const FAT12_MAX_CLUSTERS: u32 = 4085;
pub const FAT16_MAX_CLUSTERS: u32 = 65525;

/// Bytes of FAT kept in memory by eager formats.
pub const FAT_CACHE_SECTORS: usize = 12;
pub const FAT_CACHE_BYTES: usize = FAT_CACHE_SECTORS * FAT_SECTOR_SIZE as usize;

// === Directory Entries ===

pub const FAT_DIR_ENTRY_SIZE: usize = 32;
pub const FAT_NAME_LEN: usize = 8;
pub const FAT_EXT_LEN: usize = 3;
pub const FAT_ENTRY_END_OF_DIR: u8 = 0x00;
pub const FAT_ENTRY_DELETED: u8 = 0xE5;
