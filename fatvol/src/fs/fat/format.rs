// SPDX-License-Identifier: MIT

//! Format descriptors.
//!
//! FAT12, FAT16 and FAT32 share one driver; what differs between them is
//! data held by a [`FatFormat`].

use core::fmt;

use crate::fs::fat::constant::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatKind {
    Fat12,
    Fat16,
    Fat32,
}

impl FatKind {
    /// Variant implied by the number of data clusters on the volume.
    pub fn from_cluster_count(clusters: u32) -> Self {
        if clusters < FAT12_MAX_CLUSTERS {
            FatKind::Fat12
        } else if clusters < FAT16_MAX_CLUSTERS {
            FatKind::Fat16
        } else {
            FatKind::Fat32
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            FatKind::Fat12 => "FAT12",
            FatKind::Fat16 => "FAT16",
            FatKind::Fat32 => "FAT32",
        }
    }
}

impl fmt::Display for FatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the root directory lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootDirSource {
    /// Fixed run of sectors between the FATs and the data region.
    FixedRegion,
    /// Ordinary cluster chain starting at the boot sector's root cluster.
    ClusterChain,
}

/// When FAT entries are fetched from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatCaching {
    /// Whole FAT loaded at mount.
    Eager,
    /// One device read per lookup.
    OnDemand,
}

/// How requested names are normalized before matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCase {
    Upper,
    Preserve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    None,
    /// BS_FilSysType must start with "FAT".
    FatPrefix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatFormat {
    pub kind: FatKind,
    pub entry_bits: u8,
    pub entry_mask: u32,
    pub eoc: u32,
    pub root: RootDirSource,
    pub caching: FatCaching,
    pub name_case: NameCase,
    pub signature: SignatureCheck,
}

impl FatFormat {
    pub const FAT12: FatFormat = FatFormat {
        kind: FatKind::Fat12,
        entry_bits: 12,
        entry_mask: FAT12_MASK,
        eoc: FAT12_EOC,
        root: RootDirSource::FixedRegion,
        caching: FatCaching::Eager,
        name_case: NameCase::Upper,
        signature: SignatureCheck::None,
    };

    pub const FAT16: FatFormat = FatFormat {
        kind: FatKind::Fat16,
        entry_bits: 16,
        entry_mask: FAT16_MASK,
        eoc: FAT16_EOC,
        root: RootDirSource::FixedRegion,
        caching: FatCaching::OnDemand,
        name_case: NameCase::Upper,
        signature: SignatureCheck::None,
    };

    /// Matching is case-sensitive: requested names are compared as given.
    pub const FAT32: FatFormat = FatFormat {
        kind: FatKind::Fat32,
        entry_bits: 32,
        entry_mask: FAT32_MASK,
        eoc: FAT32_EOC,
        root: RootDirSource::ClusterChain,
        caching: FatCaching::OnDemand,
        name_case: NameCase::Preserve,
        signature: SignatureCheck::FatPrefix,
    };

    pub const fn for_kind(kind: FatKind) -> FatFormat {
        match kind {
            FatKind::Fat12 => Self::FAT12,
            FatKind::Fat16 => Self::FAT16,
            FatKind::Fat32 => Self::FAT32,
        }
    }

    pub const fn with_name_case(mut self, name_case: NameCase) -> FatFormat {
        self.name_case = name_case;
        self
    }

    #[inline]
    pub fn is_eoc(&self, value: u32) -> bool {
        value >= self.eoc
    }

    /// Byte offset of the entry of `cluster` inside the FAT.
    #[inline]
    pub fn entry_offset(&self, cluster: u32) -> u64 {
        let c = cluster as u64;
        match self.kind {
            FatKind::Fat12 => c + c / 2,
            FatKind::Fat16 => c * 2,
            FatKind::Fat32 => c * 4,
        }
    }

    /// Bytes to fetch for one entry; 12-bit entries straddle a 16-bit word.
    #[inline]
    pub fn entry_bytes(&self) -> usize {
        match self.kind {
            FatKind::Fat12 | FatKind::Fat16 => 2,
            FatKind::Fat32 => 4,
        }
    }
}
