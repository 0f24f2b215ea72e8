// SPDX-License-Identifier: MIT
#![allow(dead_code)]

//! Synthetic FAT images for integration tests.

use std::collections::HashSet;

use fatvol::fat::*;

pub const SECTOR: usize = SECTOR_SIZE;

#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub kind: FatKind,
    pub total_sectors: u32,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub root_entries: u16,
    pub sectors_per_fat: u32,
}

impl Layout {
    /// 1.44M floppy.
    pub const FAT12: Layout = Layout {
        kind: FatKind::Fat12,
        total_sectors: 2880,
        sectors_per_cluster: 1,
        reserved_sectors: 1,
        num_fats: 2,
        root_entries: 224,
        sectors_per_fat: 9,
    };

    /// 4M disk, enough clusters to read as FAT16.
    pub const FAT16: Layout = Layout {
        kind: FatKind::Fat16,
        total_sectors: 8192,
        sectors_per_cluster: 1,
        reserved_sectors: 1,
        num_fats: 2,
        root_entries: 512,
        sectors_per_fat: 33,
    };

    /// 2M disk with a cluster-chain root.
    pub const FAT32: Layout = Layout {
        kind: FatKind::Fat32,
        total_sectors: 4096,
        sectors_per_cluster: 1,
        reserved_sectors: 32,
        num_fats: 2,
        root_entries: 0,
        sectors_per_fat: 32,
    };

    pub fn fat_start(&self) -> u32 {
        self.reserved_sectors as u32
    }

    pub fn root_dir_sectors(&self) -> u32 {
        (self.root_entries as u32 * 32).div_ceil(SECTOR as u32)
    }

    pub fn data_start(&self) -> u32 {
        self.fat_start() + self.num_fats as u32 * self.sectors_per_fat + self.root_dir_sectors()
    }

    pub fn bytes_per_cluster(&self) -> usize {
        self.sectors_per_cluster as usize * SECTOR
    }
}

/// A FAT volume assembled byte by byte.
pub struct FatImage {
    pub layout: Layout,
    pub bytes: Vec<u8>,
    next_free: u32,
    root_slots: usize,
    root_chain: Vec<u32>,
}

impl FatImage {
    pub fn new(layout: Layout) -> Self {
        let mut img = Self {
            layout,
            bytes: vec![0u8; layout.total_sectors as usize * SECTOR],
            next_free: 2,
            root_slots: 0,
            root_chain: Vec::new(),
        };
        img.write_boot_sector();

        let eoc = img.eoc();
        img.set_fat(0, 0xFFF_FFF8 & img.mask());
        img.set_fat(1, eoc);

        if layout.kind == FatKind::Fat32 {
            let root = img.alloc_chain(1)[0];
            img.root_chain.push(root);
        }
        img
    }

    pub fn fat12() -> Self {
        Self::new(Layout::FAT12)
    }

    pub fn fat16() -> Self {
        Self::new(Layout::FAT16)
    }

    pub fn fat32() -> Self {
        Self::new(Layout::FAT32)
    }

    fn mask(&self) -> u32 {
        match self.layout.kind {
            FatKind::Fat12 => 0xFFF,
            FatKind::Fat16 => 0xFFFF,
            FatKind::Fat32 => 0x0FFF_FFFF,
        }
    }

    /// Canonical end-of-chain marker written by formatters.
    pub fn eoc(&self) -> u32 {
        self.mask()
    }

    fn put_u16(&mut self, off: usize, v: u16) {
        self.bytes[off..off + 2].copy_from_slice(&v.to_le_bytes());
    }

    fn put_u32(&mut self, off: usize, v: u32) {
        self.bytes[off..off + 4].copy_from_slice(&v.to_le_bytes());
    }

    fn write_boot_sector(&mut self) {
        let l = self.layout;
        self.bytes[0..3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
        self.bytes[3..11].copy_from_slice(b"FATVOLT ");
        self.put_u16(11, SECTOR as u16);
        self.bytes[13] = l.sectors_per_cluster;
        self.put_u16(14, l.reserved_sectors);
        self.bytes[16] = l.num_fats;
        self.put_u16(17, l.root_entries);
        if l.total_sectors <= u16::MAX as u32 && l.kind != FatKind::Fat32 {
            self.put_u16(19, l.total_sectors as u16);
        } else {
            self.put_u32(32, l.total_sectors);
        }
        self.bytes[21] = 0xF8;

        match l.kind {
            FatKind::Fat12 | FatKind::Fat16 => {
                self.put_u16(22, l.sectors_per_fat as u16);
                self.bytes[38] = 0x29;
                self.bytes[43..54].copy_from_slice(b"NO NAME    ");
                let label: &[u8; 8] = if l.kind == FatKind::Fat12 { b"FAT12   " } else { b"FAT16   " };
                self.bytes[54..62].copy_from_slice(label);
            }
            FatKind::Fat32 => {
                self.put_u32(36, l.sectors_per_fat);
                self.put_u32(44, 2);
                self.put_u16(48, 1);
                self.put_u16(50, 6);
                self.bytes[66] = 0x29;
                self.bytes[71..82].copy_from_slice(b"NO NAME    ");
                self.bytes[82..90].copy_from_slice(b"FAT32   ");
            }
        }
        self.bytes[510] = 0x55;
        self.bytes[511] = 0xAA;
    }

    /// Writes `value` as the entry of `cluster` in every FAT copy.
    pub fn set_fat(&mut self, cluster: u32, value: u32) {
        let l = self.layout;
        for copy in 0..l.num_fats as u32 {
            let base = (l.fat_start() + copy * l.sectors_per_fat) as usize * SECTOR;
            let c = cluster as usize;
            match l.kind {
                FatKind::Fat12 => {
                    let off = base + c + c / 2;
                    let old = u16::from_le_bytes([self.bytes[off], self.bytes[off + 1]]);
                    let v = (value & 0xFFF) as u16;
                    let word = if c & 1 == 1 {
                        (old & 0x000F) | (v << 4)
                    } else {
                        (old & 0xF000) | v
                    };
                    self.put_u16(off, word);
                }
                FatKind::Fat16 => self.put_u16(base + c * 2, value as u16),
                FatKind::Fat32 => self.put_u32(base + c * 4, value),
            }
        }
    }

    pub fn cluster_lba(&self, cluster: u32) -> u32 {
        self.layout.data_start() + (cluster - 2) * self.layout.sectors_per_cluster as u32
    }

    fn cluster_offset(&self, cluster: u32) -> usize {
        self.cluster_lba(cluster) as usize * SECTOR
    }

    /// Allocates `n` consecutive free clusters linked in order.
    pub fn alloc_chain(&mut self, n: usize) -> Vec<u32> {
        let chain: Vec<u32> = (0..n as u32).map(|i| self.next_free + i).collect();
        self.next_free += n as u32;
        self.link(&chain);
        chain
    }

    /// Links `chain` in the FAT, last cluster marked end-of-chain.
    pub fn link(&mut self, chain: &[u32]) {
        let eoc = self.eoc();
        for (i, &c) in chain.iter().enumerate() {
            let next = chain.get(i + 1).copied().unwrap_or(eoc);
            self.set_fat(c, next);
        }
    }

    /// Copies `data` over the clusters of `chain`.
    pub fn fill(&mut self, chain: &[u32], data: &[u8]) {
        let bpc = self.layout.bytes_per_cluster();
        for (c, part) in chain.iter().zip(data.chunks(bpc)) {
            let off = self.cluster_offset(*c);
            self.bytes[off..off + part.len()].copy_from_slice(part);
        }
    }

    /// Free clusters, for callers building their own chains.
    pub fn reserve(&mut self, n: usize) -> Vec<u32> {
        let chain: Vec<u32> = (0..n as u32).map(|i| self.next_free + i).collect();
        self.next_free += n as u32;
        chain
    }

    /// Byte offset of the next root directory slot, growing the FAT32 root
    /// chain when its last cluster is full.
    fn root_slot_offset(&mut self, slot: usize) -> usize {
        let l = self.layout;
        match l.kind {
            FatKind::Fat12 | FatKind::Fat16 => {
                assert!(slot < l.root_entries as usize, "fixed root directory full");
                let root_start = l.fat_start() + l.num_fats as u32 * l.sectors_per_fat;
                root_start as usize * SECTOR + slot * 32
            }
            FatKind::Fat32 => {
                let per_cluster = l.bytes_per_cluster() / 32;
                let idx = slot / per_cluster;
                while idx >= self.root_chain.len() {
                    let c = self.reserve(1)[0];
                    self.root_chain.push(c);
                    let chain = self.root_chain.clone();
                    self.link(&chain);
                }
                self.cluster_offset(self.root_chain[idx]) + (slot % per_cluster) * 32
            }
        }
    }

    pub fn root_chain(&self) -> &[u32] {
        &self.root_chain
    }

    /// Appends a raw 32-byte entry to the root directory, returns its slot.
    pub fn push_raw(&mut self, raw: [u8; 32]) -> usize {
        let slot = self.root_slots;
        let off = self.root_slot_offset(slot);
        self.bytes[off..off + 32].copy_from_slice(&raw);
        self.root_slots += 1;
        slot
    }

    /// Overwrites an existing root slot.
    pub fn patch_slot(&mut self, slot: usize, f: impl FnOnce(&mut [u8])) {
        let off = self.root_slot_offset(slot);
        f(&mut self.bytes[off..off + 32]);
    }

    /// Adds a file holding `data`; returns its first cluster (0 when empty).
    pub fn add_file(&mut self, name: &[u8; 11], data: &[u8]) -> u32 {
        let n = data.len().div_ceil(self.layout.bytes_per_cluster());
        let chain = self.alloc_chain(n);
        self.fill(&chain, data);
        let first = chain.first().copied().unwrap_or(0);
        self.push_raw(entry(name, 0x20, first, data.len() as u32));
        first
    }

    pub fn add_dir(&mut self, name: &[u8; 11]) -> u32 {
        let first = self.alloc_chain(1)[0];
        self.push_raw(entry(name, 0x10, first, 0));
        first
    }

    /// Adds an entry pointing at an existing chain, with an explicit size.
    pub fn add_entry(&mut self, name: &[u8; 11], attr: u8, cluster: u32, size: u32) -> usize {
        self.push_raw(entry(name, attr, cluster, size))
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

/// Builds a raw 32-byte short entry.
pub fn entry(name: &[u8; 11], attr: u8, cluster: u32, size: u32) -> [u8; 32] {
    let mut e = [0u8; 32];
    e[..11].copy_from_slice(name);
    e[11] = attr;
    e[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    e[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
    e[28..32].copy_from_slice(&size.to_le_bytes());
    e
}

/// Deterministic test payload.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 251) as u8).collect()
}

/// Device that fails reads touching selected sectors.
pub struct FaultyIO<IO> {
    pub inner: IO,
    pub failing: HashSet<u32>,
}

impl<IO: BlockIO> FaultyIO<IO> {
    pub fn new(inner: IO) -> Self {
        Self {
            inner,
            failing: HashSet::new(),
        }
    }

    pub fn fail_at(mut self, lba: u32) -> Self {
        self.failing.insert(lba);
        self
    }
}

impl<IO: BlockIO> BlockIO for FaultyIO<IO> {
    fn read_sectors(&mut self, lba: u32, buf: &mut [u8]) -> BlockIOResult {
        let count = (buf.len() / SECTOR) as u32;
        if (lba..lba + count).any(|s| self.failing.contains(&s)) {
            return Err(BlockIOError::Device("injected read failure"));
        }
        self.inner.read_sectors(lba, buf)
    }

    fn sector_count(&self) -> Option<u64> {
        self.inner.sector_count()
    }
}
