// SPDX-License-Identifier: MIT

use core::fmt;
use core::ops::ControlFlow;

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec::Vec;

use diskio::prelude::*;

use crate::core::{cursor::ClusterCursor, errors::*};
use crate::fs::fat::{
    constant::*,
    format::*,
    meta::{FatGeometry, FatMeta},
    resolver,
    types::{BiosParameterBlock, BootSector, FatFile},
};

/// A mounted FAT volume.
///
/// Owns everything derived at mount and borrows the device for its lifetime.
/// There is no unmounted state: a failed [`mount`](Self::mount) yields no
/// instance at all.
pub struct FatFilesystem<'a, IO: BlockIO + ?Sized> {
    io: &'a mut IO,
    meta: FatMeta,
}

impl<'a, IO: BlockIO + ?Sized> FatFilesystem<'a, IO> {
    pub fn mount(io: &'a mut IO, format: FatFormat) -> FsResult<Self> {
        let meta = FatMeta::read(&mut *io, format)
            .inspect_err(|e| log::error!("{} mount failed: {e}", format.kind))?;

        let boot = &meta.boot;
        let geo = &meta.geometry;
        log::debug!(
            "{}: oem '{}', fs type '{}'",
            format.kind,
            boot.oem_name_str(),
            boot.fs_type_str()
        );
        log::info!("{} initialized:", format.kind);
        log::info!("  Bytes per sector: {}", boot.bytes_per_sector);
        log::info!("  Sectors per cluster: {}", boot.sectors_per_cluster);
        match format.root {
            RootDirSource::FixedRegion => {
                log::info!("  Root entries: {}", boot.root_entries);
                log::info!("  FAT start: {}", geo.fat_start);
                log::info!("  Root dir start: {}", geo.root_dir_start);
            }
            RootDirSource::ClusterChain => {
                log::info!("  Root cluster: {}", geo.root_cluster);
                log::info!("  FAT start: {}", geo.fat_start);
            }
        }
        log::info!("  Data start: {}", geo.data_start);

        Ok(Self { io, meta })
    }

    /// Mounts after picking the variant from the boot sector itself.
    ///
    /// A zero 16-bit FAT size next to a non-zero 32-bit one means FAT32;
    /// otherwise the data cluster count decides between FAT12 and FAT16.
    pub fn mount_auto(io: &'a mut IO) -> FsResult<Self> {
        let sector = io.read_sector(FAT_BOOT_SECTOR)?;
        let kind = detect_kind(&sector)?;
        log::debug!("detected {kind}");
        Self::mount(io, FatFormat::for_kind(kind))
    }

    #[inline]
    pub fn format(&self) -> &FatFormat {
        &self.meta.format
    }

    #[inline]
    pub fn geometry(&self) -> &FatGeometry {
        &self.meta.geometry
    }

    #[inline]
    pub fn boot_sector(&self) -> &BootSector {
        &self.meta.boot
    }

    #[inline]
    pub fn meta(&self) -> &FatMeta {
        &self.meta
    }

    /// Prints the root directory as a `Name` / `Size` table.
    pub fn list_root<W: fmt::Write + ?Sized>(&mut self, out: &mut W) -> FsResult {
        const FMT_ERR: FsError = FsError::Other("output sink rejected write");

        writeln!(out, "Root directory:").map_err(|_| FMT_ERR)?;
        writeln!(out, "{:<12} {:>10}", "Name", "Size").map_err(|_| FMT_ERR)?;
        writeln!(out, "------------------------").map_err(|_| FMT_ERR)?;

        let mut sink_ok = true;
        resolver::for_each_root_entry(&mut *self.io, &self.meta, |entry| {
            let name = entry.display_name();
            let res = if entry.is_dir() {
                writeln!(out, "{:<12} {:>10}", name, "<DIR>")
            } else {
                writeln!(out, "{:<12} {:>10}", name, entry.size())
            };
            if res.is_err() {
                sink_ok = false;
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        })?;

        if !sink_ok {
            return Err(FMT_ERR);
        }
        Ok(())
    }

    /// Visible root entries as open handles.
    #[cfg(feature = "alloc")]
    pub fn root_entries(&mut self) -> FsResult<Vec<FatFile>> {
        let format = self.meta.format;
        let mut out = Vec::new();
        resolver::for_each_root_entry(&mut *self.io, &self.meta, |entry| {
            out.push(FatFile::from_entry(entry, &format));
            ControlFlow::<()>::Continue(())
        })?;
        Ok(out)
    }

    /// Looks `name` up in the root directory.
    pub fn open(&mut self, name: &str) -> FsResult<FatFile> {
        let entry = resolver::find_in_root(&mut *self.io, &self.meta, name)?;
        Ok(FatFile::from_entry(&entry, &self.meta.format))
    }

    /// Reads from the start of `file` into `buf`.
    ///
    /// At most `min(buf.len(), file.size)` bytes are transferred; the count
    /// is lower only if the cluster chain ends first. Any device or chain
    /// error fails the whole call, and whatever already landed in `buf`
    /// must not be used.
    pub fn read(&mut self, file: &FatFile, buf: &mut [u8]) -> FsResult<usize> {
        let want = buf.len().min(file.size as usize);
        let geo = self.meta.geometry;
        let mut done = 0usize;

        let mut cur = ClusterCursor::new(&self.meta, file.first_cluster);
        while done < want {
            let Some(res) = cur.next_with(&mut *self.io) else {
                log::warn!("{}: chain ended after {done} of {want} bytes", file.name);
                break;
            };
            let first = geo.cluster_first_sector(res?);

            for s in 0..geo.sectors_per_cluster {
                if done >= want {
                    break;
                }
                let lba = first + s;
                let n = (want - done).min(SECTOR_SIZE);
                if n == SECTOR_SIZE {
                    self.io.read_sectors(lba, &mut buf[done..done + n])?;
                } else {
                    let sector = self.io.read_sector(lba)?;
                    buf[done..done + n].copy_from_slice(&sector[..n]);
                }
                done += n;
            }
        }
        Ok(done)
    }

    /// Writing is not implemented for any variant.
    pub fn write(&mut self, file: &FatFile, _data: &[u8]) -> FsResult<usize> {
        log::warn!("{}: write not supported on {}", file.name, self.meta.format.kind);
        Err(FsError::Unsupported)
    }

    /// Cluster numbers of `file`'s chain, in order.
    pub fn for_each_cluster<F>(&mut self, file: &FatFile, mut f: F) -> FsResult
    where
        F: FnMut(u32),
    {
        let mut cur = ClusterCursor::new(&self.meta, file.first_cluster);
        cur.for_each_cluster(&mut *self.io, |_, c| -> FsCursorResult {
            f(c);
            Ok(())
        })?;
        Ok(())
    }
}

/// Picks the FAT variant from a raw boot sector.
pub fn detect_kind(sector: &[u8]) -> FsParsingResult<FatKind> {
    let bpb = BiosParameterBlock::decode(sector)?;
    if bpb.fat_size_16.get() == 0 {
        return Ok(FatKind::Fat32);
    }

    // FAT12 and FAT16 share the fixed-root layout, so either geometry works.
    let boot = BootSector::decode(sector, &FatFormat::FAT16)?;
    let geo = FatGeometry::new(&boot, &FatFormat::FAT16)?;
    match FatKind::from_cluster_count(geo.cluster_count) {
        FatKind::Fat32 => Err(FsParsingError::Unsupported(
            "Too many clusters for a fixed root directory",
        )),
        kind => Ok(kind),
    }
}
