// SPDX-License-Identifier: MIT

use core::ops::ControlFlow;

use diskio::prelude::*;

use crate::core::{cursor::ClusterCursor, errors::*};
use crate::fs::fat::{
    constant::*, format::RootDirSource, meta::FatMeta, types::DirEntry, utils::to_short_name,
};

/// Outcome of scanning one directory sector.
enum Scan<B> {
    More,
    End,
    Stop(B),
}

fn scan_sector<B, F>(sector: &[u8], f: &mut F) -> FsResolverResult<Scan<B>>
where
    F: FnMut(&DirEntry) -> ControlFlow<B>,
{
    for raw in sector.chunks_exact(FAT_DIR_ENTRY_SIZE) {
        let entry = DirEntry::from_raw(raw)?;
        if entry.is_end() {
            return Ok(Scan::End);
        }
        if !entry.is_visible() {
            continue;
        }
        if let ControlFlow::Break(b) = f(&entry) {
            return Ok(Scan::Stop(b));
        }
    }
    Ok(Scan::More)
}

/// Calls `f` with every visible root directory entry, in on-disk order.
///
/// Stops at the end-of-directory marker, or early when `f` breaks; the
/// break value is returned.
pub fn for_each_root_entry<IO, B, F>(
    io: &mut IO,
    meta: &FatMeta,
    mut f: F,
) -> FsResolverResult<Option<B>>
where
    IO: BlockIO + ?Sized,
    F: FnMut(&DirEntry) -> ControlFlow<B>,
{
    let geo = &meta.geometry;

    match meta.format.root {
        RootDirSource::FixedRegion => {
            for s in 0..geo.root_dir_sectors {
                let sector = io.read_sector(geo.root_dir_start + s)?;
                match scan_sector(&sector, &mut f)? {
                    Scan::More => {}
                    Scan::End => return Ok(None),
                    Scan::Stop(b) => return Ok(Some(b)),
                }
            }
        }
        RootDirSource::ClusterChain => {
            let mut cur = ClusterCursor::new(meta, geo.root_cluster);
            while let Some(res) = cur.next_with(io) {
                let first = geo.cluster_first_sector(res?);
                for s in 0..geo.sectors_per_cluster {
                    let sector = io.read_sector(first + s)?;
                    match scan_sector(&sector, &mut f)? {
                        Scan::More => {}
                        Scan::End => return Ok(None),
                        Scan::Stop(b) => return Ok(Some(b)),
                    }
                }
            }
        }
    }
    Ok(None)
}

/// Looks `name` up in the root directory.
///
/// The name is normalized per the format's [`NameCase`](crate::fs::fat::format::NameCase)
/// and compared byte for byte, name field then extension field.
pub fn find_in_root<IO>(io: &mut IO, meta: &FatMeta, name: &str) -> FsResolverResult<DirEntry>
where
    IO: BlockIO + ?Sized,
{
    let (base, ext) = to_short_name(name, meta.format.name_case);

    let found = for_each_root_entry(io, meta, |entry| {
        if entry.matches(&base, &ext) {
            ControlFlow::Break(*entry)
        } else {
            ControlFlow::Continue(())
        }
    })?;

    match found {
        Some(entry) => {
            log::debug!(
                "found {} ({} bytes, cluster {})",
                entry.display_name(),
                entry.size(),
                entry.first_cluster(&meta.format)
            );
            Ok(entry)
        }
        None => Err(FsResolverError::NotFound),
    }
}
