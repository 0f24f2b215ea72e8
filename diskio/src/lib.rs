// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod errors;
mod macros;
pub mod poll;
pub mod port;
pub mod stats;

// Backend modules
pub mod ata;
pub mod fdc;

#[cfg(feature = "mem")]
mod mem;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::BlockIO;
    pub use super::BlockIOExt;
    pub use super::SECTOR_SIZE;
    pub use super::errors::*;
    pub use super::poll::PollBudget;
    pub use super::port::PortIO;
    pub use super::stats::*;

    pub use super::ata::{AtaConfig, AtaPio};
    pub use super::fdc::{DmaBuffer, Floppy, FloppyConfig, FloppyGeometry};

    #[cfg(feature = "mem")]
    pub use super::mem::MemBlockIO;

    #[cfg(all(feature = "x86", target_arch = "x86_64"))]
    pub use super::port::X86PortIO;
}

use errors::*;

// Constants

/// Size of one transport sector. Every backend moves whole sectors.
pub const SECTOR_SIZE: usize = 512;

// Traits

/// Sector-addressed block device.
///
/// Transfers whole [`SECTOR_SIZE`] sectors addressed by a 32-bit LBA. The
/// number of sectors is implied by the buffer length, which must be a
/// non-zero multiple of the sector size.
///
/// Implementations may target RAM, ATA disks, floppies, etc.
pub trait BlockIO {
    /// Reads `buf.len() / SECTOR_SIZE` sectors starting at `lba`.
    fn read_sectors(&mut self, lba: u32, buf: &mut [u8]) -> BlockIOResult;

    /// Writes `data.len() / SECTOR_SIZE` sectors starting at `lba`.
    fn write_sectors(&mut self, _lba: u32, _data: &[u8]) -> BlockIOResult {
        Err(BlockIOError::Unsupported)
    }

    /// Medium size in sectors, when the backend knows it.
    fn sector_count(&self) -> Option<u64> {
        None
    }
}

impl<T: BlockIO + ?Sized> BlockIO for &mut T {
    #[inline]
    fn read_sectors(&mut self, lba: u32, buf: &mut [u8]) -> BlockIOResult {
        (**self).read_sectors(lba, buf)
    }

    #[inline]
    fn write_sectors(&mut self, lba: u32, data: &[u8]) -> BlockIOResult {
        (**self).write_sectors(lba, data)
    }

    #[inline]
    fn sector_count(&self) -> Option<u64> {
        (**self).sector_count()
    }
}

/// Validates a transfer buffer and returns its sector count.
#[inline]
pub fn sectors_in(len: usize) -> BlockIOResult<usize> {
    if len == 0 {
        return Err(BlockIOError::InvalidRequest("zero sector count"));
    }
    if !len.is_multiple_of(SECTOR_SIZE) {
        return Err(BlockIOError::InvalidRequest(
            "buffer is not a whole number of sectors",
        ));
    }
    Ok(len / SECTOR_SIZE)
}

/// Extension helpers for BlockIO.
///
/// Byte-granular access built on whole-sector transfers through a single
/// stack scratch sector:
/// - single sector reads
/// - reads at arbitrary byte offsets, crossing sector boundaries
/// - little-endian primitive reads (read_u16_at/read_u32_at)
pub trait BlockIOExt: BlockIO {
    /// Reads one sector into a fresh array.
    #[inline]
    fn read_sector(&mut self, lba: u32) -> BlockIOResult<[u8; SECTOR_SIZE]> {
        let mut sector = [0u8; SECTOR_SIZE];
        self.read_sectors(lba, &mut sector)?;
        Ok(sector)
    }

    /// Reads `buf.len()` bytes starting at absolute byte `offset`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        let mut scratch = [0u8; SECTOR_SIZE];
        let mut off = offset;
        let mut pos = 0;

        while pos < buf.len() {
            let lba = u32::try_from(off / SECTOR_SIZE as u64)
                .map_err(|_| BlockIOError::InvalidRequest("LBA exceeds 32 bits"))?;
            let in_sector = (off % SECTOR_SIZE as u64) as usize;
            let chunk = (SECTOR_SIZE - in_sector).min(buf.len() - pos);

            self.read_sectors(lba, &mut scratch)?;
            buf[pos..pos + chunk].copy_from_slice(&scratch[in_sector..in_sector + chunk]);

            pos += chunk;
            off += chunk as u64;
        }
        Ok(())
    }

    // Implements little-endian read helpers for primitive types
    blockio_impl_primitive_read!(u16, u32);
}

impl<T: BlockIO + ?Sized> BlockIOExt for T {}
