// SPDX-License-Identifier: MIT

use crate::{BlockIO, BlockIOResult, SECTOR_SIZE};

/// Simple counters, no_std friendly.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct IoStats {
    /// `read_sectors` calls.
    pub reads: u64,
    pub sectors_read: u64,
    /// `write_sectors` calls.
    pub writes: u64,
    pub sectors_written: u64,
    pub failed: u64,
    /// Last LBA read, handy when asserting access patterns.
    pub last_read_lba: Option<u32>,
}

impl IoStats {
    #[inline]
    pub fn reset(&mut self) {
        *self = IoStats::default();
    }
}

/// Transparent instrumentation wrapper.
pub struct IOCounter<'a, IO: BlockIO + ?Sized> {
    inner: &'a mut IO,
    pub stats: IoStats,
}

impl<'a, IO: BlockIO + ?Sized> IOCounter<'a, IO> {
    #[inline]
    pub fn new(inner: &'a mut IO) -> Self {
        Self {
            inner,
            stats: IoStats::default(),
        }
    }

    #[inline]
    pub fn snapshot(&self) -> IoStats {
        self.stats
    }

    #[inline]
    pub fn into_inner(self) -> &'a mut IO {
        self.inner
    }
}

impl<'a, IO: BlockIO + ?Sized> BlockIO for IOCounter<'a, IO> {
    #[inline]
    fn read_sectors(&mut self, lba: u32, buf: &mut [u8]) -> BlockIOResult {
        self.stats.reads += 1;
        self.stats.sectors_read += (buf.len() / SECTOR_SIZE) as u64;
        self.stats.last_read_lba = Some(lba);
        self.inner
            .read_sectors(lba, buf)
            .inspect_err(|_| self.stats.failed += 1)
    }

    #[inline]
    fn write_sectors(&mut self, lba: u32, data: &[u8]) -> BlockIOResult {
        self.stats.writes += 1;
        self.stats.sectors_written += (data.len() / SECTOR_SIZE) as u64;
        self.inner
            .write_sectors(lba, data)
            .inspect_err(|_| self.stats.failed += 1)
    }

    #[inline]
    fn sector_count(&self) -> Option<u64> {
        self.inner.sector_count()
    }
}

#[cfg(all(test, feature = "mem"))]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn counts_reads_and_failures() {
        let mut disk = [0u8; SECTOR_SIZE * 2];
        let mut mem = MemBlockIO::new(&mut disk);
        let mut io = IOCounter::new(&mut mem);

        let mut two = [0u8; SECTOR_SIZE * 2];
        io.read_sectors(0, &mut two).unwrap();
        assert!(io.read_sectors(5, &mut two).is_err());

        let s = io.snapshot();
        assert_eq!(s.reads, 2);
        assert_eq!(s.sectors_read, 4);
        assert_eq!(s.failed, 1);
        assert_eq!(s.last_read_lba, Some(5));
    }
}
