// SPDX-License-Identifier: MIT

use crate::{BlockIO, BlockIOError, BlockIOResult, SECTOR_SIZE, sectors_in};

/// In-memory implementation of `BlockIO`.
///
/// Useful for tests, RAM disks and images loaded by a bootloader.
#[derive(Debug)]
pub struct MemBlockIO<'a> {
    buffer: &'a mut [u8],
}

impl<'a> MemBlockIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..]
    }

    #[inline]
    fn range(&self, lba: u32, len: usize) -> BlockIOResult<core::ops::Range<usize>> {
        sectors_in(len)?;
        let start = (lba as usize)
            .checked_mul(SECTOR_SIZE)
            .ok_or(BlockIOError::OutOfBounds)?;
        let end = start.checked_add(len).ok_or(BlockIOError::OutOfBounds)?;
        if end > self.buffer.len() {
            return Err(BlockIOError::OutOfBounds);
        }
        Ok(start..end)
    }
}

impl<'a> BlockIO for MemBlockIO<'a> {
    #[inline]
    fn read_sectors(&mut self, lba: u32, buf: &mut [u8]) -> BlockIOResult {
        let range = self.range(lba, buf.len())?;
        buf.copy_from_slice(&self.buffer[range]);
        Ok(())
    }

    #[inline]
    fn write_sectors(&mut self, lba: u32, data: &[u8]) -> BlockIOResult {
        let range = self.range(lba, data.len())?;
        self.buffer[range].copy_from_slice(data);
        Ok(())
    }

    #[inline]
    fn sector_count(&self) -> Option<u64> {
        Some((self.buffer.len() / SECTOR_SIZE) as u64)
    }
}

#[cfg(all(test, feature = "std"))]
mod test {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_rw() {
        let mut disk = [0u8; SECTOR_SIZE * 4];
        let mut io = MemBlockIO::new(&mut disk);

        let mut sector = [0u8; SECTOR_SIZE];
        sector[..4].copy_from_slice(&[1, 2, 3, 4]);
        io.write_sectors(2, &sector).unwrap();

        let mut output = [0u8; SECTOR_SIZE];
        io.read_sectors(2, &mut output).unwrap();
        assert_eq!(&output[..4], &[1, 2, 3, 4]);
        assert_eq!(io.as_bytes()[2 * SECTOR_SIZE + 3], 4);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut disk = [0u8; SECTOR_SIZE * 2];
        let mut io = MemBlockIO::new(&mut disk);

        let mut two = [0u8; SECTOR_SIZE * 2];
        assert!(io.read_sectors(0, &mut two).is_ok());
        assert_eq!(io.read_sectors(1, &mut two), Err(BlockIOError::OutOfBounds));
        assert_eq!(io.read_sectors(u32::MAX, &mut two[..SECTOR_SIZE]), Err(BlockIOError::OutOfBounds));
        assert_eq!(io.sector_count(), Some(2));
    }
}
