// SPDX-License-Identifier: MIT

use diskio::prelude::*;

use crate::core::errors::{FsCursorError, FsCursorResult};

/// Everything a chain walk needs to know about a cluster-based volume.
pub trait ClusterMeta {
    /// Lowest cluster number that can hold data.
    const FIRST_CLUSTER: u32 = 2;

    /// Highest valid data cluster.
    fn last_cluster(&self) -> u32;

    /// Number of data clusters; bounds the length of any sane chain.
    fn cluster_count(&self) -> u32;

    /// Checks if a FAT value is End-of-Chain
    fn is_eoc(&self, value: u32) -> bool;

    /// Looks up the FAT entry of `cluster`.
    fn next_cluster<IO>(&self, io: &mut IO, cluster: u32) -> FsCursorResult<u32>
    where
        IO: BlockIO + ?Sized;
}

/// Lazy walker over a FAT cluster chain.
///
/// The FAT entry of a cluster is only looked up when the caller asks for the
/// cluster after it, so stopping early never costs an extra FAT read.
///
/// Termination:
/// - a value below [`ClusterMeta::FIRST_CLUSTER`] or an EOC value ends the chain
/// - a value past [`ClusterMeta::last_cluster`] is [`FsCursorError::InvalidCluster`]
/// - more steps than the volume has clusters is [`FsCursorError::LoopDetected`]
#[derive(Debug)]
pub struct ClusterCursor<'a, M>
where
    M: ClusterMeta,
{
    meta: &'a M,
    current: Option<u32>,
    started: bool,
    seen: usize,
}

impl<'a, M> ClusterCursor<'a, M>
where
    M: ClusterMeta,
{
    pub fn new(meta: &'a M, start: u32) -> Self {
        Self {
            meta,
            current: Some(start),
            started: false,
            seen: 0,
        }
    }

    /// Clusters yielded so far.
    #[inline]
    pub fn seen(&self) -> usize {
        self.seen
    }

    #[inline]
    fn stop<T>(&mut self, out: Option<FsCursorResult<T>>) -> Option<FsCursorResult<T>> {
        self.current = None;
        out
    }

    /// One iteration step
    pub fn next_with<IO>(&mut self, io: &mut IO) -> Option<FsCursorResult<u32>>
    where
        IO: BlockIO + ?Sized,
    {
        let prev = self.current?;
        let c = if self.started {
            match self.meta.next_cluster(io, prev) {
                Ok(n) => n,
                Err(e) => return self.stop(Some(Err(e))),
            }
        } else {
            self.started = true;
            prev
        };

        // End-of-chain & bounds
        if c < M::FIRST_CLUSTER || self.meta.is_eoc(c) {
            return self.stop(None);
        }
        if c > self.meta.last_cluster() {
            return self.stop(Some(Err(FsCursorError::InvalidCluster(c))));
        }

        self.seen += 1;
        if self.seen > self.meta.cluster_count() as usize + 1 {
            return self.stop(Some(Err(FsCursorError::LoopDetected)));
        }

        self.current = Some(c);
        Some(Ok(c))
    }

    /// Iterate cluster by cluster via callback
    pub fn for_each_cluster<IO, E, F>(&mut self, io: &mut IO, mut f: F) -> Result<(), E>
    where
        IO: BlockIO + ?Sized,
        E: From<FsCursorError>,
        F: FnMut(&mut IO, u32) -> Result<(), E>,
    {
        while let Some(res) = self.next_with(io) {
            let c = res?;
            f(io, c)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    /// In-memory chain: `table[c]` is the FAT entry of cluster `c`.
    struct Chain {
        table: [u32; 8],
        lookups: core::cell::Cell<usize>,
    }

    impl ClusterMeta for Chain {
        fn last_cluster(&self) -> u32 {
            7
        }

        fn cluster_count(&self) -> u32 {
            6
        }

        fn is_eoc(&self, value: u32) -> bool {
            value >= 0xFF8
        }

        fn next_cluster<IO>(&self, _io: &mut IO, cluster: u32) -> FsCursorResult<u32>
        where
            IO: BlockIO + ?Sized,
        {
            self.lookups.set(self.lookups.get() + 1);
            self.table
                .get(cluster as usize)
                .copied()
                .ok_or(FsCursorError::InvalidCluster(cluster))
        }
    }

    fn chain(table: [u32; 8]) -> Chain {
        Chain {
            table,
            lookups: core::cell::Cell::new(0),
        }
    }

    /// Chains here never touch the device.
    struct NoIO;

    impl BlockIO for NoIO {
        fn read_sectors(&mut self, _lba: u32, _buf: &mut [u8]) -> BlockIOResult {
            Err(BlockIOError::Unsupported)
        }
    }

    #[test]
    fn walks_until_eoc() {
        let meta = chain([0, 0, 4, 0, 5, 0xFFF, 0, 0]);
        let mut io = NoIO;

        let mut got = Vec::new();
        let mut cur = ClusterCursor::new(&meta, 2);
        let res: Result<(), FsCursorError> = cur.for_each_cluster(&mut io, |_, c| {
            got.push(c);
            Ok(())
        });
        assert_eq!(res, Ok(()));
        assert_eq!(got, vec![2, 4, 5]);
        assert_eq!(meta.lookups.get(), 3);
    }

    #[test]
    fn lookups_are_lazy() {
        let meta = chain([0, 0, 3, 0xFFF, 0, 0, 0, 0]);
        let mut io = NoIO;

        let mut cur = ClusterCursor::new(&meta, 2);
        assert_eq!(cur.next_with(&mut io), Some(Ok(2)));
        assert_eq!(meta.lookups.get(), 0);
        assert_eq!(cur.next_with(&mut io), Some(Ok(3)));
        assert_eq!(meta.lookups.get(), 1);
    }

    #[test]
    fn free_start_cluster_is_empty_chain() {
        let meta = chain([0; 8]);
        let mut io = NoIO;

        let mut cur = ClusterCursor::new(&meta, 0);
        assert_eq!(cur.next_with(&mut io), None);
        assert_eq!(cur.seen(), 0);
    }

    #[test]
    fn out_of_range_cluster_is_rejected() {
        let meta = chain([0, 0, 0x200, 0, 0, 0, 0, 0]);
        let mut io = NoIO;

        let mut cur = ClusterCursor::new(&meta, 2);
        assert_eq!(cur.next_with(&mut io), Some(Ok(2)));
        assert_eq!(
            cur.next_with(&mut io),
            Some(Err(FsCursorError::InvalidCluster(0x200)))
        );
        assert_eq!(cur.next_with(&mut io), None);
    }

    #[test]
    fn cycle_is_detected() {
        let meta = chain([0, 0, 3, 2, 0, 0, 0, 0]);
        let mut io = NoIO;

        let mut cur = ClusterCursor::new(&meta, 2);
        let res: Result<(), FsCursorError> = cur.for_each_cluster(&mut io, |_, _| Ok(()));
        assert_eq!(res, Err(FsCursorError::LoopDetected));
    }
}
