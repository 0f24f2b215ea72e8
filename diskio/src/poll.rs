// SPDX-License-Identifier: MIT

use crate::errors::{BlockIOError, BlockIOResult};

/// Iterations allowed for one floppy FIFO byte handshake.
pub const FDC_BYTE_BUDGET: PollBudget = PollBudget(100_000);

/// Iterations allowed for a floppy command to leave the busy state.
pub const FDC_COMPLETION_BUDGET: PollBudget = PollBudget(1_000_000);

/// Iterations allowed for an ATA status wait.
pub const ATA_DEFAULT_BUDGET: PollBudget = PollBudget(1_000_000);

/// Upper bound on how many times a status condition is re-evaluated.
///
/// Legacy controllers are polled from a single execution context with no
/// interrupts to wake us, so every wait must give up eventually and report
/// [`BlockIOError::Timeout`] instead of hanging the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget(pub u32);

impl PollBudget {
    #[inline]
    pub const fn iterations(self) -> u32 {
        self.0
    }

    /// Re-evaluates `cond` until it holds or the budget is spent.
    pub fn spin_until<F>(self, mut cond: F) -> BlockIOResult
    where
        F: FnMut() -> bool,
    {
        for _ in 0..self.0 {
            if cond() {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(BlockIOError::Timeout)
    }

    /// Like [`spin_until`](Self::spin_until) but the probe yields a value.
    pub fn spin_map<T, F>(self, mut probe: F) -> BlockIOResult<T>
    where
        F: FnMut() -> Option<T>,
    {
        for _ in 0..self.0 {
            if let Some(v) = probe() {
                return Ok(v);
            }
            core::hint::spin_loop();
        }
        Err(BlockIOError::Timeout)
    }
}

impl From<u32> for PollBudget {
    fn from(n: u32) -> Self {
        Self(n)
    }
}
