// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for BlockIO operations.
pub type BlockIOResult<T = ()> = core::result::Result<T, BlockIOError>;

/// Error type for BlockIO operations.
///
/// Every transport reports through this single type; there is no retry at
/// this layer, a failed call is final for that call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockIOError {
    /// A bounded poll ran out of budget before the device answered.
    Timeout,
    /// The device itself flagged the transfer as failed.
    Device(&'static str),
    /// Malformed request (zero sectors, ragged buffer, LBA past the medium).
    InvalidRequest(&'static str),
    OutOfBounds,
    Unsupported,
    Other(&'static str),
}

impl BlockIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            BlockIOError::Timeout => "Device timed out",
            BlockIOError::Device(msg) => msg,
            BlockIOError::InvalidRequest(msg) => msg,
            BlockIOError::OutOfBounds => "Out of bounds",
            BlockIOError::Unsupported => "Unsupported operation",
            BlockIOError::Other(msg) => msg,
        }
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, BlockIOError::Timeout)
    }
}

impl From<&'static str> for BlockIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        BlockIOError::Other(msg)
    }
}

impl fmt::Display for BlockIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockIOError::Device(_) => write!(f, "device error: {}", self.msg()),
            BlockIOError::InvalidRequest(_) => write!(f, "invalid request: {}", self.msg()),
            _ => write!(f, "{}", self.msg()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BlockIOError {}
