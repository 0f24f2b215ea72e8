// SPDX-License-Identifier: MIT

use core::fmt;

pub use diskio::errors::*;

/// Boot sector decoding and validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsParsingError {
    IO(BlockIOError),
    Invalid(&'static str),
    Unsupported(&'static str),
    Other(&'static str),
}

impl FsParsingError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsParsingError::IO(_) => "IO error",
            FsParsingError::Invalid(msg) => msg,
            FsParsingError::Unsupported(msg) => msg,
            FsParsingError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsParsingError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }
}

impl fmt::Display for FsParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        write_chain(f, self.source())
    }
}

/// Cluster chain traversal failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsCursorError {
    IO(BlockIOError),
    InvalidCluster(u32),
    LoopDetected,
    Other(&'static str),
}

impl FsCursorError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsCursorError::IO(_) => "IO error",
            FsCursorError::InvalidCluster(_) => "Invalid cluster in FAT chain",
            FsCursorError::LoopDetected => "Loop detected in FAT chain",
            FsCursorError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsCursorError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }
}

impl fmt::Display for FsCursorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        if let FsCursorError::InvalidCluster(cluster) = self {
            write!(f, " (cluster: {cluster})")?;
        }
        write_chain(f, self.source())
    }
}

/// Directory scan and name lookup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsResolverError {
    IO(BlockIOError),
    Cursor(FsCursorError),
    Parsing(FsParsingError),
    NotFound,
    Invalid(&'static str),
    Other(&'static str),
}

impl FsResolverError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsResolverError::IO(_) => "IO error",
            FsResolverError::Cursor(_) => "Cursor error",
            FsResolverError::Parsing(_) => "Parsing error",
            FsResolverError::NotFound => "File not found",
            FsResolverError::Invalid(msg) => msg,
            FsResolverError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsResolverError::IO(e) => Some(FsError::IO(*e)),
            FsResolverError::Cursor(e) => Some(FsError::Cursor(*e)),
            FsResolverError::Parsing(e) => Some(FsError::Parsing(*e)),
            _ => None,
        }
    }
}

impl fmt::Display for FsResolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        write_chain(f, self.source())
    }
}

/// Top-level error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    IO(BlockIOError),
    Parsing(FsParsingError),
    Cursor(FsCursorError),
    Resolver(FsResolverError),
    Unsupported,
    Other(&'static str),
}

impl FsError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsError::IO(e) => e.msg(),
            FsError::Parsing(e) => e.msg(),
            FsError::Cursor(e) => e.msg(),
            FsError::Resolver(e) => e.msg(),
            FsError::Unsupported => "Unsupported operation",
            FsError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsError::Parsing(e) => e.source(),
            FsError::Cursor(e) => e.source(),
            FsError::Resolver(e) => e.source(),
            FsError::IO(_) | FsError::Unsupported | FsError::Other(_) => None,
        }
    }

    /// The transport error at the bottom of the chain, if any.
    pub fn io_error(&self) -> Option<BlockIOError> {
        let mut current = Some(*self);
        while let Some(err) = current {
            if let FsError::IO(e) = err {
                return Some(e);
            }
            current = err.source();
        }
        None
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::Resolver(FsResolverError::NotFound))
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        write_chain(f, self.source())
    }
}

fn write_chain(f: &mut fmt::Formatter<'_>, mut current: Option<FsError>) -> fmt::Result {
    while let Some(src) = current {
        write!(f, "\n  caused by: {}", src.msg())?;
        current = src.source();
    }
    Ok(())
}

// === type Fs*Result ===

pub type FsResult<T = ()> = Result<T, FsError>;
pub type FsParsingResult<T = ()> = Result<T, FsParsingError>;
pub type FsCursorResult<T = ()> = Result<T, FsCursorError>;
pub type FsResolverResult<T = ()> = Result<T, FsResolverError>;

crate::fs_error_wiring! {
    top => FsError {
        BlockIOError    : IO,
        FsParsingError  : Parsing,
        FsCursorError   : Cursor,
        FsResolverError : Resolver,
    },
    str_into => [
        FsParsingError,
        FsCursorError,
        FsResolverError,
    ],
    sub => {
        BlockIOError   => [ FsParsingError::IO, FsCursorError::IO, FsResolverError::IO ],
        FsParsingError => [ FsResolverError::Parsing ],
        FsCursorError  => [ FsResolverError::Cursor ],
    },
}
