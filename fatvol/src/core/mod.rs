// === Sub-modules ===
pub mod cursor;
pub mod errors;
mod macros;

// === Core Traits ===
pub mod traits {
    pub use super::cursor::ClusterMeta;
}

// === Error types ===
pub use errors::*;
