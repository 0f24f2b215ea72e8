pub mod attr;
pub mod constant;
pub mod filesystem;
pub mod format;
pub mod meta;
pub mod resolver;
pub mod table;
pub mod types;
pub mod utils;

// === Public Interface ===
pub mod prelude {
    pub use super::attr::FatAttributes;
    pub use super::filesystem::{FatFilesystem, detect_kind};
    pub use super::format::{FatCaching, FatFormat, FatKind, NameCase, RootDirSource};
    pub use super::meta::{FatGeometry, FatMeta};
    pub use super::table::FatTable;
    pub use super::types::{BootSector, DirEntry, FatFile};
    pub use super::utils::{ShortName, to_short_name};
    pub use crate::core::errors::*;
    pub use crate::core::traits::*;
    pub use diskio::prelude::*;
}
