//! Container reading API.
//!
//! This module provides the public API for reading UnityWebData containers:
//! listing entries, reading payloads and extracting everything to disk.
//!
//! # Example
//!
//! ```rust,no_run
//! use splashpatch::read::Archive;
//!
//! # fn main() -> splashpatch::Result<()> {
//! let mut archive = Archive::open_path("Build/WebGL.data")?;
//!
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.name(), entry.size);
//! }
//!
//! archive.extract("Build/WebGL")?;
//! # Ok(())
//! # }
//! ```

mod archive_open;
mod archive_query;
mod entry;
mod extraction;
mod info;
mod path_safety;

pub use entry::Entry;
pub use extraction::{unpack, unpack_dir_for};
pub use info::{ArchiveInfo, ExtractResult};

use crate::format::header::ContainerHeader;

/// A UnityWebData container reader.
pub struct Archive<R> {
    pub(crate) reader: R,
    pub(crate) header: ContainerHeader,
    pub(crate) entries: Vec<Entry>,
    pub(crate) info: ArchiveInfo,
}

impl<R> std::fmt::Debug for Archive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("entries", &self.entries.len())
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}
