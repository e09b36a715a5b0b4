//! Container writing API.
//!
//! This module provides the public API for creating UnityWebData containers,
//! either entry by entry through [`Writer`] or from a directory tree with
//! [`pack`].
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use splashpatch::ArchivePath;
//! use splashpatch::write::Writer;
//!
//! # fn main() -> splashpatch::Result<()> {
//! let mut writer = Writer::create(Cursor::new(Vec::new()))?;
//! writer.add_bytes(ArchivePath::new("data.unity3d")?, b"UnityFS\0".to_vec())?;
//! let (result, cursor) = writer.finish_into_inner()?;
//! assert_eq!(result.entries_written, 1);
//! assert!(cursor.into_inner().starts_with(b"UnityWebData1.0\0"));
//! # Ok(())
//! # }
//! ```

mod entry_input;
mod sources;
mod writer_init;

pub use sources::{SourceFile, collect_sources};

use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::{ArchivePath, Error, Result, staging};

/// Statistics about a finished container.
#[must_use = "write results should be checked to ensure the container was created successfully"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Number of entries written.
    pub entries_written: usize,
    /// Total payload bytes.
    pub total_size: u64,
    /// Size of the whole container, header included.
    pub archive_size: u64,
}

/// Where a pending entry's bytes come from.
#[derive(Debug)]
enum EntrySource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

#[derive(Debug)]
struct PendingEntry {
    path: ArchivePath,
    source: EntrySource,
    size: u32,
}

/// A UnityWebData container writer.
///
/// The magic and a placeholder `firstEntryDataOffset` are written on
/// creation. Entries are collected until [`finish`](Writer::finish), which
/// writes the table with placeholder offsets, streams the payloads in table
/// order and then seeks back to patch every offset.
pub struct Writer<W> {
    sink: W,
    base: u64,
    magic: Vec<u8>,
    entries: Vec<PendingEntry>,
    names: HashSet<String>,
}

impl<W> std::fmt::Debug for Writer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// Packs every file below `source_dir` into a container at `output`.
///
/// Files inside subdirectories come first, in descending order of their
/// relative path, followed by the root-level files in ascending order. The
/// container is assembled in memory and committed with
/// [`staging::replace_atomically`], so a failure never leaves a partial
/// `output` behind.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if `source_dir` is not a directory, and
/// [`Error::ArchiveTooLarge`] if the layout does not fit 32-bit offsets.
pub fn pack(source_dir: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<PathBuf> {
    let source_dir = source_dir.as_ref();
    let output = output.as_ref();
    if !source_dir.is_dir() {
        return Err(Error::NotFound {
            path: source_dir.to_path_buf(),
        });
    }

    let sources = collect_sources(source_dir)?;
    let mut writer = Writer::create(Cursor::new(Vec::new()))?;
    for source in sources {
        writer.add_path(&source.disk_path, source.path)?;
    }
    let (result, cursor) = writer.finish_into_inner()?;

    staging::replace_atomically(output, &cursor.into_inner())?;
    log::info!(
        "packed {} entries ({} bytes) from {} into {}",
        result.entries_written,
        result.total_size,
        source_dir.display(),
        output.display()
    );
    Ok(output.to_path_buf())
}
