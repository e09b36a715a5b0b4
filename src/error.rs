//! Error types for container, compression and patching operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes of the crate, along with a convenient [`Result<T>`] type
//! alias and the [`Stage`] tag used by the pipeline.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. Pipeline
//! runs wrap the underlying failure in [`Error::Stage`] so callers can tell
//! where a run stopped and which file was involved:
//!
//! ```rust
//! use splashpatch::{Error, Stage};
//!
//! fn describe(error: &Error) -> String {
//!     match error {
//!         Error::Stage { stage: Stage::Detect, path, .. } => {
//!             format!("Unsupported file: {}", path.display())
//!         }
//!         Error::Stage { stage: Stage::ResolveTarget, path, .. } => {
//!             format!("No patchable asset inside {}", path.display())
//!         }
//!         other => other.to_string(),
//!     }
//! }
//! ```

use std::io;
use std::path::PathBuf;

use crate::codec::Compression;

/// The pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Stage {
    /// Classifying the selected input.
    Detect,
    /// Decompressing a Brotli or gzip input.
    Decompress,
    /// Unpacking a UnityWebData container.
    Unpack,
    /// Locating the record file inside an unpacked container.
    ResolveTarget,
    /// Running the record mutation through the editor.
    Mutate,
    /// Writing the one-time `.bak` copy.
    Backup,
    /// Writing the edited record file.
    WriteBack,
    /// Packing the unpacked container again.
    Repack,
    /// Compressing the repacked container again.
    Recompress,
}

impl Stage {
    /// Returns a short lowercase name for this stage.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Detect => "detect",
            Self::Decompress => "decompress",
            Self::Unpack => "unpack",
            Self::ResolveTarget => "resolve-target",
            Self::Mutate => "mutate",
            Self::Backup => "backup",
            Self::WriteBack => "write-back",
            Self::Repack => "repack",
            Self::Recompress => "recompress",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The main error type for this crate.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io], [`NotFound`][Self::NotFound], [`ArtifactExists`][Self::ArtifactExists] | File system operations |
/// | Format | [`UnknownFormat`][Self::UnknownFormat], [`CorruptHeader`][Self::CorruptHeader], [`DuplicateEntry`][Self::DuplicateEntry] | Invalid input data |
/// | Compression | [`Compression`][Self::Compression], [`UnsupportedCompression`][Self::UnsupportedCompression] | Corrupt streams, missing features |
/// | Security | [`InvalidArchivePath`][Self::InvalidArchivePath], [`PathTraversal`][Self::PathTraversal] | Unsafe entry names |
/// | Patching | [`TargetNotFound`][Self::TargetNotFound], [`MutationUnsupported`][Self::MutationUnsupported], [`InvalidSelection`][Self::InvalidSelection], [`Editor`][Self::Editor] | Record editing |
/// | Durability | [`BackupFailed`][Self::BackupFailed] | Backup could not be created |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A file or directory the operation requires does not exist.
    #[error("File not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// No known signature, extension or file name matched the input.
    ///
    /// Callers must treat this as a hard stop.
    #[error("Unknown or unsupported file type: {}", path.display())]
    UnknownFormat {
        /// The file that could not be classified.
        path: PathBuf,
    },

    /// A compressed stream was corrupt or truncated.
    #[error("{format} stream error: {source}")]
    Compression {
        /// The compression variant that failed.
        format: Compression,
        /// The underlying transform failure.
        #[source]
        source: io::Error,
    },

    /// The compression variant is not compiled into this build.
    ///
    /// Enable the corresponding feature flag (`brotli` or `gzip`).
    #[error(
        "Unsupported compression: {} (build with the `{}` feature)",
        .0,
        .0.required_feature()
    )]
    UnsupportedCompression(Compression),

    /// The container table is corrupt or truncated.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// Two container entries share the same name.
    #[error("Duplicate entry in container: {path}")]
    DuplicateEntry {
        /// The repeated entry name.
        path: String,
    },

    /// The packed container would not fit in 32-bit offsets.
    #[error("Container too large: {size} bytes exceeds the 32-bit offset limit")]
    ArchiveTooLarge {
        /// The size the container would have had.
        size: u64,
    },

    /// An entry name is not a valid relative path.
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// An entry name would escape the extraction directory.
    #[error("Path traversal detected in entry {entry_index}: {path}")]
    PathTraversal {
        /// The entry index with path traversal.
        entry_index: usize,
        /// The offending entry name.
        path: String,
    },

    /// None of the well-known record files exist in an unpacked container.
    #[error("No target asset ({}) found in {}", candidates.join(", "), directory.display())]
    TargetNotFound {
        /// The unpacked directory that was searched.
        directory: PathBuf,
        /// The file names that were tried, in priority order.
        candidates: Vec<String>,
    },

    /// The record editor could not locate or parse the expected record.
    ///
    /// Typically caused by an unrecognized engine version.
    #[error("Mutation unsupported: {reason}")]
    MutationUnsupported {
        /// What the editor reported.
        reason: String,
    },

    /// An explicit array element selection was out of range.
    #[error("No element at index {index} in {field} ({len} elements)")]
    InvalidSelection {
        /// The array field.
        field: String,
        /// The requested index.
        index: usize,
        /// The number of elements in the array.
        len: usize,
    },

    /// The external record editor broke its protocol.
    #[error("Record editor error: {0}")]
    Editor(String),

    /// A staging artifact would overwrite an existing path.
    #[error("Refusing to overwrite existing path: {}", path.display())]
    ArtifactExists {
        /// The path that already exists.
        path: PathBuf,
    },

    /// The one-time backup could not be created.
    #[error("Backup of {} could not be created", path.display())]
    BackupFailed {
        /// The file that was to be backed up.
        path: PathBuf,
    },

    /// The run was cancelled between stages.
    #[error("Operation cancelled")]
    Cancelled,

    /// A pipeline stage failed.
    ///
    /// Cleanup has already run when this error is returned.
    #[error("{stage} failed for {}: {source}", path.display())]
    Stage {
        /// The stage that failed.
        stage: Stage,
        /// The file the stage was working on.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps this error with the stage and path it occurred at.
    ///
    /// An error that is already stage-tagged is returned unchanged.
    pub fn at_stage(self, stage: Stage, path: impl Into<PathBuf>) -> Self {
        match self {
            Error::Stage { .. } => self,
            other => Error::Stage {
                stage,
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the stage for stage-tagged errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Returns the innermost error, looking through stage tags.
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CorruptHeader {
            offset: 0x10,
            reason: "table overruns first entry".into(),
        };
        assert_eq!(
            err.to_string(),
            "Corrupt header at offset 0x10: table overruns first entry"
        );

        let err = Error::TargetNotFound {
            directory: PathBuf::from("Build"),
            candidates: vec!["data.unity3d".into(), "globalgamemanagers".into()],
        };
        assert_eq!(
            err.to_string(),
            "No target asset (data.unity3d, globalgamemanagers) found in Build"
        );

        let err = Error::UnsupportedCompression(Compression::Brotli);
        assert_eq!(
            err.to_string(),
            "Unsupported compression: Brotli (build with the `brotli` feature)"
        );
    }

    #[test]
    fn test_at_stage_wraps_once() {
        let err = Error::UnknownFormat {
            path: PathBuf::from("game.bin"),
        }
        .at_stage(Stage::Detect, "game.bin")
        .at_stage(Stage::Repack, "other");

        assert_eq!(err.stage(), Some(Stage::Detect));
        assert!(matches!(err.root(), Error::UnknownFormat { .. }));
        assert!(err.to_string().starts_with("detect failed for game.bin"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
