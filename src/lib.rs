//! # splashpatch
//!
//! Patch boolean flags inside Unity player data, round-tripping the layers
//! around them.
//!
//! A WebGL build ships its data as a UnityWebData container, usually wrapped
//! in Brotli or gzip. The record that decides whether the Unity splash screen
//! or the trial watermark is shown lives in `data.unity3d` or
//! `globalgamemanagers` inside that container. This crate provides the
//! container codec, the compression layers, a format detector and a pipeline
//! that peels the layers, hands the record file to a [`RecordEditor`],
//! and rebuilds everything with a one-time `.bak` backup and guaranteed
//! cleanup.
//!
//! ## Quick Start
//!
//! ### Unpacking a Container
//!
//! ```rust,no_run
//! use splashpatch::{Archive, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::open_path("Build/WebGL.data")?;
//!
//!     for entry in archive.entries() {
//!         println!("{}: {} bytes", entry.name(), entry.size);
//!     }
//!
//!     archive.extract("Build/WebGL")?;
//!     Ok(())
//! }
//! ```
//!
//! ### Packing a Directory
//!
//! ```rust,no_run
//! use splashpatch::{ArchivePath, Result, Writer};
//!
//! fn main() -> Result<()> {
//!     let mut writer = Writer::create_path("WebGL.data")?;
//!     writer.add_path("Build/WebGL/globalgamemanagers", ArchivePath::new("globalgamemanagers")?)?;
//!     writer.add_bytes(ArchivePath::new("Il2CppData/Metadata/global-metadata.dat")?, vec![0u8; 16])?;
//!
//!     let result = writer.finish()?;
//!     println!("Wrote {} entries, {} bytes", result.entries_written, result.archive_size);
//!     Ok(())
//! }
//! ```
//!
//! ### Patching a Build
//!
//! ```rust,ignore
//! use splashpatch::{Mutation, Pipeline, Result};
//! use splashpatch::editor::ProcessEditor;
//! use splashpatch::prompt::NoPrompt;
//!
//! fn main() -> Result<()> {
//!     let mut pipeline = Pipeline::new(ProcessEditor::new("splashpatch-editor"));
//!     let report = pipeline.run(
//!         "Build/WebGL.data.br".as_ref(),
//!         &Mutation::RemoveSplashScreen(Default::default()),
//!         &mut NoPrompt,
//!     )?;
//!     println!("changed: {}, backup: {:?}", report.changed, report.backup);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `brotli` | Yes | Brotli layer support |
//! | `gzip` | Yes | gzip layer support |
//! | `process-editor` | No | [`RecordEditor`] driving an external helper over JSON lines |
//! | `cli` | No | Interactive command-line tool |
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. Pipeline failures are wrapped in
//! [`Error::Stage`], which names the stage and file:
//!
//! ```rust,no_run
//! use splashpatch::{Error, unpack};
//!
//! match unpack("Build/WebGL.data") {
//!     Ok(dir) => println!("unpacked into {}", dir.display()),
//!     Err(Error::CorruptHeader { offset, reason }) => {
//!         eprintln!("not a valid container ({reason} at {offset:#x})")
//!     }
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```
//!
//! ## Safety
//!
//! - **Path traversal protection**: entry names must be safe relative paths
//! - **Bounds checks**: every entry must lie inside the container
//! - **Exactly-once backup**: an existing `.bak` is never overwritten
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod archive_path;
pub mod codec;
pub mod config;
pub mod editor;
pub mod error;
pub mod format;
pub mod mutation;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod read;
pub mod staging;
pub mod write;

pub use archive_path::ArchivePath;
pub use error::{Error, Result, Stage};

// Re-export the container API at crate root for convenience
pub use read::{Archive, ArchiveInfo, Entry, ExtractResult, unpack};
pub use write::{WriteResult, Writer, pack};

pub use codec::{Compression, CompressionLevel};
pub use format::detect::{Classification, FormatInfo, classify};

pub use editor::{ArrayElement, RecordClass, RecordEditor, RecordKind};
pub use mutation::{LogoSelector, Mutation, MutationOutcome};
pub use pipeline::{Pipeline, PipelineOptions, RunReport};
pub use progress::{NoObserver, StageObserver};
pub use prompt::{NoPrompt, Prompter};
pub use staging::{Staging, backup_only_once, clean_up, clone_file};
