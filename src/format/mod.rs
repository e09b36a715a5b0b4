//! UnityWebData format constants, definitions, and low-level parsing utilities.
//!
//! A UnityWebData container is a flat table of named byte ranges:
//!
//! ```text
//! magic                  null-terminated, "UnityWebData1.0\0" when written
//! firstEntryDataOffset   u32 LE, end of the table and start of the payloads
//! repeated until the cursor reaches firstEntryDataOffset:
//!   dataOffset           u32 LE, absolute
//!   dataSize             u32 LE
//!   nameSize             u32 LE
//!   name                 nameSize bytes of UTF-8, not null-terminated
//! payload region
//! ```

pub mod detect;
pub mod header;

/// The magic written at the start of every container this crate produces.
pub const MAGIC: &[u8] = b"UnityWebData1.0\0";

/// Upper bound on the magic length, terminator included.
///
/// Readers give up looking for the terminator after this many bytes.
pub const MAX_MAGIC_LEN: usize = 64;

/// Size of the fixed part of a table record (offset, size, name length).
pub const ENTRY_FIXED_SIZE: u64 = 12;

/// Size of the `firstEntryDataOffset` field.
pub const OFFSET_FIELD_SIZE: u64 = 4;

/// Signatures of Unity asset bundles.
pub const BUNDLE_SIGNATURES: &[&[u8]] = &[
    b"UnityFS\0",
    b"UnityWeb\0",
    b"UnityRaw\0",
    b"UnityArchive\0",
];

/// Comment Unity embeds near the start of Brotli-compressed build data.
pub const BROTLI_MARKER: &[u8] = b"UnityWeb Compressed Content (brotli)";

/// gzip member header magic.
pub const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B];

/// Well-known record files, in the order they are looked up.
pub const DEFAULT_TARGET_NAMES: &[&str] = &["data.unity3d", "globalgamemanagers"];
