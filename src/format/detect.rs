//! Input classification for Unity player data.
//!
//! This module decides what a user-selected file is: a serialized asset, an
//! asset bundle, a UnityWebData container, or a compressed layer around one
//! of those. Leading bytes are authoritative; the file name and extension are
//! only consulted when no signature matches.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use super::{BROTLI_MARKER, BUNDLE_SIGNATURES, GZIP_MAGIC, MAGIC};
use crate::codec::Compression;
use crate::{Error, Result};

/// Number of leading bytes inspected for signatures.
const PROBE_LEN: usize = 64;

/// Range of serialized-file format versions considered plausible.
const SERIALIZED_VERSIONS: std::ops::RangeInclusive<u32> = 5..=64;

/// First serialized-file version that uses the 64-bit header layout.
const WIDE_HEADER_VERSION: u32 = 22;

/// What a file is, as far as the pipeline is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// A serialized asset file such as `globalgamemanagers`.
    RawAsset,
    /// An asset bundle such as `data.unity3d`.
    RawBundle,
    /// An uncompressed UnityWebData container.
    RawContainer,
    /// A compressed layer around one of the above.
    Compressed(Compression),
    /// Nothing matched.
    Unknown,
}

impl Classification {
    /// Returns a human-readable name for this classification.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RawAsset => "serialized asset",
            Self::RawBundle => "asset bundle",
            Self::RawContainer => "UnityWebData container",
            Self::Compressed(Compression::Brotli) => "Brotli-compressed data",
            Self::Compressed(Compression::Gzip) => "gzip-compressed data",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Format detection result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatInfo {
    /// Detected classification.
    pub classification: Classification,
    /// Confidence level (0.0-1.0).
    ///
    /// - 1.0: Exact signature match
    /// - 0.7: Header heuristic
    /// - 0.5: Extension or file name only
    /// - 0.0: Unknown format
    pub confidence: f32,
}

impl FormatInfo {
    /// Creates a FormatInfo from an exact signature match.
    pub fn from_signature(classification: Classification) -> Self {
        Self {
            classification,
            confidence: 1.0,
        }
    }

    /// Creates a FormatInfo from a structural heuristic.
    pub fn from_heuristic(classification: Classification) -> Self {
        Self {
            classification,
            confidence: 0.7,
        }
    }

    /// Creates a FormatInfo from the file name or extension.
    pub fn from_name(classification: Classification) -> Self {
        Self {
            classification,
            confidence: 0.5,
        }
    }

    /// Creates a FormatInfo for an unknown file.
    pub fn unknown() -> Self {
        Self {
            classification: Classification::Unknown,
            confidence: 0.0,
        }
    }

    /// Returns true if nothing matched.
    pub fn is_unknown(&self) -> bool {
        self.classification == Classification::Unknown
    }
}

/// Exact prefixes, checked in order.
const SIGNATURES: &[(&[u8], Classification)] = &[
    (MAGIC, Classification::RawContainer),
    (GZIP_MAGIC, Classification::Compressed(Compression::Gzip)),
];

/// Classifies leading bytes of a file of `file_len` bytes.
///
/// `head` should hold the first [`PROBE_LEN`] bytes (or the whole file if it
/// is shorter).
pub fn detect_bytes(head: &[u8], file_len: u64) -> FormatInfo {
    for (signature, classification) in SIGNATURES {
        if head.starts_with(signature) {
            return FormatInfo::from_signature(*classification);
        }
    }

    if BUNDLE_SIGNATURES.iter().any(|sig| head.starts_with(sig)) {
        return FormatInfo::from_signature(Classification::RawBundle);
    }

    let window = &head[..head.len().min(PROBE_LEN)];
    if window
        .windows(BROTLI_MARKER.len())
        .any(|w| w == BROTLI_MARKER)
    {
        return FormatInfo::from_signature(Classification::Compressed(Compression::Brotli));
    }

    if looks_like_serialized_file(head, file_len) {
        return FormatInfo::from_heuristic(Classification::RawAsset);
    }

    FormatInfo::unknown()
}

/// Checks the serialized-file header: a big-endian version at offset 8 in a
/// plausible range and a stored file size equal to the real one.
///
/// Versions below 22 store the size as a u32 at offset 4; later versions
/// store it as a u64 at offset 24.
fn looks_like_serialized_file(head: &[u8], file_len: u64) -> bool {
    let Some(version) = be_u32(head, 8) else {
        return false;
    };
    if !SERIALIZED_VERSIONS.contains(&version) {
        return false;
    }

    if version < WIDE_HEADER_VERSION {
        be_u32(head, 4).is_some_and(|size| u64::from(size) == file_len)
    } else {
        be_u64(head, 24).is_some_and(|size| size == file_len)
    }
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at + 4)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

fn be_u64(data: &[u8], at: usize) -> Option<u64> {
    let bytes = data.get(at..at + 8)?;
    Some(u64::from_be_bytes(bytes.try_into().ok()?))
}

/// Classifies a file by extension or well-known name.
///
/// # Example
///
/// ```rust
/// use splashpatch::codec::Compression;
/// use splashpatch::format::detect::{detect_from_name, Classification};
///
/// assert_eq!(detect_from_name("Build.data.br"), Classification::Compressed(Compression::Brotli));
/// assert_eq!(detect_from_name("globalgamemanagers"), Classification::RawAsset);
/// assert_eq!(detect_from_name("readme.txt"), Classification::Unknown);
/// ```
pub fn detect_from_name(file_name: &str) -> Classification {
    let lower = file_name.to_lowercase();
    if lower == "globalgamemanagers" {
        return Classification::RawAsset;
    }
    if lower == "data.unity3d" {
        return Classification::RawBundle;
    }
    match lower.rsplit_once('.').map(|(_, ext)| ext) {
        Some("br") => Classification::Compressed(Compression::Brotli),
        Some("gz") => Classification::Compressed(Compression::Gzip),
        _ => Classification::Unknown,
    }
}

/// Returns true for `*.unityweb` files, whose compression cannot always be
/// told from their bytes.
pub fn is_unityweb(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("unityweb"))
}

/// Classifies the file at `path`, signature first, then name.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the file does not exist.
pub fn classify(path: &Path) -> Result<FormatInfo> {
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::Io(e)
        }
    })?;
    let file_len = file.metadata()?.len();

    let mut head = Vec::with_capacity(PROBE_LEN);
    (&mut file).take(PROBE_LEN as u64).read_to_end(&mut head)?;

    let info = detect_bytes(&head, file_len);
    if !info.is_unknown() {
        log::debug!(
            "{} classified as {} from its header",
            path.display(),
            info.classification
        );
        return Ok(info);
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    match detect_from_name(name) {
        Classification::Unknown => Ok(FormatInfo::unknown()),
        classification => {
            log::debug!(
                "{} classified as {} from its name",
                path.display(),
                classification
            );
            Ok(FormatInfo::from_name(classification))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serialized_header(version: u32, size: u64) -> Vec<u8> {
        let mut data = vec![0u8; 48];
        data[8..12].copy_from_slice(&version.to_be_bytes());
        if version < WIDE_HEADER_VERSION {
            data[4..8].copy_from_slice(&(size as u32).to_be_bytes());
        } else {
            data[24..32].copy_from_slice(&size.to_be_bytes());
        }
        data
    }

    #[test]
    fn test_detect_container_signature() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&20u32.to_le_bytes());
        let info = detect_bytes(&data, data.len() as u64);
        assert_eq!(info.classification, Classification::RawContainer);
        assert_eq!(info.confidence, 1.0);
    }

    #[test]
    fn test_detect_bundle_signatures() {
        for sig in BUNDLE_SIGNATURES {
            let info = detect_bytes(sig, 100);
            assert_eq!(info.classification, Classification::RawBundle);
        }
    }

    #[test]
    fn test_detect_gzip_signature() {
        let data = [0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];
        let info = detect_bytes(&data, 8);
        assert_eq!(
            info.classification,
            Classification::Compressed(Compression::Gzip)
        );
    }

    #[test]
    fn test_detect_brotli_marker() {
        let mut data = vec![0x6b, 0x8d, 0x00];
        data.extend_from_slice(BROTLI_MARKER);
        let info = detect_bytes(&data, 4096);
        assert_eq!(
            info.classification,
            Classification::Compressed(Compression::Brotli)
        );
    }

    #[test]
    fn test_detect_serialized_legacy_and_wide() {
        let legacy = serialized_header(17, 4096);
        assert_eq!(
            detect_bytes(&legacy, 4096).classification,
            Classification::RawAsset
        );

        let wide = serialized_header(22, 1 << 33);
        let info = detect_bytes(&wide, 1 << 33);
        assert_eq!(info.classification, Classification::RawAsset);
        assert_eq!(info.confidence, 0.7);
    }

    #[test]
    fn test_serialized_size_mismatch_is_unknown() {
        let legacy = serialized_header(17, 4096);
        assert!(detect_bytes(&legacy, 4097).is_unknown());
    }

    #[test]
    fn test_detect_unknown() {
        let data = [0u8; 64];
        let info = detect_bytes(&data, 64);
        assert_eq!(info.classification, Classification::Unknown);
        assert_eq!(info.confidence, 0.0);
    }

    #[test]
    fn test_detect_from_name() {
        assert_eq!(
            detect_from_name("WebGL.data.gz"),
            Classification::Compressed(Compression::Gzip)
        );
        assert_eq!(
            detect_from_name("WebGL.data.BR"),
            Classification::Compressed(Compression::Brotli)
        );
        assert_eq!(detect_from_name("data.unity3d"), Classification::RawBundle);
        assert_eq!(detect_from_name("WebGL.data.unityweb"), Classification::Unknown);
    }

    #[test]
    fn test_is_unityweb() {
        assert!(is_unityweb(Path::new("Build/WebGL.data.unityweb")));
        assert!(!is_unityweb(Path::new("Build/WebGL.data")));
    }

    #[test]
    fn test_classify_signature_beats_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("globalgamemanagers");
        std::fs::write(&path, [0x1F, 0x8B, 0x08]).unwrap();
        let info = classify(&path).unwrap();
        assert_eq!(
            info.classification,
            Classification::Compressed(Compression::Gzip)
        );
    }

    #[test]
    fn test_classify_name_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("globalgamemanagers");
        std::fs::write(&path, [0u8; 16]).unwrap();
        let info = classify(&path).unwrap();
        assert_eq!(info.classification, Classification::RawAsset);
        assert_eq!(info.confidence, 0.5);
    }

    #[test]
    fn test_classify_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = classify(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
