//! Compression filters wrapped around Unity player data.
//!
//! WebGL builds ship their data container either raw, Brotli-compressed or
//! gzip-compressed. This module exposes both variants behind the
//! [`Compression`] enum so callers never match on the concrete codec:
//!
//! ```rust
//! # #[cfg(feature = "gzip")]
//! # fn main() -> splashpatch::Result<()> {
//! use splashpatch::codec::{Compression, CompressionLevel};
//!
//! let packed = Compression::Gzip.compress_bytes(b"UnityWebData1.0\0", CompressionLevel::default())?;
//! let unpacked = Compression::Gzip.decompress_bytes(&packed)?;
//! assert_eq!(unpacked, b"UnityWebData1.0\0");
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "gzip"))]
//! # fn main() {}
//! ```
//!
//! Every failure of the underlying transform is reported as
//! [`Error::Compression`]; a failed call never yields partial output.

#[cfg(feature = "brotli")]
pub mod brotli;

#[cfg(feature = "gzip")]
pub mod gzip;

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::staging::temp_sibling;
use crate::{Error, Result};

#[cfg(feature = "brotli")]
pub use self::brotli::{BrotliDecoder, BrotliEncoder, BrotliEncoderOptions};

#[cfg(feature = "gzip")]
pub use self::gzip::{GzipDecoder, GzipEncoder, GzipEncoderOptions};

/// A decoder that reads compressed data and produces uncompressed output.
pub trait Decoder: Read {}

/// An encoder that takes uncompressed data and produces compressed output.
pub trait Encoder: Write {
    /// Finishes encoding and flushes any remaining data.
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// Compression variant applied to a whole file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Brotli, as written by Unity for `.br` and Brotli `.unityweb` files.
    Brotli,
    /// gzip, as written by Unity for `.gz` and gzip `.unityweb` files.
    Gzip,
}

impl Compression {
    /// All variants, in the order they are offered to users.
    pub const ALL: [Compression; 2] = [Compression::Brotli, Compression::Gzip];

    /// Returns a short lowercase name for this variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Brotli => "brotli",
            Self::Gzip => "gzip",
        }
    }

    /// Returns the file extension Unity uses for this variant, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Brotli => "br",
            Self::Gzip => "gz",
        }
    }

    /// Returns true if support for this variant is compiled in.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Brotli => cfg!(feature = "brotli"),
            Self::Gzip => cfg!(feature = "gzip"),
        }
    }

    /// Returns the cargo feature that enables this variant.
    pub fn required_feature(&self) -> &'static str {
        self.name()
    }

    /// Wraps `input` in a decoder for this variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCompression`] if the variant is not compiled in,
    /// or [`Error::Compression`] if the stream header cannot be read.
    pub fn decoder<'a, R: Read + 'a>(&self, input: R) -> Result<Box<dyn Decoder + 'a>> {
        match self {
            #[cfg(feature = "brotli")]
            Self::Brotli => Ok(Box::new(BrotliDecoder::new(input))),
            #[cfg(feature = "gzip")]
            Self::Gzip => Ok(Box::new(GzipDecoder::new(input))),
            #[allow(unreachable_patterns)]
            other => {
                let _ = input;
                Err(Error::UnsupportedCompression(*other))
            }
        }
    }

    /// Wraps `output` in an encoder for this variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedCompression`] if the variant is not compiled in.
    pub fn encoder<'a, W: Write + 'a>(
        &self,
        output: W,
        level: CompressionLevel,
    ) -> Result<Box<dyn Encoder + 'a>> {
        match self {
            #[cfg(feature = "brotli")]
            Self::Brotli => Ok(Box::new(BrotliEncoder::new(
                output,
                &BrotliEncoderOptions::for_level(level),
            ))),
            #[cfg(feature = "gzip")]
            Self::Gzip => Ok(Box::new(GzipEncoder::new(
                output,
                &GzipEncoderOptions::for_level(level),
            ))),
            #[allow(unreachable_patterns)]
            other => {
                let _ = (output, level);
                Err(Error::UnsupportedCompression(*other))
            }
        }
    }

    /// Compresses everything from `input` into `output`.
    ///
    /// Returns the number of uncompressed bytes consumed.
    pub fn compress_stream<R: Read, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
        level: CompressionLevel,
    ) -> Result<u64> {
        let mut encoder = self.encoder(output, level)?;
        let written = io::copy(input, &mut encoder).map_err(|e| self.stream_error(e))?;
        encoder.finish().map_err(|e| self.stream_error(e))?;
        Ok(written)
    }

    /// Decompresses everything from `input` into `output`.
    ///
    /// Returns the number of decompressed bytes written.
    pub fn decompress_stream<R: Read, W: Write>(&self, input: &mut R, output: &mut W) -> Result<u64> {
        let mut decoder = self.decoder(input)?;
        io::copy(&mut decoder, output).map_err(|e| self.stream_error(e))
    }

    /// Compresses an in-memory buffer.
    pub fn compress_bytes(&self, data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(data.len() / 2);
        self.compress_stream(&mut &data[..], &mut output, level)?;
        Ok(output)
    }

    /// Decompresses an in-memory buffer.
    pub fn decompress_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(data.len().saturating_mul(2));
        self.decompress_stream(&mut &data[..], &mut output)?;
        Ok(output)
    }

    /// Compresses `input` into a new file at `output` and returns `output`.
    ///
    /// The result is written to a temporary sibling and renamed into place
    /// only once the stream has been finished.
    pub fn compress_file(
        &self,
        input: &Path,
        output: &Path,
        level: CompressionLevel,
    ) -> Result<PathBuf> {
        let mut reader = BufReader::new(open_existing(input)?);
        write_through_temp(output, |writer| {
            self.compress_stream(&mut reader, writer, level).map(|_| ())
        })?;
        log::debug!(
            "{} compressed {} -> {}",
            self,
            input.display(),
            output.display()
        );
        Ok(output.to_path_buf())
    }

    /// Decompresses `input` into a new file at `output` and returns `output`.
    ///
    /// A corrupt stream leaves no file at `output`.
    pub fn decompress_file(&self, input: &Path, output: &Path) -> Result<PathBuf> {
        let mut reader = BufReader::new(open_existing(input)?);
        write_through_temp(output, |writer| {
            self.decompress_stream(&mut reader, writer).map(|_| ())
        })?;
        log::debug!(
            "{} decompressed {} -> {}",
            self,
            input.display(),
            output.display()
        );
        Ok(output.to_path_buf())
    }

    fn stream_error(&self, source: io::Error) -> Error {
        Error::Compression {
            format: *self,
            source,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Brotli => "Brotli",
            Self::Gzip => "gzip",
        })
    }
}

/// How hard the encoders try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionLevel {
    /// Strongest setting: Brotli quality 11 with a 22-bit window, gzip level 9.
    #[default]
    Smallest,
    /// Standard setting: Brotli quality 6, gzip level 6.
    Optimal,
}

fn open_existing(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::Io(e)
        }
    })
}

/// Runs `body` against a buffered temp file next to `output`, then renames it
/// over `output`. The temp file is removed if anything fails.
fn write_through_temp<F>(output: &Path, body: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let temp = temp_sibling(output);
    let result = (|| {
        let mut writer = BufWriter::new(File::create(&temp)?);
        body(&mut writer)?;
        writer.flush()?;
        drop(writer);
        fs::rename(&temp, output)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_extensions() {
        assert_eq!(Compression::Brotli.extension(), "br");
        assert_eq!(Compression::Gzip.extension(), "gz");
        assert_eq!(Compression::Gzip.to_string(), "gzip");
        assert_eq!(Compression::Brotli.name(), "brotli");
        assert_eq!(Compression::Gzip.required_feature(), "gzip");
    }

    #[test]
    fn test_availability_follows_features() {
        assert_eq!(Compression::Brotli.is_available(), cfg!(feature = "brotli"));
        assert_eq!(Compression::Gzip.is_available(), cfg!(feature = "gzip"));
    }

    #[test]
    fn test_default_level_is_smallest() {
        assert_eq!(CompressionLevel::default(), CompressionLevel::Smallest);
    }

    #[cfg(all(feature = "brotli", feature = "gzip"))]
    #[test]
    fn test_bytes_roundtrip_all_variants() {
        let data: Vec<u8> = b"UnityWebData1.0\0".iter().cycle().take(4096).copied().collect();
        for compression in Compression::ALL {
            for level in [CompressionLevel::Smallest, CompressionLevel::Optimal] {
                let packed = compression.compress_bytes(&data, level).unwrap();
                assert!(packed.len() < data.len());
                assert_eq!(compression.decompress_bytes(&packed).unwrap(), data);
            }
        }
    }

    #[cfg(all(feature = "brotli", feature = "gzip"))]
    #[test]
    fn test_corrupt_input_is_compression_error() {
        for compression in Compression::ALL {
            let packed = compression
                .compress_bytes(&[7u8; 2048], CompressionLevel::Optimal)
                .unwrap();
            let truncated = &packed[..packed.len() / 2];
            let err = compression.decompress_bytes(truncated).unwrap_err();
            assert!(
                matches!(err, Error::Compression { format, .. } if format == compression),
                "{compression}: {err}"
            );
        }
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn test_failed_decompress_file_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.gz");
        let output = dir.path().join("broken");
        fs::write(&input, [0x1f, 0x8b, 0x08, 0x00, 0xde, 0xad]).unwrap();

        assert!(Compression::Gzip.decompress_file(&input, &output).is_err());
        assert!(!output.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("game.data");
        let packed = dir.path().join("game.data.gz");
        let restored = dir.path().join("restored.data");
        fs::write(&raw, b"payload payload payload").unwrap();

        let out = Compression::Gzip
            .compress_file(&raw, &packed, CompressionLevel::Smallest)
            .unwrap();
        assert_eq!(out, packed);
        Compression::Gzip.decompress_file(&packed, &restored).unwrap();
        assert_eq!(fs::read(&restored).unwrap(), b"payload payload payload");
    }

    #[test]
    fn test_missing_input_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Compression::Gzip
            .decompress_file(&dir.path().join("absent.gz"), &dir.path().join("absent"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
