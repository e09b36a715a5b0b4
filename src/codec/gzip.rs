//! gzip codec implementation.

use std::io::{self, BufReader, Read, Write};

use flate2::Compression as FlateLevel;
use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;

use super::{CompressionLevel, Decoder, Encoder};

/// gzip decoder.
pub struct GzipDecoder<R: Read> {
    inner: GzDecoder<BufReader<R>>,
}

impl<R: Read> std::fmt::Debug for GzipDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipDecoder").finish_non_exhaustive()
    }
}

impl<R: Read> GzipDecoder<R> {
    /// Creates a new gzip decoder.
    ///
    /// # Arguments
    ///
    /// * `input` - The compressed data source
    pub fn new(input: R) -> Self {
        Self {
            inner: GzDecoder::new(BufReader::new(input)),
        }
    }
}

impl<R: Read> Read for GzipDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> Decoder for GzipDecoder<R> {}

/// gzip encoder options.
#[derive(Debug, Clone)]
pub struct GzipEncoderOptions {
    /// Compression level (0-9).
    pub level: u32,
}

impl Default for GzipEncoderOptions {
    fn default() -> Self {
        Self::for_level(CompressionLevel::default())
    }
}

impl GzipEncoderOptions {
    /// Creates options with the given compression level.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }

    /// Maps a [`CompressionLevel`] to a deflate level.
    pub fn for_level(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Smallest => Self::with_level(9),
            CompressionLevel::Optimal => Self::with_level(6),
        }
    }
}

/// gzip encoder.
pub struct GzipEncoder<W: Write> {
    inner: GzEncoder<W>,
}

impl<W: Write> std::fmt::Debug for GzipEncoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GzipEncoder").finish_non_exhaustive()
    }
}

impl<W: Write> GzipEncoder<W> {
    /// Creates a new gzip encoder.
    pub fn new(output: W, options: &GzipEncoderOptions) -> Self {
        Self {
            inner: GzEncoder::new(output, FlateLevel::new(options.level)),
        }
    }

    /// Writes the trailer and returns the underlying writer.
    pub fn try_finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write> Write for GzipEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Encoder for GzipEncoder<W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut output = self.inner.finish()?;
        output.flush()
    }
}
