//! Brotli compression codec.
//!
//! Unity writes Brotli-compressed WebGL data either as `*.br` files or as
//! `*.unityweb` files whose first metablock carries the comment
//! `UnityWeb Compressed Content (brotli)`. Both are plain Brotli streams, so
//! the decoder needs no special handling for the marker.

use std::io::{self, Read, Write};

use brotli::CompressorWriter;
use brotli::Decompressor;
use brotli::enc::BrotliEncoderParams;

use super::{CompressionLevel, Decoder, Encoder};

/// Default buffer size for the Brotli reader and writer.
const BUFFER_SIZE: usize = 4096;

/// Brotli decoder.
pub struct BrotliDecoder<R: Read> {
    inner: Decompressor<R>,
}

impl<R: Read> std::fmt::Debug for BrotliDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrotliDecoder").finish_non_exhaustive()
    }
}

impl<R: Read> BrotliDecoder<R> {
    /// Creates a new Brotli decoder over `input`.
    pub fn new(input: R) -> Self {
        Self {
            inner: Decompressor::new(input, BUFFER_SIZE),
        }
    }
}

impl<R: Read> Read for BrotliDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> Decoder for BrotliDecoder<R> {}

/// Brotli encoder options.
#[derive(Debug, Clone)]
pub struct BrotliEncoderOptions {
    /// Compression quality (0-11).
    pub quality: u32,
    /// LG window size (10-24).
    pub lg_window_size: u32,
}

impl Default for BrotliEncoderOptions {
    fn default() -> Self {
        Self::for_level(CompressionLevel::default())
    }
}

impl BrotliEncoderOptions {
    /// Maps a [`CompressionLevel`] to encoder parameters.
    pub fn for_level(level: CompressionLevel) -> Self {
        let quality = match level {
            CompressionLevel::Smallest => 11,
            CompressionLevel::Optimal => 6,
        };
        Self {
            quality,
            lg_window_size: 22,
        }
    }
}

/// Brotli encoder.
pub struct BrotliEncoder<W: Write> {
    inner: CompressorWriter<W>,
}

impl<W: Write> std::fmt::Debug for BrotliEncoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrotliEncoder").finish_non_exhaustive()
    }
}

impl<W: Write> BrotliEncoder<W> {
    /// Creates a new Brotli encoder.
    pub fn new(output: W, options: &BrotliEncoderOptions) -> Self {
        let params = BrotliEncoderParams {
            quality: options.quality.min(11) as i32,
            lgwin: options.lg_window_size.clamp(10, 24) as i32,
            ..Default::default()
        };
        Self {
            inner: CompressorWriter::with_params(output, BUFFER_SIZE, &params),
        }
    }

    /// Finishes the stream and returns the underlying writer.
    pub fn try_finish(mut self) -> io::Result<W> {
        // Surface pending write errors before the final metablock is emitted.
        self.inner.flush()?;
        Ok(self.inner.into_inner())
    }
}

impl<W: Write> Write for BrotliEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Encoder for BrotliEncoder<W> {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut output = (*self).try_finish()?;
        output.flush()
    }
}
