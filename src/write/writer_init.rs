//! Writer initialization and finalization.
//!
//! Creation writes the magic and a placeholder `firstEntryDataOffset`;
//! finalization writes the table, the payloads, and patches the offsets.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::format::MAGIC;
use crate::format::header::header_len;
use crate::{Error, Result};

use super::{EntrySource, WriteResult, Writer};

impl Writer<BufWriter<File>> {
    /// Creates a new container file at the given path.
    ///
    /// The file is written in place; use [`pack`](super::pack) for an atomic
    /// commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref()).map_err(Error::Io)?;
        Self::create(BufWriter::new(file))
    }
}

impl<W: Write + Seek> Writer<W> {
    /// Creates a new container writer.
    ///
    /// Offsets are computed relative to the sink's current position, which
    /// is normally its start.
    ///
    /// # Errors
    ///
    /// Returns an error if the magic cannot be written.
    pub fn create(mut sink: W) -> Result<Self> {
        let base = sink.stream_position()?;
        sink.write_all(MAGIC)?;
        // Placeholder for firstEntryDataOffset, patched in finish
        sink.write_all(&0u32.to_le_bytes())?;

        Ok(Self {
            sink,
            base,
            magic: MAGIC.to_vec(),
            entries: Vec::new(),
            names: Default::default(),
        })
    }

    /// Finishes writing the container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArchiveTooLarge`] if the layout does not fit 32-bit
    /// offsets, or an I/O error if writing fails.
    pub fn finish(self) -> Result<WriteResult> {
        let (result, _sink) = self.finish_into_inner()?;
        Ok(result)
    }

    /// Finishes writing the container and returns the underlying sink.
    ///
    /// Useful when writing to a `Cursor<Vec<u8>>` to retrieve the buffer.
    pub fn finish_into_inner(mut self) -> Result<(WriteResult, W)> {
        let table_end = header_len(&self.magic, self.entries.iter().map(|e| e.path.as_str()));
        let total_size: u64 = self.entries.iter().map(|e| u64::from(e.size)).sum();
        let archive_size = table_end + total_size;
        if archive_size > u64::from(u32::MAX) {
            return Err(Error::ArchiveTooLarge { size: archive_size });
        }

        // Table with placeholder offsets
        let mut record_positions = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            record_positions.push(self.sink.stream_position()?);
            let name = entry.path.as_str().as_bytes();
            self.sink.write_all(&0u32.to_le_bytes())?;
            self.sink.write_all(&entry.size.to_le_bytes())?;
            self.sink.write_all(&(name.len() as u32).to_le_bytes())?;
            self.sink.write_all(name)?;
        }

        // Payloads in table order
        let mut payload_offsets = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            payload_offsets.push((self.sink.stream_position()? - self.base) as u32);
            let copied = match &entry.source {
                EntrySource::Bytes(data) => {
                    self.sink.write_all(data)?;
                    data.len() as u64
                }
                EntrySource::Path(disk_path) => {
                    let file = File::open(disk_path)?;
                    let mut reader = BufReader::new(file).take(u64::from(entry.size));
                    io::copy(&mut reader, &mut self.sink)?
                }
            };
            if copied != u64::from(entry.size) {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "{} shrank while packing: expected {} bytes, got {copied}",
                        entry.path, entry.size
                    ),
                )));
            }
        }
        let end = self.sink.stream_position()?;

        // Patch firstEntryDataOffset and every dataOffset
        self.sink
            .seek(SeekFrom::Start(self.base + self.magic.len() as u64))?;
        self.sink.write_all(&(table_end as u32).to_le_bytes())?;
        for (position, offset) in record_positions.iter().zip(&payload_offsets) {
            self.sink.seek(SeekFrom::Start(*position))?;
            self.sink.write_all(&offset.to_le_bytes())?;
        }
        self.sink.seek(SeekFrom::Start(end))?;
        self.sink.flush()?;

        debug_assert_eq!(end - self.base, archive_size);

        let result = WriteResult {
            entries_written: self.entries.len(),
            total_size,
            archive_size,
        };
        Ok((result, self.sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArchivePath;
    use std::io::Cursor;

    fn u32_at(data: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(data[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn test_empty_container() {
        let writer = Writer::create(Cursor::new(Vec::new())).unwrap();
        let (result, cursor) = writer.finish_into_inner().unwrap();
        let data = cursor.into_inner();

        assert_eq!(result.entries_written, 0);
        assert_eq!(data.len(), 20);
        assert_eq!(&data[..16], MAGIC);
        assert_eq!(u32_at(&data, 16), 20);
    }

    #[test]
    fn test_offsets_are_patched() {
        let mut writer = Writer::create(Cursor::new(Vec::new())).unwrap();
        writer
            .add_bytes(ArchivePath::new("a").unwrap(), b"xyz".to_vec())
            .unwrap();
        writer
            .add_bytes(ArchivePath::new("dir/b").unwrap(), b"uv".to_vec())
            .unwrap();
        let (result, cursor) = writer.finish_into_inner().unwrap();
        let data = cursor.into_inner();

        let first = u32_at(&data, 16);
        assert_eq!(first, 16 + 4 + 13 + 17);
        // Entry 0
        assert_eq!(u32_at(&data, 20), first);
        assert_eq!(u32_at(&data, 24), 3);
        // Entry 1
        assert_eq!(u32_at(&data, 33), first + 3);
        assert_eq!(&data[first as usize..], b"xyzuv");
        assert_eq!(result.archive_size, data.len() as u64);
        assert_eq!(result.total_size, 5);
    }

    #[test]
    fn test_add_path_reads_file_at_finish() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("payload.bin");
        std::fs::write(&file, [9u8; 10]).unwrap();

        let mut writer = Writer::create(Cursor::new(Vec::new())).unwrap();
        writer
            .add_path(&file, ArchivePath::new("payload.bin").unwrap())
            .unwrap();
        let (result, cursor) = writer.finish_into_inner().unwrap();
        assert_eq!(result.total_size, 10);
        assert!(cursor.into_inner().ends_with(&[9u8; 10]));
    }
}
