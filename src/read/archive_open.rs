//! Container opening.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::format::header::ContainerHeader;
use crate::{ArchivePath, Error, Result};

use super::{Archive, ArchiveInfo, Entry};

impl Archive<BufReader<File>> {
    /// Opens a container from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist, or any error
    /// [`Archive::open`] reports.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| map_io_error(e, path))?;
        Self::open(BufReader::new(file))
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Opens a container from a reader.
    ///
    /// The header and entry table are parsed and validated up front; payloads
    /// are read lazily.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHeader`] or [`Error::DuplicateEntry`] for a
    /// malformed table, and [`Error::PathTraversal`] if an entry name is not a
    /// safe relative path.
    pub fn open(mut reader: R) -> Result<Self> {
        let archive_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let header = ContainerHeader::parse(&mut reader, archive_size)?;

        let mut entries = Vec::with_capacity(header.entries.len());
        let mut total_size = 0u64;
        for (index, record) in header.entries.iter().enumerate() {
            let path = ArchivePath::new(&record.name).map_err(|_| Error::PathTraversal {
                entry_index: index,
                path: record.name.clone(),
            })?;
            total_size += u64::from(record.size);
            entries.push(Entry::new(path, record.offset, record.size, index));
        }

        let info = ArchiveInfo {
            entry_count: entries.len(),
            total_size,
            archive_size,
            header_size: header.encoded_len(),
        };

        log::debug!(
            "opened container: {} entries, {} payload bytes, magic {:?}",
            info.entry_count,
            info.total_size,
            String::from_utf8_lossy(&header.magic).trim_end_matches('\0')
        );

        Ok(Self {
            reader,
            header,
            entries,
            info,
        })
    }

    /// Reads the payload of the entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn read_entry(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = &self.entries[index];
        let mut data = vec![0u8; entry.size as usize];
        self.reader.seek(SeekFrom::Start(u64::from(entry.offset)))?;
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }

    /// Reads the payload of the entry called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no entry has that name.
    pub fn read_entry_by_name(&mut self, name: &str) -> Result<Vec<u8>> {
        let index = self
            .entry(name)
            .map(Entry::index)
            .ok_or_else(|| Error::NotFound { path: name.into() })?;
        self.read_entry(index)
    }
}

/// Maps an open failure, keeping a missing file distinguishable.
pub(crate) fn map_io_error(e: io::Error, path: &Path) -> Error {
    if e.kind() == io::ErrorKind::NotFound {
        Error::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        Error::Io(e)
    }
}
