//! Entry input methods.
//!
//! Entries can be added from in-memory buffers or from files on disk. File
//! contents are only read when the writer is finished.

use std::fs;
use std::io::{Seek, Write};
use std::path::Path;

use crate::{ArchivePath, Error, Result};

use super::{EntrySource, PendingEntry, Writer};

impl<W: Write + Seek> Writer<W> {
    /// Adds an entry from a byte buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEntry`] if the name was already added, or
    /// [`Error::ArchiveTooLarge`] if the buffer exceeds 32 bits.
    pub fn add_bytes(&mut self, archive_path: ArchivePath, data: impl Into<Vec<u8>>) -> Result<()> {
        let data = data.into();
        let size = entry_size(data.len() as u64)?;
        self.push(archive_path, EntrySource::Bytes(data), size)
    }

    /// Adds a file from a filesystem path.
    ///
    /// # Arguments
    ///
    /// * `disk_path` - Path to the file on disk
    /// * `archive_path` - Name of the entry in the container
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist,
    /// [`Error::DuplicateEntry`] if the name was already added, or
    /// [`Error::ArchiveTooLarge`] if the file exceeds 32 bits.
    pub fn add_path(
        &mut self,
        disk_path: impl AsRef<Path>,
        archive_path: ArchivePath,
    ) -> Result<()> {
        let disk_path = disk_path.as_ref();
        let meta = fs::metadata(disk_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound {
                    path: disk_path.to_path_buf(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        let size = entry_size(meta.len())?;
        self.push(
            archive_path,
            EntrySource::Path(disk_path.to_path_buf()),
            size,
        )
    }

    fn push(&mut self, path: ArchivePath, source: EntrySource, size: u32) -> Result<()> {
        if !self.names.insert(path.as_str().to_string()) {
            return Err(Error::DuplicateEntry {
                path: path.as_str().to_string(),
            });
        }
        log::trace!("queued {path} ({size} bytes)");
        self.entries.push(PendingEntry { path, source, size });
        Ok(())
    }
}

fn entry_size(len: u64) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::ArchiveTooLarge { size: len })
}
