//! Container query methods.

use super::{Archive, ArchiveInfo, Entry};

impl<R> Archive<R> {
    /// Returns information about the container.
    pub fn info(&self) -> &ArchiveInfo {
        &self.info
    }

    /// Returns the entries in table order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the container has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the raw magic bytes, terminator included.
    pub fn magic(&self) -> &[u8] {
        &self.header.magic
    }

    /// Returns the stored `firstEntryDataOffset`.
    pub fn first_entry_offset(&self) -> u32 {
        self.header.first_entry_offset
    }

    /// Looks up an entry by name.
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Consumes the archive and returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
