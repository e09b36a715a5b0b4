//! Container entry types.

use std::ops::Range;

use crate::ArchivePath;

/// An entry in a UnityWebData container.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Entry {
    /// The validated entry name.
    pub path: ArchivePath,
    /// Absolute offset of the payload.
    pub offset: u32,
    /// Payload size in bytes.
    pub size: u32,
    /// Position in the entry table.
    pub(crate) index: usize,
}

impl Entry {
    pub(crate) fn new(path: ArchivePath, offset: u32, size: u32, index: usize) -> Self {
        Self {
            path,
            offset,
            size,
            index,
        }
    }

    /// Returns the entry name.
    pub fn name(&self) -> &str {
        self.path.as_str()
    }

    /// Returns the position of this entry in the table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the byte range of the payload within the container.
    pub fn range(&self) -> Range<u64> {
        let start = u64::from(self.offset);
        start..start + u64::from(self.size)
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_range() {
        let entry = Entry::new(ArchivePath::new("dir/b.bin").unwrap(), 100, 10, 2);
        assert_eq!(entry.range(), 100..110);
        assert_eq!(entry.name(), "dir/b.bin");
        assert_eq!(entry.index(), 2);
        assert!(!entry.is_empty());
    }
}
