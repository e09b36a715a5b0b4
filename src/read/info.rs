//! Container information types.

/// Information about an opened container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveInfo {
    /// Number of entries in the table.
    pub entry_count: usize,
    /// Sum of all payload sizes.
    pub total_size: u64,
    /// Size of the container file.
    pub archive_size: u64,
    /// Length of magic, offset field and table.
    pub header_size: u64,
}

/// Result of an extraction operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractResult {
    /// Number of entries written to disk.
    pub entries_extracted: usize,
    /// Total number of payload bytes written.
    pub bytes_extracted: u64,
}
