//! UnityWebData header structures and parsing.

use std::collections::HashSet;
use std::io::{self, Read, Write};

use super::{ENTRY_FIXED_SIZE, MAX_MAGIC_LEN, OFFSET_FIELD_SIZE};
use crate::{Error, Result};

/// One record of the entry table, as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Absolute offset of the payload.
    pub offset: u32,
    /// Payload length in bytes.
    pub size: u32,
    /// Entry name, a forward-slash separated relative path.
    pub name: String,
}

impl EntryRecord {
    /// Number of bytes this record occupies in the table.
    pub fn encoded_len(&self) -> u64 {
        ENTRY_FIXED_SIZE + self.name.len() as u64
    }

    /// Exclusive end of the payload.
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.size)
    }
}

/// The decoded header of a container: magic plus entry table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Magic bytes, terminator included.
    pub magic: Vec<u8>,
    /// Absolute offset of the first payload, which is also the end of the table.
    pub first_entry_offset: u32,
    /// Table records in on-disk order.
    pub entries: Vec<EntryRecord>,
}

impl ContainerHeader {
    /// Parses a header from the start of a container of `archive_len` bytes.
    ///
    /// The magic is read up to its terminator but not compared against
    /// [`MAGIC`](super::MAGIC). Every payload range is checked against
    /// `archive_len`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHeader`] if the table is truncated, overshoots
    /// `firstEntryDataOffset`, or points past the end of the container, and
    /// [`Error::DuplicateEntry`] if two records share a name.
    pub fn parse<R: Read>(r: &mut R, archive_len: u64) -> Result<Self> {
        let magic = read_magic(r)?;
        let mut pos = magic.len() as u64;

        let first_entry_offset = read_u32_le(r, pos, "firstEntryDataOffset")?;
        pos += OFFSET_FIELD_SIZE;

        let first = u64::from(first_entry_offset);
        if first < pos {
            return Err(Error::CorruptHeader {
                offset: magic.len() as u64,
                reason: format!("first entry offset {first} lies inside the fixed header"),
            });
        }
        if first > archive_len {
            return Err(Error::CorruptHeader {
                offset: magic.len() as u64,
                reason: format!(
                    "first entry offset {first} is past the end of the container ({archive_len} bytes)"
                ),
            });
        }

        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        while pos < first {
            let record_start = pos;
            if pos + ENTRY_FIXED_SIZE > first {
                return Err(overshoot(record_start, first));
            }
            let offset = read_u32_le(r, pos, "dataOffset")?;
            let size = read_u32_le(r, pos + 4, "dataSize")?;
            let name_size = read_u32_le(r, pos + 8, "nameSize")?;
            pos += ENTRY_FIXED_SIZE;

            if pos + u64::from(name_size) > first {
                return Err(overshoot(record_start, first));
            }
            let mut name = vec![0u8; name_size as usize];
            read_exact_at(r, &mut name, pos, "entry name")?;
            pos += u64::from(name_size);

            let name = String::from_utf8(name).map_err(|_| Error::CorruptHeader {
                offset: record_start,
                reason: "entry name is not valid UTF-8".into(),
            })?;

            let record = EntryRecord { offset, size, name };
            if record.end() > archive_len {
                return Err(Error::CorruptHeader {
                    offset: record_start,
                    reason: format!(
                        "entry {} spans {}..{} beyond the container end ({archive_len} bytes)",
                        record.name,
                        record.offset,
                        record.end()
                    ),
                });
            }
            if !seen.insert(record.name.clone()) {
                return Err(Error::DuplicateEntry { path: record.name });
            }
            entries.push(record);
        }

        Ok(Self {
            magic,
            first_entry_offset,
            entries,
        })
    }

    /// Length of the magic, offset field and table.
    pub fn encoded_len(&self) -> u64 {
        header_len(&self.magic, self.entries.iter().map(|e| e.name.as_str()))
    }

    /// Writes the header exactly as it is stored on disk.
    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.magic)?;
        w.write_all(&self.first_entry_offset.to_le_bytes())?;
        for entry in &self.entries {
            w.write_all(&entry.offset.to_le_bytes())?;
            w.write_all(&entry.size.to_le_bytes())?;
            w.write_all(&(entry.name.len() as u32).to_le_bytes())?;
            w.write_all(entry.name.as_bytes())?;
        }
        Ok(())
    }
}

/// Computes the header length for a magic and a set of entry names.
pub fn header_len<'a>(magic: &[u8], names: impl IntoIterator<Item = &'a str>) -> u64 {
    names
        .into_iter()
        .fold(magic.len() as u64 + OFFSET_FIELD_SIZE, |len, name| {
            len + ENTRY_FIXED_SIZE + name.len() as u64
        })
}

fn overshoot(record_start: u64, first: u64) -> Error {
    Error::CorruptHeader {
        offset: record_start,
        reason: format!("entry table overshoots the first entry offset {first}"),
    }
}

/// Reads the null-terminated magic, bounded to [`MAX_MAGIC_LEN`] bytes.
fn read_magic<R: Read>(r: &mut R) -> Result<Vec<u8>> {
    let mut magic = Vec::with_capacity(16);
    let mut byte = [0u8; 1];
    while magic.len() < MAX_MAGIC_LEN {
        read_exact_at(r, &mut byte, magic.len() as u64, "magic")?;
        magic.push(byte[0]);
        if byte[0] == 0 {
            return Ok(magic);
        }
    }
    Err(Error::CorruptHeader {
        offset: 0,
        reason: format!("no magic terminator within the first {MAX_MAGIC_LEN} bytes"),
    })
}

fn read_u32_le<R: Read>(r: &mut R, pos: u64, what: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact_at(r, &mut buf, pos, what)?;
    Ok(u32::from_le_bytes(buf))
}

/// `read_exact` that reports a truncated header as [`Error::CorruptHeader`].
fn read_exact_at<R: Read>(r: &mut R, buf: &mut [u8], pos: u64, what: &str) -> Result<()> {
    r.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::CorruptHeader {
                offset: pos,
                reason: format!("unexpected end of file while reading {what}"),
            }
        } else {
            Error::Io(e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::MAGIC;
    use std::io::Cursor;

    fn sample() -> Vec<u8> {
        // Two entries: "a" (3 bytes) and "dir/b" (2 bytes)
        let table = 16 + 4 + (12 + 1) + (12 + 5);
        let mut data = Vec::new();
        data.extend_from_slice(MAGIC);
        data.extend_from_slice(&(table as u32).to_le_bytes());
        data.extend_from_slice(&(table as u32).to_le_bytes());
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(b"a");
        data.extend_from_slice(&(table as u32 + 3).to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&5u32.to_le_bytes());
        data.extend_from_slice(b"dir/b");
        data.extend_from_slice(b"xyzuv");
        data
    }

    fn parse(data: &[u8]) -> Result<ContainerHeader> {
        ContainerHeader::parse(&mut Cursor::new(data), data.len() as u64)
    }

    #[test]
    fn test_parse_two_entries() {
        let data = sample();
        let header = parse(&data).unwrap();
        assert_eq!(header.magic, MAGIC);
        assert_eq!(header.entries.len(), 2);
        assert_eq!(header.entries[1].name, "dir/b");
        assert_eq!(header.entries[1].end(), data.len() as u64);
        assert_eq!(header.encoded_len(), u64::from(header.first_entry_offset));
    }

    #[test]
    fn test_write_reproduces_bytes() {
        let data = sample();
        let header = parse(&data).unwrap();
        let mut out = Vec::new();
        header.write(&mut out).unwrap();
        assert_eq!(out, &data[..header.first_entry_offset as usize]);
    }

    #[test]
    fn test_empty_table() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&20u32.to_le_bytes());
        let header = parse(&data).unwrap();
        assert!(header.entries.is_empty());
    }

    #[test]
    fn test_unterminated_magic() {
        let data = vec![b'U'; 100];
        let err = parse(&data).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { offset: 0, .. }));
    }

    #[test]
    fn test_first_offset_inside_header() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&4u32.to_le_bytes());
        assert!(matches!(parse(&data), Err(Error::CorruptHeader { .. })));
    }

    #[test]
    fn test_first_offset_past_end() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(parse(&data), Err(Error::CorruptHeader { .. })));
    }

    #[test]
    fn test_table_overshoot() {
        let mut data = sample();
        // Claim the table ends in the middle of the second record
        let short = (16 + 4 + 13 + 6) as u32;
        data[16..20].copy_from_slice(&short.to_le_bytes());
        let err = parse(&data).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }), "{err}");
    }

    #[test]
    fn test_payload_past_end() {
        let mut data = sample();
        data.truncate(data.len() - 1);
        let err = parse(&data).unwrap_err();
        assert!(err.to_string().contains("dir/b"), "{err}");
    }

    #[test]
    fn test_duplicate_names() {
        let table = 16 + 4 + 2 * 13;
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&(table as u32).to_le_bytes());
        for _ in 0..2 {
            data.extend_from_slice(&(table as u32).to_le_bytes());
            data.extend_from_slice(&0u32.to_le_bytes());
            data.extend_from_slice(&1u32.to_le_bytes());
            data.push(b'a');
        }
        let err = parse(&data).unwrap_err();
        assert!(matches!(err, Error::DuplicateEntry { ref path } if path == "a"));
    }

    #[test]
    fn test_header_len() {
        assert_eq!(header_len(MAGIC, ["a", "dir/b"]), 16 + 4 + 13 + 17);
        assert_eq!(header_len(MAGIC, std::iter::empty()), 20);
    }
}
