//! File extraction from containers.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

use super::path_safety::validate_path;
use super::{Archive, ExtractResult};

impl<R: Read + Seek> Archive<R> {
    /// Extracts every entry below `dest`, creating directories as needed.
    ///
    /// Existing files with the same names are overwritten. Extraction stops
    /// at the first failure; files written so far stay on disk.
    pub fn extract(&mut self, dest: impl AsRef<Path>) -> Result<ExtractResult> {
        let dest = dest.as_ref();
        fs::create_dir_all(dest)?;

        let mut result = ExtractResult::default();
        for entry in &self.entries {
            let target = validate_path(entry.index, entry.name(), dest)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }

            self.reader.seek(SeekFrom::Start(u64::from(entry.offset)))?;
            let mut out = BufWriter::new(File::create(&target)?);
            let copied = io::copy(&mut (&mut self.reader).take(u64::from(entry.size)), &mut out)?;
            out.flush()?;

            if copied != u64::from(entry.size) {
                return Err(Error::CorruptHeader {
                    offset: u64::from(entry.offset),
                    reason: format!(
                        "payload of {} ends after {copied} of {} bytes",
                        entry.name(),
                        entry.size
                    ),
                });
            }

            log::trace!("extracted {} ({} bytes)", entry.name(), entry.size);
            result.entries_extracted += 1;
            result.bytes_extracted += copied;
        }
        Ok(result)
    }
}

/// Returns the directory a container is unpacked into: its file stem, next
/// to the container.
///
/// A container without an extension would collide with itself, so it gets
/// an `_unpacked` suffix instead.
///
/// ```rust
/// use std::path::Path;
/// use splashpatch::read::unpack_dir_for;
///
/// assert_eq!(unpack_dir_for(Path::new("Build/WebGL.data")), Path::new("Build/WebGL"));
/// assert_eq!(unpack_dir_for(Path::new("Build/WebGL")), Path::new("Build/WebGL_unpacked"));
/// ```
pub fn unpack_dir_for(archive_path: &Path) -> PathBuf {
    let parent = archive_path.parent().unwrap_or_else(|| Path::new(""));
    match (archive_path.file_stem(), archive_path.extension()) {
        (Some(stem), Some(_)) => parent.join(stem),
        _ => {
            let mut name = archive_path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_default();
            name.push("_unpacked");
            parent.join(name)
        }
    }
}

/// Unpacks the container at `archive_path` into [`unpack_dir_for`] and
/// returns that directory.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the container does not exist. Any failure
/// aborts; partially extracted files are left for the caller to clean.
pub fn unpack(archive_path: impl AsRef<Path>) -> Result<PathBuf> {
    let archive_path = archive_path.as_ref();
    if !archive_path.is_file() {
        return Err(Error::NotFound {
            path: archive_path.to_path_buf(),
        });
    }

    let mut archive = Archive::open_path(archive_path)?;
    let output = unpack_dir_for(archive_path);
    let result = archive.extract(&output)?;
    log::info!(
        "unpacked {} entries ({} bytes) from {} into {}",
        result.entries_extracted,
        result.bytes_extracted,
        archive_path.display(),
        output.display()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArchivePath;
    use crate::write::Writer;

    #[test]
    fn test_unpack_nested() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("WebGL.data");

        let mut writer = Writer::create(File::create(&archive_path).unwrap()).unwrap();
        writer
            .add_bytes(ArchivePath::new("root.txt").unwrap(), b"12345".to_vec())
            .unwrap();
        writer
            .add_bytes(ArchivePath::new("dir/a.bin").unwrap(), Vec::new())
            .unwrap();
        writer.finish().unwrap();

        let out = unpack(&archive_path).unwrap();
        assert_eq!(out, dir.path().join("WebGL"));
        assert_eq!(fs::read(out.join("root.txt")).unwrap(), b"12345");
        assert_eq!(fs::read(out.join("dir").join("a.bin")).unwrap(), b"");
    }

    #[test]
    fn test_unpack_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = unpack(dir.path().join("absent.data")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
