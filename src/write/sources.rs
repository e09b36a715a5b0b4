//! Source enumeration for packing a directory tree.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{ArchivePath, Error, Result};

/// A file on disk together with its entry name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Entry name, relative to the packed directory.
    pub path: ArchivePath,
    /// Location of the file on disk.
    pub disk_path: PathBuf,
}

/// Lists every regular file below `dir` in packing order.
///
/// Files inside subdirectories come first, sorted by entry name in
/// descending order; root-level files follow in ascending order. So
/// `{a, b, x/y, x/z}` is returned as `[x/z, x/y, a, b]`.
///
/// # Errors
///
/// Returns an error if the directory cannot be walked or a relative path is
/// not valid UTF-8.
pub fn collect_sources(dir: &Path) -> Result<Vec<SourceFile>> {
    let mut nested = Vec::new();
    let mut root = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => Error::Io(io),
            None => Error::InvalidArchivePath(format!("filesystem loop below {}", dir.display())),
        })?;
        if !entry.file_type().is_file() {
            if !entry.file_type().is_dir() {
                log::warn!("skipping non-regular file {}", entry.path().display());
            }
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|_| Error::InvalidArchivePath(entry.path().display().to_string()))?;
        let source = SourceFile {
            path: ArchivePath::from_relative(relative)?,
            disk_path: entry.path().to_path_buf(),
        };
        if source.path.is_root_level() {
            root.push(source);
        } else {
            nested.push(source);
        }
    }

    nested.sort_by(|a, b| descending(&a.path, &b.path));
    root.sort_by(|a, b| a.path.cmp(&b.path));
    nested.extend(root);
    Ok(nested)
}

fn descending(a: &ArchivePath, b: &ArchivePath) -> Ordering {
    b.as_str().cmp(a.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_ordering_law() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x")).unwrap();
        for name in ["b", "a", "x/z", "x/y"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let names: Vec<_> = collect_sources(dir.path())
            .unwrap()
            .into_iter()
            .map(|s| s.path.as_str().to_string())
            .collect();
        assert_eq!(names, ["x/z", "x/y", "a", "b"]);
    }

    #[test]
    fn test_deep_nesting_and_empty_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("a/b/c/deep.bin"), b"1").unwrap();
        fs::write(dir.path().join("a/top.bin"), b"2").unwrap();

        let names: Vec<_> = collect_sources(dir.path())
            .unwrap()
            .into_iter()
            .map(|s| s.path.as_str().to_string())
            .collect();
        assert_eq!(names, ["a/top.bin", "a/b/c/deep.bin"]);
    }
}
