//! Path safety validation for container extraction.

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Resolves where an entry is extracted to, refusing anything that would
/// land outside `dest`.
///
/// Entry names are already [`ArchivePath`](crate::ArchivePath)s; this is the
/// second line that keeps the joined path under `dest` on every platform.
pub(crate) fn validate_path(entry_idx: usize, entry_path: &str, dest: &Path) -> Result<PathBuf> {
    let relative = Path::new(entry_path);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(Error::PathTraversal {
            entry_index: entry_idx,
            path: entry_path.to_string(),
        });
    }

    let full_path = dest.join(relative);
    if !full_path.starts_with(dest) {
        return Err(Error::PathTraversal {
            entry_index: entry_idx,
            path: entry_path.to_string(),
        });
    }
    Ok(full_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_path_is_joined() {
        let dest = Path::new("/tmp/out");
        let path = validate_path(0, "StreamingAssets/a.bin", dest).unwrap();
        assert_eq!(path, dest.join("StreamingAssets").join("a.bin"));
    }

    #[test]
    fn test_traversal_rejected() {
        let dest = Path::new("/tmp/out");
        for name in ["../evil", "a/../../evil", "/etc/passwd"] {
            let err = validate_path(3, name, dest).unwrap_err();
            assert!(matches!(err, Error::PathTraversal { entry_index: 3, .. }));
        }
    }
}
