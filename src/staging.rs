//! Temporary copies, one-time backups and guaranteed cleanup.
//!
//! Every file or directory a pipeline run creates on the side is registered
//! with a [`Staging`] guard, which deletes them exactly once when the run
//! ends, whether it succeeded or not. The `.bak` backup and the final output
//! are never registered.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::{Error, Result};

/// Suffix of the one-time backup written next to the original input.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Suffix of the scratch copy the record editor works on.
pub const CLONE_SUFFIX: &str = ".temp";

/// Suffix of in-flight files that are renamed into place on success.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Returns `path` with `suffix` appended to its file name.
///
/// ```rust
/// use std::path::Path;
/// use splashpatch::staging::with_suffix;
///
/// assert_eq!(with_suffix(Path::new("Build/WebGL.data"), ".bak"), Path::new("Build/WebGL.data.bak"));
/// ```
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Returns the temporary sibling used while writing `path`.
pub fn temp_sibling(path: &Path) -> PathBuf {
    with_suffix(path, TEMP_SUFFIX)
}

/// Returns the backup path for `path`.
pub fn backup_path_for(path: &Path) -> PathBuf {
    with_suffix(path, BACKUP_SUFFIX)
}

/// Copies `source` to `dest`, creating parent directories and keeping the
/// modification time.
///
/// A missing source or a failed copy is logged rather than returned; the
/// intended destination is returned either way so callers can still register
/// it for cleanup.
pub fn clone_file(source: &Path, dest: &Path) -> PathBuf {
    if !source.is_file() {
        log::error!("cannot clone {}: source file does not exist", source.display());
        return dest.to_path_buf();
    }

    let result = (|| -> io::Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, dest)?;
        let meta = fs::metadata(source)?;
        filetime::set_file_mtime(dest, FileTime::from_last_modification_time(&meta))?;
        Ok(())
    })();

    match result {
        Ok(()) => log::debug!("cloned {} -> {}", source.display(), dest.display()),
        Err(e) => log::error!(
            "cloning {} to {} failed: {e}",
            source.display(),
            dest.display()
        ),
    }
    dest.to_path_buf()
}

/// Copies `source` to `source.bak` unless that file already exists.
///
/// The existing backup is never overwritten, so the first run's original
/// survives any number of later runs. The copy goes through a temporary
/// sibling so an interrupted backup never looks complete.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if `source` does not exist, or an I/O error if
/// the copy fails.
pub fn backup_only_once(source: &Path) -> Result<PathBuf> {
    let backup = backup_path_for(source);
    if backup.exists() {
        log::info!("backup {} already exists, keeping it", backup.display());
        return Ok(backup);
    }
    if !source.is_file() {
        return Err(Error::NotFound {
            path: source.to_path_buf(),
        });
    }

    let temp = temp_sibling(&backup);
    let result = fs::copy(source, &temp).and_then(|_| fs::rename(&temp, &backup));
    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(Error::Io(e));
    }

    log::info!("backed up {} to {}", source.display(), backup.display());
    Ok(backup)
}

/// Deletes files and directory trees, skipping paths that do not exist.
///
/// Failures are logged and do not stop the remaining deletions. Returns the
/// paths that were actually removed.
pub fn clean_up<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let result = match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
            Ok(_) => fs::remove_file(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                log::debug!("removed {}", path.display());
                removed.push(path.to_path_buf());
            }
            Err(e) => log::warn!("could not remove {}: {e}", path.display()),
        }
    }
    removed
}

/// Writes `bytes` to a temporary sibling of `path` and renames it over
/// `path`.
///
/// # Errors
///
/// Returns an I/O error if writing or renaming fails; the temporary file is
/// removed in that case and `path` is untouched.
pub fn replace_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp = temp_sibling(path);
    let result = (|| -> io::Result<()> {
        let mut file = File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(Error::Io(e));
    }
    Ok(())
}

/// Registry of staging artifacts for one run.
///
/// Artifacts are deleted by [`finish`](Staging::finish) or, if the guard is
/// dropped without finishing (early return, panic), by `Drop`. Cleanup runs
/// exactly once.
#[derive(Debug, Default)]
pub struct Staging {
    artifacts: Vec<PathBuf>,
    discarded: Vec<PathBuf>,
    finished: bool,
}

impl Staging {
    /// Creates an empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a path for deletion. Registering the same path twice is a no-op.
    pub fn register(&mut self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        if !self.artifacts.contains(&path) {
            self.artifacts.push(path.clone());
        }
        path
    }

    /// Returns the registered artifacts in registration order.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Deletes a registered artifact now instead of at the end of the run.
    ///
    /// Returns false if `path` was not registered or could not be removed.
    pub fn discard(&mut self, path: &Path) -> bool {
        let Some(position) = self.artifacts.iter().position(|p| p == path) else {
            return false;
        };
        let path = self.artifacts.remove(position);
        let removed = clean_up(&[&path]);
        let done = !removed.is_empty();
        self.discarded.extend(removed);
        done
    }

    /// Deletes every registered artifact and returns the paths removed,
    /// including those discarded earlier.
    ///
    /// Artifacts are removed newest first, so files inside a registered
    /// directory go before the directory itself.
    pub fn finish(mut self) -> Vec<PathBuf> {
        self.run_cleanup()
    }

    fn run_cleanup(&mut self) -> Vec<PathBuf> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;
        let mut paths = std::mem::take(&mut self.artifacts);
        paths.reverse();
        let mut removed = std::mem::take(&mut self.discarded);
        removed.extend(clean_up(&paths));
        removed
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        self.run_cleanup();
    }
}
