//! Environment configuration and persisted state.
//!
//! The only state kept between sessions is `last_open.txt`, a single
//! `last_opened=<path>` line used to seed the next file prompt. Everything
//! else comes from the environment:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `SPLASHPATCH_EDITOR` | Record editor helper program |
//! | `SPLASHPATCH_EDITOR_ARGS` | Whitespace-separated helper arguments |
//! | `SPLASHPATCH_TARGETS` | Comma-separated target file names, in priority order |
//! | `SPLASHPATCH_LEVEL` | `smallest` or `optimal` |
//! | `SPLASHPATCH_LOGO_PATTERN` | Name fragment identifying the Unity logo |
//! | `SPLASHPATCH_STATE_FILE` | Location of the last-opened record |

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::codec::CompressionLevel;
use crate::mutation::LogoSelector;
use crate::pipeline::PipelineOptions;

/// Default file name of the last-opened record.
pub const LAST_OPEN_FILE: &str = "last_open.txt";

const LAST_OPENED_KEY: &str = "last_opened=";

/// Record editor helper program.
pub const EDITOR_ENV: &str = "SPLASHPATCH_EDITOR";
/// Helper program arguments.
pub const EDITOR_ARGS_ENV: &str = "SPLASHPATCH_EDITOR_ARGS";
/// Target file names.
pub const TARGETS_ENV: &str = "SPLASHPATCH_TARGETS";
/// Recompression level.
pub const LEVEL_ENV: &str = "SPLASHPATCH_LEVEL";
/// Logo name fragment.
pub const LOGO_PATTERN_ENV: &str = "SPLASHPATCH_LOGO_PATTERN";
/// Last-opened record location.
pub const STATE_FILE_ENV: &str = "SPLASHPATCH_STATE_FILE";

/// The most recently selected input, persisted across sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastOpened {
    file: PathBuf,
}

impl Default for LastOpened {
    fn default() -> Self {
        Self::at(LAST_OPEN_FILE)
    }
}

impl LastOpened {
    /// Uses the record stored at `file`.
    pub fn at(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    /// Returns the record's location.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Returns the stored path, if the record exists and holds one.
    ///
    /// Read failures are logged and treated as "nothing stored".
    pub fn load(&self) -> Option<PathBuf> {
        match fs::read_to_string(&self.file) {
            Ok(contents) => parse_last_opened(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("cannot read {}: {e}", self.file.display());
                None
            }
        }
    }

    /// Returns the directory of the stored path.
    pub fn load_dir(&self) -> Option<PathBuf> {
        self.load()
            .and_then(|path| path.parent().map(Path::to_path_buf))
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    /// Stores `path`, replacing any previous record.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(
            &self.file,
            format!("{LAST_OPENED_KEY}{}\n", path.display()),
        )?;
        log::debug!("remembered {}", path.display());
        Ok(())
    }
}

fn parse_last_opened(contents: &str) -> Option<PathBuf> {
    contents
        .lines()
        .find_map(|line| line.strip_prefix(LAST_OPENED_KEY))
        .map(str::trim_end)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Parses a compression level name.
///
/// ```rust
/// use splashpatch::codec::CompressionLevel;
/// use splashpatch::config::parse_level;
///
/// assert_eq!(parse_level("Optimal"), Some(CompressionLevel::Optimal));
/// assert_eq!(parse_level("fast"), None);
/// ```
pub fn parse_level(value: &str) -> Option<CompressionLevel> {
    match value.trim().to_ascii_lowercase().as_str() {
        "smallest" => Some(CompressionLevel::Smallest),
        "optimal" => Some(CompressionLevel::Optimal),
        _ => None,
    }
}

/// Settings for one tool session.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Record editor helper program.
    pub editor: Option<PathBuf>,
    /// Arguments passed to the helper.
    pub editor_args: Vec<String>,
    /// Pipeline settings.
    pub pipeline: PipelineOptions,
    /// Splash logo selection.
    pub logo: LogoSelector,
    /// Last-opened record.
    pub last_opened: LastOpened,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// Unrecognized values are logged and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(editor) = get(EDITOR_ENV) {
            config.editor = Some(PathBuf::from(editor));
        }
        if let Some(args) = get(EDITOR_ARGS_ENV) {
            config.editor_args = args.split_whitespace().map(str::to_string).collect();
        }
        if let Some(targets) = get(TARGETS_ENV) {
            let names: Vec<String> = targets
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            config.pipeline = config.pipeline.target_names(names);
        }
        if let Some(level) = get(LEVEL_ENV) {
            match parse_level(&level) {
                Some(level) => config.pipeline = config.pipeline.compression_level(level),
                None => log::warn!("ignoring {LEVEL_ENV}={level}: expected smallest or optimal"),
            }
        }
        if let Some(pattern) = get(LOGO_PATTERN_ENV) {
            config.logo.name_pattern = Some(pattern);
        }
        if let Some(state) = get(STATE_FILE_ENV) {
            config.last_opened = LastOpened::at(state);
        }
        config
    }
}
