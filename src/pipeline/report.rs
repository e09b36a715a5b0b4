//! Run reports.

use std::path::PathBuf;
use std::time::Duration;

use crate::format::detect::Classification;

/// Summary of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct RunReport {
    /// What the input was detected as.
    pub classification: Classification,
    /// The record file the mutation ran against.
    pub target: PathBuf,
    /// Whether anything was written.
    pub changed: bool,
    /// The backup of the input, when a change was written.
    pub backup: Option<PathBuf>,
    /// Staging artifacts removed at the end of the run.
    pub cleaned: Vec<PathBuf>,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl RunReport {
    pub(crate) fn new(classification: Classification, target: PathBuf) -> Self {
        Self {
            classification,
            target,
            changed: false,
            backup: None,
            cleaned: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }
}
