//! Stage spinner for pipeline runs.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use splashpatch::Stage;
use splashpatch::progress::{CancelFlag, StageObserver};

/// Shows the running stage on a single spinner line.
///
/// The spinner only advances on stage transitions, so prompts raised in the
/// middle of a stage are not drawn over.
pub struct StageSpinner {
    bar: ProgressBar,
    cancel: CancelFlag,
}

impl StageSpinner {
    /// Creates a spinner, hidden when `quiet`.
    pub fn new(cancel: CancelFlag, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            let style = ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            pb.set_style(style);
            pb
        };
        Self { bar, cancel }
    }

    /// Removes the spinner line.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl StageObserver for StageSpinner {
    fn on_stage_start(&mut self, stage: Stage, path: &Path) {
        let name = path
            .file_name()
            .unwrap_or(path.as_os_str())
            .to_string_lossy()
            .into_owned();
        self.bar.set_message(format!("{stage}: {name}"));
        self.bar.tick();
    }

    fn on_stage_complete(&mut self, stage: Stage, success: bool) {
        if !success {
            self.bar.set_message(format!("{stage}: failed"));
        }
        self.bar.tick();
    }

    fn on_warning(&mut self, message: &str) {
        self.bar
            .suspend(|| eprintln!("{}", console::style(format!("( WARN ) {message}")).yellow()));
    }

    fn should_cancel(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
