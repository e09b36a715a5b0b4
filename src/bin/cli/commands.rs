//! Patching session driven by the interactive loop.

use std::path::{Path, PathBuf};

use splashpatch::config::{Config, LastOpened};
use splashpatch::editor::ProcessEditor;
use splashpatch::mutation::{LogoSelector, Mutation};
use splashpatch::pipeline::Pipeline;
use splashpatch::progress::CancelFlag;

use crate::output;
use crate::progress::StageSpinner;
use crate::prompts::{Action, DialoguerPrompter};

/// State kept across loop iterations.
pub struct Session {
    pipeline: Pipeline<ProcessEditor>,
    logo: LogoSelector,
    last_opened: LastOpened,
    quiet: bool,
}

impl Session {
    /// Builds a session, or `None` when no record editor is configured.
    pub fn new(config: Config, quiet: bool) -> Option<Self> {
        let program = config.editor?;
        let editor = ProcessEditor::new(program).args(config.editor_args);
        Some(Self {
            pipeline: Pipeline::with_options(editor, config.pipeline),
            logo: config.logo,
            last_opened: config.last_opened,
            quiet,
        })
    }

    /// Directory of the last file patched, for seeding the file prompt.
    pub fn last_opened_dir(&self) -> Option<PathBuf> {
        self.last_opened.load_dir()
    }

    fn mutation_for(&self, action: Action) -> Option<Mutation> {
        match action {
            Action::RemoveSplashScreen => Some(Mutation::RemoveSplashScreen(self.logo.clone())),
            Action::RemoveWatermark => Some(Mutation::RemoveWatermark),
            Action::Exit => None,
        }
    }

    /// Runs one patch and prints the outcome. Errors are reported, not
    /// returned.
    pub fn run(&mut self, path: &Path, action: Action, cancel: &CancelFlag) {
        let Some(mutation) = self.mutation_for(action) else {
            return;
        };

        output::info(&format!("Selected file: {}", path.display()));
        if let Err(e) = self.last_opened.save(path) {
            log::warn!("could not remember {}: {e}", path.display());
        }

        let mut spinner = StageSpinner::new(cancel.clone(), self.quiet);
        let result =
            self.pipeline
                .run_with_observer(path, &mutation, &mut DialoguerPrompter, &mut spinner);
        spinner.finish();

        match result {
            Ok(report) => println!("{}", output::format_report(&report)),
            Err(e) => output::failure(&output::format_error(&e)),
        }
    }
}
