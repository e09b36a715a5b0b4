//! Interactive CLI for splashpatch.

mod commands;
mod exit_codes;
mod output;
mod progress;
mod prompts;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use splashpatch::codec::CompressionLevel;
use splashpatch::config::Config;
use splashpatch::progress::CancelFlag;

use commands::Session;
use prompts::Action;

/// Remove the Unity splash screen or watermark from a player build
#[derive(Parser)]
#[command(name = "splashpatch")]
#[command(author, version, about = "Remove the Unity splash screen or watermark from a player build", long_about = None)]
pub struct Cli {
    /// File to patch on the first iteration (skips the file prompt once)
    path: Option<PathBuf>,

    /// Record editor helper program
    #[arg(long, env = "SPLASHPATCH_EDITOR")]
    editor: Option<PathBuf>,

    /// Argument passed to the record editor (repeatable)
    #[arg(long = "editor-arg", allow_hyphen_values = true)]
    editor_args: Vec<String>,

    /// Recompression level
    #[arg(long, short = 'l', value_enum)]
    level: Option<Level>,

    /// Name fragment identifying the Unity logo
    #[arg(long)]
    logo_pattern: Option<String>,

    /// Splash logo index removed when no logo name matches
    #[arg(long)]
    logo_index: Option<usize>,

    /// Suppress progress output
    #[arg(long, short = 'q')]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Level {
    Smallest,
    Optimal,
}

impl From<Level> for CompressionLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Smallest => CompressionLevel::Smallest,
            Level::Optimal => CompressionLevel::Optimal,
        }
    }
}

impl Cli {
    /// Layers the command line over the environment configuration.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(editor) = &self.editor {
            config.editor = Some(editor.clone());
        }
        if !self.editor_args.is_empty() {
            config.editor_args = self.editor_args.clone();
        }
        if let Some(level) = self.level {
            config.pipeline = config.pipeline.compression_level(level.into());
        }
        if let Some(pattern) = &self.logo_pattern {
            config.logo.name_pattern = Some(pattern.clone());
        }
        if self.logo_index.is_some() {
            config.logo.index = self.logo_index;
        }
        config
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    // The first Ctrl+C cancels the running patch at the next stage boundary,
    // a second one exits.
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            if cancel.is_cancelled() {
                eprintln!("\nInterrupted");
                std::process::exit(exit_codes::USER_INTERRUPT);
            }
            cancel.cancel();
        })
        .ok();
    }

    let config = cli.apply(Config::from_env());
    let Some(mut session) = Session::new(config, cli.quiet) else {
        output::failure("No record editor configured: pass --editor or set SPLASHPATCH_EDITOR");
        std::process::exit(exit_codes::BAD_ARGS);
    };

    output::banner();
    let mut first_path = cli.path;
    loop {
        let action = match prompts::main_menu() {
            Ok(action) => action,
            Err(e) => {
                output::failure(&e.to_string());
                break;
            }
        };
        if action == Action::Exit {
            break;
        }

        let path = match first_path.take() {
            Some(path) => path,
            None => match prompts::select_file(session.last_opened_dir()) {
                Ok(Some(path)) => path,
                Ok(None) => continue,
                Err(e) => {
                    output::failure(&e.to_string());
                    continue;
                }
            },
        };

        cancel.reset();
        session.run(&path, action, &cancel);
        println!();
    }

    std::process::exit(exit_codes::SUCCESS);
}
