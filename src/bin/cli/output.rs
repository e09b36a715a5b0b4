//! Output formatting for CLI operations.

use std::fs;
use std::path::Path;

use console::style;

use splashpatch::progress::{format_bytes_iec, format_duration};
use splashpatch::{Error, RunReport};

/// Prints the tool name and version.
pub fn banner() {
    println!(
        "{} v{}",
        style("splashpatch").bold().cyan(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
}

/// Prints an informational line.
pub fn info(message: &str) {
    println!("( INFO ) {message}");
}

/// Prints an error line.
pub fn failure(message: &str) {
    eprintln!("{} {message}", style("( ERR! )").red().bold());
}

/// Formats a pipeline error with its stage and file.
pub fn format_error(error: &Error) -> String {
    match error {
        Error::Stage {
            stage,
            path,
            source,
        } => match source.root() {
            Error::Cancelled => format!("Cancelled before {stage} ({})", path.display()),
            root => format!("{stage} failed for {}: {root}", path.display()),
        },
        other => other.to_string(),
    }
}

/// Formats the outcome of a successful run.
pub fn format_report(report: &RunReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Input: {}, target: {}\n",
        report.classification,
        report.target.display()
    ));
    if report.changed {
        output.push_str(&format!(
            "{} in {}",
            style("Patched").green().bold(),
            format_duration(report.elapsed)
        ));
        if let Some(backup) = &report.backup {
            let size = fs::metadata(backup).ok().map(|m| m.len());
            output.push_str(&describe_backup(backup, size));
        }
    } else {
        output.push_str(&format!("{}", style("Nothing to change").yellow()));
    }
    output
}

fn describe_backup(backup: &Path, size: Option<u64>) -> String {
    match size {
        Some(bytes) => format!(
            ", original kept at {} ({})",
            backup.display(),
            format_bytes_iec(bytes)
        ),
        None => format!(", original kept at {}", backup.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splashpatch::Stage;
    use std::path::PathBuf;

    #[test]
    fn test_format_stage_error_shows_root() {
        let err = Error::TargetNotFound {
            directory: PathBuf::from("WebGL"),
            candidates: vec!["data.unity3d".into()],
        }
        .at_stage(Stage::ResolveTarget, "WebGL");
        assert_eq!(
            format_error(&err),
            "resolve-target failed for WebGL: No target asset (data.unity3d) found in WebGL"
        );
    }

    #[test]
    fn test_format_cancelled() {
        let err = Error::Cancelled.at_stage(Stage::Repack, "WebGL.data");
        assert_eq!(format_error(&err), "Cancelled before repack (WebGL.data)");
    }

    #[test]
    fn test_backup_size_is_human_readable() {
        let backup = Path::new("WebGL.data.br.bak");
        assert_eq!(
            describe_backup(backup, Some(3 * 1024 * 1024)),
            ", original kept at WebGL.data.br.bak (3.0 MiB)"
        );
        assert_eq!(
            describe_backup(backup, None),
            ", original kept at WebGL.data.br.bak"
        );
    }
}
