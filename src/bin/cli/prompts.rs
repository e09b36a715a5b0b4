//! Terminal prompts.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use std::io;
use std::path::{Path, PathBuf};

use splashpatch::codec::Compression;
use splashpatch::editor::ArrayElement;
use splashpatch::prompt::Prompter;

/// What the user picked from the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RemoveSplashScreen,
    RemoveWatermark,
    Exit,
}

fn prompt_error(e: dialoguer::Error) -> splashpatch::Error {
    splashpatch::Error::Io(io::Error::from(e))
}

/// Shows the main menu.
pub fn main_menu() -> splashpatch::Result<Action> {
    let items = &["Remove Unity splash screen", "Remove watermark", "Exit"];
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("What do you want to do?")
        .items(items)
        .default(0)
        .interact_opt()
        .map_err(prompt_error)?;

    Ok(match selection {
        Some(0) => Action::RemoveSplashScreen,
        Some(1) => Action::RemoveWatermark,
        _ => Action::Exit,
    })
}

/// Asks for the file to patch, starting from `seed`.
///
/// An empty answer goes back to the menu.
pub fn select_file(seed: Option<PathBuf>) -> splashpatch::Result<Option<PathBuf>> {
    let theme = ColorfulTheme::default();
    let mut input = Input::<String>::with_theme(&theme)
        .with_prompt("Path to globalgamemanagers, data.unity3d or a WebGL *.data[.br|.gz|.unityweb]")
        .allow_empty(true);
    if let Some(seed) = seed {
        let mut text = seed.display().to_string();
        text.push(std::path::MAIN_SEPARATOR);
        input = input.with_initial_text(text);
    }

    let answer = input.interact_text().map_err(prompt_error)?;
    Ok(clean_path(&answer))
}

/// Trims whitespace and the quotes file managers add when dragging a file
/// into a terminal.
fn clean_path(answer: &str) -> Option<PathBuf> {
    let trimmed = answer.trim().trim_matches(|c| c == '"' || c == '\'');
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

/// Variants this build can decompress, in menu order.
fn offered_compressions() -> Vec<Compression> {
    Compression::ALL
        .into_iter()
        .filter(|c| c.is_available())
        .collect()
}

/// Answers pipeline questions with terminal menus.
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn choose_compression(&mut self, path: &Path) -> splashpatch::Result<Option<Compression>> {
        let offered = offered_compressions();
        let mut items: Vec<String> = offered.iter().map(|c| c.to_string()).collect();
        items.push("Neither".to_string());

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Which compression does {} use?",
                path.file_name().unwrap_or(path.as_os_str()).to_string_lossy()
            ))
            .items(&items)
            .default(0)
            .interact_opt()
            .map_err(prompt_error)?;

        Ok(selection.and_then(|i| offered.get(i).copied()))
    }

    fn choose_element(
        &mut self,
        field: &str,
        elements: &[ArrayElement],
    ) -> splashpatch::Result<Option<usize>> {
        let mut items: Vec<String> = elements
            .iter()
            .map(|e| format!("{}: {}", e.index, e.name.as_deref().unwrap_or("<unnamed>")))
            .collect();
        items.push("None of these".to_string());

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Which entry of {field} is the Unity logo?"))
            .items(&items)
            .default(0)
            .interact_opt()
            .map_err(prompt_error)?;

        Ok(selection.filter(|&i| i < elements.len()))
    }
}
