//! The record edits this crate knows how to make.
//!
//! Both mutations are idempotent: if the flags already hold the target
//! values they report [`MutationOutcome::NoChange`] and nothing is written.

use std::fmt;

use crate::editor::{ArrayElement, RecordClass, RecordEditor};
use crate::prompt::Prompter;
use crate::{Error, Result};

/// `BuildSettings` flag that hides the splash screen when set.
pub const HAS_PRO_VERSION: &str = "hasPROVersion";
/// `PlayerSettings` flag that shows the Unity logo.
pub const SHOW_UNITY_SPLASH_LOGO: &str = "m_ShowUnitySplashLogo";
/// `PlayerSettings` array of splash logos.
pub const SPLASH_SCREEN_LOGOS: &str = "m_SplashScreenLogos.Array";
/// `BuildSettings` flag that removes the watermark.
pub const IS_NO_WATERMARK_BUILD: &str = "isNoWatermarkBuild";
/// `BuildSettings` flag that marks a trial build.
pub const IS_TRIAL: &str = "isTrial";

/// Logo name fragment matched when no other pattern is configured.
pub const DEFAULT_LOGO_PATTERN: &str = "unity";

/// How the Unity logo is picked out of the splash logo array.
///
/// The first element whose name contains `name_pattern` (ignoring case)
/// wins. Without a match, `index` is used; without an index the
/// [`Prompter`] is asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoSelector {
    /// Name fragment identifying the Unity logo. `None` disables matching.
    pub name_pattern: Option<String>,
    /// Explicit element index used when no name matches.
    pub index: Option<usize>,
}

impl Default for LogoSelector {
    fn default() -> Self {
        Self {
            name_pattern: Some(DEFAULT_LOGO_PATTERN.to_string()),
            index: None,
        }
    }
}

impl LogoSelector {
    /// Selects by explicit index only.
    pub fn at_index(index: usize) -> Self {
        Self {
            name_pattern: None,
            index: Some(index),
        }
    }

    /// Resolves which element to remove.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelection`] if the configured or prompted
    /// index is out of range.
    pub fn select<P: Prompter + ?Sized>(
        &self,
        elements: &[ArrayElement],
        prompter: &mut P,
    ) -> Result<Option<usize>> {
        if let Some(pattern) = self.name_pattern.as_deref().filter(|p| !p.is_empty()) {
            if let Some(position) = elements.iter().position(|e| e.name_contains(pattern)) {
                return Ok(Some(position));
            }
        }

        let chosen = match self.index {
            Some(index) => Some(index),
            None => prompter.choose_element(SPLASH_SCREEN_LOGOS, elements)?,
        };
        match chosen {
            Some(index) if index >= elements.len() => Err(Error::InvalidSelection {
                field: SPLASH_SCREEN_LOGOS.to_string(),
                index,
                len: elements.len(),
            }),
            other => Ok(other),
        }
    }
}

/// A record edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Hide the Unity splash screen and drop the Unity logo.
    RemoveSplashScreen(LogoSelector),
    /// Clear the trial watermark.
    RemoveWatermark,
}

impl Mutation {
    /// Returns a short human-readable description.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RemoveSplashScreen(_) => "remove splash screen",
            Self::RemoveWatermark => "remove watermark",
        }
    }

    /// Applies the edit through `editor`, which must have a file open.
    pub fn apply<E, P>(&self, editor: &mut E, prompter: &mut P) -> Result<MutationOutcome<E::Replacer>>
    where
        E: RecordEditor,
        P: Prompter + ?Sized,
    {
        match self {
            Self::RemoveSplashScreen(selector) => remove_splash_screen(editor, selector, prompter),
            Self::RemoveWatermark => remove_watermark(editor),
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of applying a [`Mutation`].
#[derive(Debug)]
pub enum MutationOutcome<R> {
    /// The flags already held their target values.
    NoChange,
    /// Records were committed; the replacers must be written back.
    Changed(Vec<R>),
}

impl<R> MutationOutcome<R> {
    /// Returns true if anything was committed.
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

fn remove_splash_screen<E, P>(
    editor: &mut E,
    selector: &LogoSelector,
    prompter: &mut P,
) -> Result<MutationOutcome<E::Replacer>>
where
    E: RecordEditor,
    P: Prompter + ?Sized,
{
    let build = editor.locate(RecordClass::BuildSettings)?;
    let mut build_fields = editor.base_fields(&build)?;
    let player = editor.locate(RecordClass::PlayerSettings)?;
    let mut player_fields = editor.base_fields(&player)?;

    let has_pro = editor.read_bool(&build_fields, HAS_PRO_VERSION)?;
    let show_logo = editor.read_bool(&player_fields, SHOW_UNITY_SPLASH_LOGO)?;
    if has_pro && !show_logo {
        log::warn!("Unity splash screen already removed");
        return Ok(MutationOutcome::NoChange);
    }

    let logos = editor.array_elements(&player_fields, SPLASH_SCREEN_LOGOS)?;
    log::info!("{} splash screen logo(s) found", logos.len());
    for logo in &logos {
        log::debug!(
            "  {} => {}",
            logo.index,
            logo.name.as_deref().unwrap_or("<unnamed>")
        );
    }
    if logos.is_empty() {
        log::warn!("no splash screen logos, nothing to do");
        return Ok(MutationOutcome::NoChange);
    }

    let selected = selector.select(&logos, prompter)?;

    log::info!("setting {HAS_PRO_VERSION} = true, {SHOW_UNITY_SPLASH_LOGO} = false");
    editor.write_bool(&mut build_fields, HAS_PRO_VERSION, true)?;
    editor.write_bool(&mut player_fields, SHOW_UNITY_SPLASH_LOGO, false)?;

    match selected {
        Some(position) => {
            let index = logos[position].index;
            editor.remove_array_element(&mut player_fields, SPLASH_SCREEN_LOGOS, index)?;
            log::info!("removed splash screen logo at index {index}");
        }
        None => log::warn!("Unity logo not identified, only the splash flags were changed"),
    }

    let player_replacer = editor.commit(&player, player_fields)?;
    let build_replacer = editor.commit(&build, build_fields)?;
    Ok(MutationOutcome::Changed(vec![player_replacer, build_replacer]))
}

fn remove_watermark<E: RecordEditor>(editor: &mut E) -> Result<MutationOutcome<E::Replacer>> {
    let build = editor.locate(RecordClass::BuildSettings)?;
    let mut fields = editor.base_fields(&build)?;

    let no_watermark = editor.read_bool(&fields, IS_NO_WATERMARK_BUILD)?;
    let is_trial = editor.read_bool(&fields, IS_TRIAL)?;
    if no_watermark && !is_trial {
        log::warn!("watermark already removed");
        return Ok(MutationOutcome::NoChange);
    }

    log::info!("setting {IS_NO_WATERMARK_BUILD} = true, {IS_TRIAL} = false");
    editor.write_bool(&mut fields, IS_NO_WATERMARK_BUILD, true)?;
    editor.write_bool(&mut fields, IS_TRIAL, false)?;
    let replacer = editor.commit(&build, fields)?;
    Ok(MutationOutcome::Changed(vec![replacer]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{FixedAnswers, NoPrompt};

    fn logos(names: &[Option<&str>]) -> Vec<ArrayElement> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| ArrayElement {
                index,
                name: name.map(str::to_string),
            })
            .collect()
    }

    #[test]
    fn test_name_match_wins_over_index() {
        let elements = logos(&[Some("StudioLogo"), Some("UnityLogo")]);
        let selector = LogoSelector {
            index: Some(0),
            ..LogoSelector::default()
        };
        assert_eq!(selector.select(&elements, &mut NoPrompt).unwrap(), Some(1));
    }

    #[test]
    fn test_index_used_without_match() {
        let elements = logos(&[Some("StudioLogo"), None]);
        let selector = LogoSelector {
            index: Some(1),
            ..LogoSelector::default()
        };
        assert_eq!(selector.select(&elements, &mut NoPrompt).unwrap(), Some(1));
    }

    #[test]
    fn test_prompter_consulted_last() {
        let elements = logos(&[None, None, None]);
        let mut prompter = FixedAnswers {
            element: Some(2),
            ..FixedAnswers::default()
        };
        let selected = LogoSelector::default()
            .select(&elements, &mut prompter)
            .unwrap();
        assert_eq!(selected, Some(2));
    }

    #[test]
    fn test_no_match_no_answer_selects_nothing() {
        let elements = logos(&[Some("StudioLogo")]);
        assert_eq!(
            LogoSelector::default()
                .select(&elements, &mut NoPrompt)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_out_of_range_index() {
        let elements = logos(&[None]);
        let err = LogoSelector::at_index(3)
            .select(&elements, &mut NoPrompt)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidSelection {
                index: 3,
                len: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_pattern_disables_matching() {
        let elements = logos(&[Some("UnityLogo")]);
        let selector = LogoSelector {
            name_pattern: Some(String::new()),
            index: None,
        };
        assert_eq!(selector.select(&elements, &mut NoPrompt).unwrap(), None);
    }
}
