//! Interactive decisions the pipeline cannot make on its own.
//!
//! The library never talks to a terminal. When a run needs a human answer
//! it asks a [`Prompter`]; the CLI implements it with `dialoguer`, tests with
//! canned answers.

use std::path::Path;

use crate::Result;
use crate::codec::Compression;
use crate::editor::ArrayElement;

/// Answers questions raised during a pipeline run.
pub trait Prompter {
    /// Asks which compression a `.unityweb` file uses.
    ///
    /// Returning `None` aborts the run as an unknown format.
    fn choose_compression(&mut self, path: &Path) -> Result<Option<Compression>>;

    /// Asks which element of an array field to remove.
    ///
    /// Returning `None` removes nothing.
    fn choose_element(&mut self, field: &str, elements: &[ArrayElement]) -> Result<Option<usize>>;
}

/// A prompter that never answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

impl Prompter for NoPrompt {
    fn choose_compression(&mut self, _path: &Path) -> Result<Option<Compression>> {
        Ok(None)
    }

    fn choose_element(&mut self, _field: &str, _elements: &[ArrayElement]) -> Result<Option<usize>> {
        Ok(None)
    }
}

/// A prompter with fixed answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedAnswers {
    /// Answer to [`Prompter::choose_compression`].
    pub compression: Option<Compression>,
    /// Answer to [`Prompter::choose_element`].
    pub element: Option<usize>,
}

impl Prompter for FixedAnswers {
    fn choose_compression(&mut self, _path: &Path) -> Result<Option<Compression>> {
        Ok(self.compression)
    }

    fn choose_element(&mut self, _field: &str, _elements: &[ArrayElement]) -> Result<Option<usize>> {
        Ok(self.element)
    }
}
