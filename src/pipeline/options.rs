//! Pipeline options.

use crate::codec::CompressionLevel;
use crate::format::DEFAULT_TARGET_NAMES;

/// Options controlling a pipeline run.
///
/// # Example
///
/// ```rust
/// use splashpatch::codec::CompressionLevel;
/// use splashpatch::pipeline::PipelineOptions;
///
/// let options = PipelineOptions::new()
///     .target_names(["globalgamemanagers"])
///     .compression_level(CompressionLevel::Optimal);
/// assert_eq!(options.targets(), ["globalgamemanagers"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    target_names: Vec<String>,
    compression_level: CompressionLevel,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            target_names: DEFAULT_TARGET_NAMES.iter().map(|n| n.to_string()).collect(),
            compression_level: CompressionLevel::default(),
        }
    }
}

impl PipelineOptions {
    /// Creates the default options: `data.unity3d` then `globalgamemanagers`,
    /// strongest recompression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the file names tried inside an unpacked container, in priority
    /// order.
    pub fn target_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the level used when recompressing.
    pub fn compression_level(mut self, level: CompressionLevel) -> Self {
        self.compression_level = level;
        self
    }

    /// Returns the target file names.
    pub fn targets(&self) -> &[String] {
        &self.target_names
    }

    /// Returns the recompression level.
    pub fn level(&self) -> CompressionLevel {
        self.compression_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PipelineOptions::default();
        assert_eq!(options.targets(), ["data.unity3d", "globalgamemanagers"]);
        assert_eq!(options.level(), CompressionLevel::Smallest);
    }
}
