use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HighlightError, Result};

/// Fraction of a word's pixels that must be highlighted before the word counts
pub const DEFAULT_RATIO_THRESHOLD: f64 = 0.3;

/// Classification options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Minimum mask coverage, in (0, 1]. A word qualifies only when its
    /// coverage is strictly greater than this value.
    pub ratio_threshold: f64,
}

impl HighlightConfig {
    pub fn new() -> Self {
        Self {
            ratio_threshold: DEFAULT_RATIO_THRESHOLD,
        }
    }

    pub fn with_ratio_threshold(mut self, ratio_threshold: f64) -> Self {
        self.ratio_threshold = ratio_threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let t = self.ratio_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(HighlightError::InvalidConfig(format!(
                "ratio_threshold must be in (0, 1], got {}",
                t
            )));
        }
        Ok(())
    }

    /// Load a JSON config file, e.g. `{ "ratio_threshold": 0.4 }`
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: HighlightConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self::new()
    }
}
