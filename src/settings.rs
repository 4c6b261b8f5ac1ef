//! Persistent settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::util::Result;

/// Settings that persist between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Attribute dictionary holding animation keys.
    pub dictionary: String,
    /// Prefix of the editor title, followed by the component name.
    pub title_prefix: String,
    /// Decimals shown for the preview driver value (1-15).
    pub preview_precision: usize,
    /// Fold consecutive identical edits into one undo step.
    pub merge_scopes: bool,
    /// Number of steps the CLI samples across the animation range.
    pub sample_steps: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dictionary: "X-Plane".to_string(),
            title_prefix: "Animation: ".to_string(),
            preview_precision: 6,
            merge_scopes: true,
            sample_steps: 10,
        }
    }
}

const MAX_PRECISION: usize = 15;

impl Settings {
    /// Get settings file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("keyanim");
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the user config directory, falling back to defaults.
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default()
    }

    /// Load settings from a file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        Ok(settings.validated())
    }

    /// Save settings to the user config directory.
    pub fn save(&self) -> Result<()> {
        match Self::path() {
            Some(path) => self.save_to(&path),
            None => Err(crate::Error::other("no config directory")),
        }
    }

    /// Save settings to a file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Clamp out-of-range values.
    pub fn validated(mut self) -> Self {
        self.preview_precision = self.preview_precision.clamp(1, MAX_PRECISION);
        self.sample_steps = self.sample_steps.max(1);
        if self.dictionary.is_empty() {
            self.dictionary = Self::default().dictionary;
        }
        self
    }
}
