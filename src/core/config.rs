//! Configuration management.
//!
//! Handles loading and saving configuration from a TOML file in the
//! platform config directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AI gateway settings
    pub ai: AiConfig,

    /// UI settings
    pub ui: UiConfig,
}

/// AI gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Model used for the text generation steps
    pub text_model: String,

    /// Model used for the rendering step
    pub image_model: String,

    /// API base URL (override for proxies and testing)
    pub base_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "imagen-4.0-generate-001".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

/// UI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Accent color override (hex format: "#RRGGBB")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,

    /// Whether to show the key hints in the footer
    pub show_help: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { accent: None, show_help: true }
    }
}

impl Config {
    /// Path of the config file.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("solarplan").join("config.toml"))
    }

    /// Load the config file, falling back to defaults when it is missing.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Write the config file, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::path().context("could not determine the config directory")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ai.text_model, "gemini-2.5-flash");
        assert!(config.ui.show_help);
        assert!(config.ui.accent.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str("[ai]\ntext_model = \"gemini-2.0-flash\"\n").unwrap();
        assert_eq!(config.ai.text_model, "gemini-2.0-flash");
        assert_eq!(config.ai.image_model, "imagen-4.0-generate-001");
        assert!(config.ui.show_help);
    }

    #[test]
    fn test_round_trip() {
        let mut config = Config::default();
        config.ui.accent = Some("#AAFF00".to_string());

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.ui.accent.as_deref(), Some("#AAFF00"));
    }
}
