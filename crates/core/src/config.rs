//! Application configuration.
//!
//! Layered the usual way: built-in defaults, then an optional
//! `config.toml` in the app's config directory, then `QEIDTUI_*`
//! environment variables.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::store::MatchStore;

/// User-tunable application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the match save, rating counter, offline
    /// queue, and instance id.
    pub data_root: PathBuf,
    /// Name of the ruleset preset to score under.
    pub rules_preset: String,
    /// Base URL of the analytics/support backend.
    pub backend_url: String,
    /// Whether to talk to the backend at all. Off by default.
    pub backend_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_root: MatchStore::default_root(),
            rules_preset: "modern".to_string(),
            backend_url: "https://api.qeid.example.com/v1".to_string(),
            backend_enabled: false,
        }
    }
}

/// Path of the configuration file.
pub fn config_path() -> PathBuf {
    MatchStore::default_root().join("config.toml")
}

/// Write a commented default configuration file when none exists yet.
pub fn ensure_default_config() -> Result<()> {
    let path = config_path();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let defaults = AppConfig::default();
    let contents = format!(
        "# Qeid TUI configuration.\n\
         # Values can also be set via QEIDTUI_* environment variables.\n\n\
         # Where match state and counters are stored.\n\
         data_root = \"{}\"\n\n\
         # Scoring preset: \"modern\" or \"classic\".\n\
         rules_preset = \"{}\"\n\n\
         # Anonymous usage reporting and support tickets.\n\
         backend_enabled = false\n\
         backend_url = \"{}\"\n",
        defaults.data_root.display(),
        defaults.rules_preset,
        defaults.backend_url,
    );
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
}

impl AppConfig {
    /// Load the layered configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    fn load_from(path: PathBuf) -> Result<Self> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("data_root", defaults.data_root.display().to_string())?
            .set_default("rules_preset", defaults.rules_preset)?
            .set_default("backend_url", defaults.backend_url)?
            .set_default("backend_enabled", defaults.backend_enabled)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("QEIDTUI"))
            .build()
            .context("failed to load configuration")?;
        settings
            .try_deserialize()
            .context("configuration is invalid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "rules_preset = \"classic\"\nbackend_enabled = true\n").unwrap();
        let config = AppConfig::load_from(path).unwrap();
        assert_eq!(config.rules_preset, "classic");
        assert!(config.backend_enabled);
        // Untouched keys keep their defaults.
        assert_eq!(config.data_root, MatchStore::default_root());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_from(dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.rules_preset, "modern");
        assert!(!config.backend_enabled);
    }
}
