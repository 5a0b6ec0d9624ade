//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional user defaults, read from `~/.config/pricer/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Server URL used by `query` when `--api-url` is not given
    pub api_url: Option<String>,
    /// Bundle used by `predict` and `inspect` when `--model` is not given
    pub model_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the user config file, if present
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Resolve the model path from a flag, then the config file
    pub fn model_path(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        flag.or_else(|| self.model_path.clone())
            .context("No model path given; pass --model or set model_path in the config file")
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("pricer").join("config.json"))
    }
}
