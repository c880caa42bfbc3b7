//! Settings for the `dsearch` binary
//!
//! Loaded read-only from TOML. Values given on the command line or through
//! the environment override the file.

use crate::debounce::DEFAULT_DELAY;
use crate::error::{Error, Result};
use crate::query::SearchKey;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// How the filtered view is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    #[value(name = "jsonl")]
    JsonL,
}

/// User configurable settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Quiet period before a query settles, in milliseconds
    pub debounce_ms: u64,
    /// Field paths searched when none are given on the command line
    pub keys: Vec<String>,
    /// Output format
    pub format: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DELAY.as_millis() as u64,
            keys: Vec::new(),
            format: OutputFormat::Text,
        }
    }
}

impl Settings {
    /// `<config dir>/dsearch/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dsearch").join("config.toml"))
    }

    /// Parse the settings file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&contents).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Load an explicitly requested file, else the default file when it exists, else defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply values given on the command line or through the environment.
    pub fn apply_overrides(
        &mut self,
        debounce_ms: Option<u64>,
        format: Option<OutputFormat>,
        keys: &[String],
    ) {
        if let Some(debounce_ms) = debounce_ms {
            self.debounce_ms = debounce_ms;
        }
        if let Some(format) = format {
            self.format = format;
        }
        if !keys.is_empty() {
            self.keys = keys.to_vec();
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// The configured keys, or `None` when the file names none.
    pub fn search_key(&self) -> Result<Option<SearchKey>> {
        if self.keys.is_empty() {
            return Ok(None);
        }
        SearchKey::parse_all(&self.keys).map(Some)
    }
}
