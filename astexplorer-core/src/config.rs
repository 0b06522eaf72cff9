//! Explorer configuration.
//!
//! Layered lowest to highest: built-in defaults, `config.json` in the
//! platform config directory, then `ASTEXPLORER_*` environment variables.

use crate::error::ConfigError;
use crate::result::DEFAULT_INDENT;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ARTIFACT: &str = "./main.wasm";
pub const DEFAULT_ENTRY_POINT: &str = "__CADENCE_PARSE__";

pub const ENV_ARTIFACT: &str = "ASTEXPLORER_ARTIFACT";
pub const ENV_ENTRY_POINT: &str = "ASTEXPLORER_ENTRY_POINT";
pub const ENV_INDENT: &str = "ASTEXPLORER_INDENT";

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// File path or `http(s)://` URL. Relative paths resolve against the
    /// base directory handed to the loader.
    pub artifact: String,
    /// Export name of the parse entry point.
    pub entry_point: String,
    /// Spaces per nesting level in the rendered output.
    pub indent: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            artifact: DEFAULT_ARTIFACT.to_string(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            indent: DEFAULT_INDENT,
        }
    }
}

impl ExplorerConfig {
    /// Defaults, then the user config file (if any), then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match default_config_path() {
            Some(path) => Self::from_file_or_default(&path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Read `path`; a missing file yields the defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        serde_json::from_str(&text).map_err(|source| ConfigError::Invalid {
            path: path.display().to_string(),
            source,
        })
    }

    /// Overlay values found by `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(artifact) = lookup(ENV_ARTIFACT).filter(|v| !v.trim().is_empty()) {
            self.artifact = artifact;
        }
        if let Some(entry_point) = lookup(ENV_ENTRY_POINT).filter(|v| !v.trim().is_empty()) {
            self.entry_point = entry_point;
        }
        if let Some(indent) = lookup(ENV_INDENT) {
            self.indent = indent.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_INDENT,
                value: indent.clone(),
            })?;
        }
        Ok(())
    }
}

/// `<config dir>/astexplorer/config.json`, when the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "astexplorer").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
