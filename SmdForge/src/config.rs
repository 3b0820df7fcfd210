//! Persisted settings
//!
//! Stored as JSON at `<config dir>/SmdForge/config.json`. Missing or
//! unreadable files fall back to defaults; missing fields take their
//! defaults individually.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::converter::{BatchOptions, Direction, Variant};
use crate::error::Result;
use crate::utils::expand_tilde;

fn default_true() -> bool {
    true
}

/// User settings shared by every batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Variant used when a command does not name one
    #[serde(default)]
    pub default_variant: Variant,
    /// Directory for failure logs; `~` expands to the home directory
    #[serde(default)]
    pub error_log_dir: Option<String>,
    /// Convert batch files in parallel
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// End a batch at its first failure
    #[serde(default)]
    pub stop_on_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_variant: Variant::default(),
            error_log_dir: None,
            parallel: true,
            stop_on_error: false,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("SmdForge").join("config.json"))
    }

    /// Load config from disk, or return default
    pub fn load() -> Self {
        Self::config_path()
            .filter(|path| path.exists())
            .and_then(|path| match Self::load_from(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("Ignoring config {}: {e}", path.display());
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Load config from a specific file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        match Self::config_path() {
            Some(path) => self.save_to(path),
            None => {
                tracing::warn!("No config directory on this platform, settings not saved");
                Ok(())
            }
        }
    }

    /// Save config to a specific file
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Expanded failure-log directory
    pub fn error_log_path(&self) -> Option<PathBuf> {
        self.error_log_dir
            .as_deref()
            .filter(|dir| !dir.is_empty())
            .map(expand_tilde)
    }

    /// Batch options for this config's defaults
    pub fn batch_options(&self, direction: Direction) -> BatchOptions {
        BatchOptions::new(self.default_variant, direction)
            .with_parallel(self.parallel)
            .with_stop_on_error(self.stop_on_error)
            .with_error_log_dir(self.error_log_path())
    }
}
