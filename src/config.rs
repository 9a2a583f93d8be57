//! Persistent settings: presets, the last applied preset and the restore
//! retry policy.
//!
//! Stored as JSON with PascalCase keys. Unknown keys are ignored so older
//! files with extra fields still load.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::preset::{AnimationKind, Preset};

/// Name of the preset written into a fresh config file.
pub const DEFAULT_PRESET_NAME: &str = "Default";

/// Rainbow used by the default preset.
pub const DEFAULT_PRESET_COLORS: [&str; 8] = [
    "0xff0000", "0xff8000", "0xffff00", "0x00ff00", "0x00ffff", "0x0000ff", "0x8000ff", "0xff00ff",
];

pub const DEFAULT_RETRY_COUNT: i64 = 5;
pub const DEFAULT_RETRY_DELAY_SECONDS: i64 = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Validation(String),
}

fn default_last_preset_name() -> Option<String> {
    Some(DEFAULT_PRESET_NAME.to_string())
}

fn default_retry_count() -> i64 {
    DEFAULT_RETRY_COUNT
}

fn default_retry_delay_seconds() -> i64 {
    DEFAULT_RETRY_DELAY_SECONDS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppConfig {
    #[serde(default = "default_last_preset_name")]
    pub last_preset_name: Option<String>,
    /// Stored as written; clamped by [`AppConfig::retry_attempts`]
    #[serde(default = "default_retry_count")]
    pub retry_count: i64,
    /// Stored as written; clamped by [`AppConfig::retry_delay`]
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: i64,
    #[serde(default)]
    pub presets: Vec<Preset>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_preset_name: default_last_preset_name(),
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay_seconds: DEFAULT_RETRY_DELAY_SECONDS,
            presets: vec![Preset::new(
                DEFAULT_PRESET_NAME,
                DEFAULT_PRESET_COLORS,
                AnimationKind::Static,
            )],
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check preset names
    ///
    /// Retry values are not checked here; out-of-range values are clamped
    /// when read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, preset) in self.presets.iter().enumerate() {
            if preset.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "preset #{} has an empty name",
                    i + 1
                )));
            }
            let duplicate = self.presets[..i]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&preset.name));
            if duplicate {
                return Err(ConfigError::Validation(format!(
                    "duplicate preset name '{}'",
                    preset.name
                )));
            }
        }

        Ok(())
    }

    /// Case-insensitive preset lookup
    pub fn find_preset(&self, name: &str) -> Option<&Preset> {
        let name = name.trim();
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// The preset recorded by the last successful apply, if it still exists
    pub fn last_preset(&self) -> Option<&Preset> {
        self.last_preset_name
            .as_deref()
            .and_then(|name| self.find_preset(name))
    }

    /// Number of restore attempts, never less than one
    pub fn retry_attempts(&self) -> u32 {
        self.retry_count.clamp(1, u32::MAX as i64) as u32
    }

    /// Delay between restore attempts, never less than a second
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds.max(1) as u64)
    }
}

/// Path to the default config file.
pub fn default_config_path() -> PathBuf {
    dirs_path().join("config.json")
}

fn dirs_path() -> PathBuf {
    if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(config).join("framework-rgb")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".config/framework-rgb")
    } else {
        PathBuf::from("/tmp/framework-rgb")
    }
}

/// Config file on disk
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the config, writing the default first if the file
    /// does not exist yet.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.path.exists() {
            let config = AppConfig::default();
            self.save(&config)?;
            info!("Created default config at {}", self.path.display());
            return Ok(config);
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        let config = AppConfig::from_json(&content).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        config.validate()?;

        debug!(
            "Loaded {} presets from {}",
            config.presets.len(),
            self.path.display()
        );
        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = config.to_json().map_err(|e| write_err(e.into()))?;
        std::fs::write(&self.path, json).map_err(write_err)
    }
}
