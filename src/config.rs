//! Application configuration.
//!
//! Stored as TOML at `<data dir>/config.toml`. A missing file yields the
//! defaults.

use crate::audio::{CueTemplate, NarrationConfig};
use crate::workouts::{FrontMatterPolicy, MetadataNotation, ParserOptions, SequencerSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Document parsing settings
    pub parser: ParserConfig,
    /// Sequencer timing settings
    pub playback: PlaybackConfig,
    /// Speech settings
    pub narration: NarrationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            parser: ParserConfig::default(),
            playback: PlaybackConfig::default(),
            narration: NarrationConfig::default(),
        }
    }
}

/// Document parsing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// `strict` requires the `---` front-matter block
    pub front_matter: FrontMatterPolicy,
    /// How the front matter is decoded
    pub metadata: MetadataNotation,
}

impl ParserConfig {
    pub fn options(&self) -> ParserOptions {
        ParserOptions {
            front_matter: self.front_matter,
            metadata: self.metadata,
        }
    }
}

/// Sequencer timing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Added to an exercise's duration before it completes
    pub completion_buffer_ms: u64,
    /// Between the end narration and the advance
    pub end_delay_ms: u64,
    /// Multiplier on every timer delay
    pub time_scale: f64,
    /// Seed for motivation selection; entropy when absent
    pub motivation_seed: Option<u64>,
    /// Announcement when entering circuit N; `{number}` is replaced
    pub circuit_announcement: String,
    /// Further announcements picked at random alongside the main one
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub circuit_announcement_alternatives: Vec<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            completion_buffer_ms: 1000,
            end_delay_ms: 1000,
            time_scale: 1.0,
            motivation_seed: None,
            circuit_announcement: crate::audio::cues::CIRCUIT_ANNOUNCEMENT.to_string(),
            circuit_announcement_alternatives: Vec::new(),
        }
    }
}

impl From<&PlaybackConfig> for SequencerSettings {
    fn from(config: &PlaybackConfig) -> Self {
        let time_scale = if config.time_scale.is_finite() && config.time_scale > 0.0 {
            config.time_scale
        } else {
            tracing::warn!("Invalid time_scale {}, using 1.0", config.time_scale);
            1.0
        };

        Self {
            completion_buffer: Duration::from_millis(config.completion_buffer_ms),
            end_delay: Duration::from_millis(config.end_delay_ms),
            time_scale,
            circuit_announcement: CueTemplate::with_alternatives(
                config.circuit_announcement.clone(),
                config.circuit_announcement_alternatives.clone(),
            ),
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "coachvoice", "CoachVoice")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config = load_config_from(&get_config_path())?;
    config.data_dir = get_data_dir();
    Ok(config)
}

/// Load application configuration from `path`.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Save application configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save application configuration to `path`.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    tracing::info!("Saved configuration to {}", path.display());
    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
