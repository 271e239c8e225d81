/// CLI configuration
use encore_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "encore.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EncoreConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub player: PlayerSettings,

    #[serde(default)]
    pub auth: AuthSettings,
}

/// Which backend the commands talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Hosted backend over HTTP
    Remote,
    /// Throwaway in-memory backend with a demo account
    #[default]
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackendSettings {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub mode: BackendMode,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerSettings {
    #[serde(default = "default_volume")]
    pub volume: f32,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_restart_threshold_secs")]
    pub restart_threshold_secs: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

impl EncoreConfig {
    /// Load from `path` (or `encore.toml` when present) and `ENCORE_*` variables
    ///
    /// Nested keys use a double underscore: `ENCORE_BACKEND__API_KEY`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("ENCORE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.backend.mode == BackendMode::Remote {
            if self.backend.url.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::Invalid(
                    "backend.url is required in remote mode (set ENCORE_BACKEND__URL)".to_string(),
                ));
            }
            if self.backend.api_key.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::Invalid(
                    "backend.api_key is required in remote mode (set ENCORE_BACKEND__API_KEY)"
                        .to_string(),
                ));
            }
        }

        if !(0.0..=1.0).contains(&self.player.volume) {
            return Err(ConfigError::Invalid(format!(
                "player.volume must be between 0.0 and 1.0, got {}",
                self.player.volume
            )));
        }

        if self.player.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "player.tick_interval_ms must be positive".to_string(),
            ));
        }

        if !self.player.restart_threshold_secs.is_finite() || self.player.restart_threshold_secs < 0.0
        {
            return Err(ConfigError::Invalid(
                "player.restart_threshold_secs must be a non-negative number".to_string(),
            ));
        }

        Ok(())
    }

    /// Engine settings derived from the `player` section
    pub fn playback(&self) -> PlaybackConfig {
        PlaybackConfig {
            volume: self.player.volume,
            tick_interval: Duration::from_millis(self.player.tick_interval_ms),
            restart_threshold: Duration::from_secs_f64(self.player.restart_threshold_secs),
            ..PlaybackConfig::default()
        }
    }
}

// Default values
fn default_volume() -> f32 {
    encore_playback::DEFAULT_VOLUME
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_restart_threshold_secs() -> f64 {
    3.0
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            tick_interval_ms: default_tick_interval_ms(),
            restart_threshold_secs: default_restart_threshold_secs(),
        }
    }
}
