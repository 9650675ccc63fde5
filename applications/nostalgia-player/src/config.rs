/// Player configuration
use anyhow::{Context, Result};
use nostalgia_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "nostalgia.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// How often the host loop wakes up to pump the controller
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Output device name; the system default when unset
    #[serde(default)]
    pub output_device: Option<String>,
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `nostalgia.toml` is read if
    /// present. Environment variables prefixed `NOSTALGIA_` override file
    /// values, with `__` separating nested keys
    /// (`NOSTALGIA_PLAYBACK__INITIAL_VOLUME=0.5`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("NOSTALGIA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .context("failed to read configuration")?;

        config
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Host loop period
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            poll_interval_ms: default_poll_interval_ms(),
            output_device: None,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    50
}
