//! Controller configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`PlaybackController`](crate::PlaybackController)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial volume in [0, 1] (default: 1.0)
    #[serde(default = "default_volume")]
    pub initial_volume: f32,

    /// Period of progress sampling while playing (default: 1000 ms)
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    /// Ask backends to stream instead of fully buffering (default: true)
    #[serde(default = "default_streaming")]
    pub streaming: bool,
}

impl PlaybackConfig {
    /// Progress sampling period
    ///
    /// Never zero; a zero setting would re-sample on every update.
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }

    /// Initial volume clamped to [0, 1]
    pub fn clamped_volume(&self) -> f32 {
        if self.initial_volume.is_nan() {
            default_volume()
        } else {
            self.initial_volume.clamp(0.0, 1.0)
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            initial_volume: default_volume(),
            progress_interval_ms: default_progress_interval_ms(),
            streaming: default_streaming(),
        }
    }
}

fn default_volume() -> f32 {
    1.0
}

fn default_progress_interval_ms() -> u64 {
    1000
}

fn default_streaming() -> bool {
    true
}
