//! Playback Events
//!
//! Event-based communication for view synchronization. Events are queued by
//! the controller at key points:
//! - Phase changes (loading, ready, errored, idle) and play/pause flips
//! - Source changes
//! - Position updates (periodic, while playing)
//! - Volume changes
//!
//! Views either read the [`PlaybackSession`](crate::PlaybackSession)
//! snapshot directly or drain these events to animate transitions.

use crate::types::{ErrorKind, SessionPhase, SourceRef};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Outer phase or playing flag changed
    StateChanged {
        /// The new phase
        phase: SessionPhase,
        /// Whether audio is advancing
        playing: bool,
    },

    /// A different source was requested, or the session was released
    SourceChanged {
        /// New source (`None` after release)
        source: Option<SourceRef>,
    },

    /// Load resolved and the duration is known
    Ready {
        /// Total duration
        duration_ms: u64,
    },

    /// Position update (periodic, typically every second)
    PositionUpdate {
        /// Current playback position
        position_ms: u64,
        /// Total duration
        duration_ms: u64,
    },

    /// Volume changed
    VolumeChanged {
        /// New level in [0, 1]
        level: f32,
    },

    /// Playback reached the end of the source
    Ended,

    /// Load or playback failed
    Error {
        /// Failure category
        kind: ErrorKind,
        /// Error message
        message: String,
    },
}

pub(crate) fn secs_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}
