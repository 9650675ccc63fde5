//! Core types for playback sessions

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// URI of a media source
///
/// Accepts anything the backend understands (`file://` paths, plain paths,
/// `https://` URLs, blob URLs in the browser). Only emptiness is rejected here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRef(String);

impl SourceRef {
    /// Parse a source URI, rejecting empty or whitespace-only input
    pub fn parse(uri: impl Into<String>) -> Result<Self> {
        let uri = uri.into();
        if uri.trim().is_empty() {
            return Err(PlaybackError::InvalidSource(
                "source URI is empty".to_string(),
            ));
        }
        Ok(Self(uri))
    }

    /// Borrow the URI
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outer state of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No source loaded
    Idle,

    /// Source requested, waiting for the backend
    Loading,

    /// Source loaded; playing or paused
    Ready,

    /// Load or playback failed; a new load is required
    Errored,
}

/// Failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Source could not be opened or decoded
    LoadFailed,

    /// Error during active playback
    PlaybackFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::LoadFailed => f.write_str("load failed"),
            ErrorKind::PlaybackFailed => f.write_str("playback failed"),
        }
    }
}

/// Session-scoped error, kept in the snapshot for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionError {
    /// Failure category
    pub kind: ErrorKind,

    /// Message as reported by the backend
    pub message: String,
}

impl SessionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Reactive snapshot of the active playback session
///
/// Views read this after every controller call (or after draining events).
/// The controller is the only writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSession {
    /// Currently loaded source (`None` = no session)
    pub source: Option<SourceRef>,

    /// True only while audio is actively advancing
    pub playing: bool,

    /// True between load request and ready/error
    pub loading: bool,

    /// Last failure, cleared by the next load
    pub error: Option<SessionError>,

    /// Current position in seconds
    pub position_secs: f64,

    /// Total duration in seconds (0 until known)
    pub duration_secs: f64,

    /// Volume in [0, 1]
    pub volume: f32,
}

impl PlaybackSession {
    /// Empty session with the given volume
    pub fn idle(volume: f32) -> Self {
        Self {
            source: None,
            playing: false,
            loading: false,
            error: None,
            position_secs: 0.0,
            duration_secs: 0.0,
            volume,
        }
    }

    /// Derive the outer phase from the fields
    pub fn phase(&self) -> SessionPhase {
        if self.source.is_none() {
            SessionPhase::Idle
        } else if self.loading {
            SessionPhase::Loading
        } else if self.error.is_some() {
            SessionPhase::Errored
        } else {
            SessionPhase::Ready
        }
    }

    /// Whether a source is loaded (in any phase)
    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    /// Position as a fraction of the duration, 0 when the duration is unknown
    pub fn progress(&self) -> f64 {
        if self.duration_secs > 0.0 {
            (self.position_secs / self.duration_secs).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Current position in seconds
    pub fn current_time(&self) -> f64 {
        self.position_secs
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.duration_secs
    }

    /// `m:ss` label for the current position
    pub fn current_time_label(&self) -> String {
        format_time(self.position_secs)
    }

    /// `m:ss` label for the duration
    pub fn duration_label(&self) -> String {
        format_time(self.duration_secs)
    }
}

/// Format seconds as `m:ss`
///
/// Minutes are unpadded and may exceed 59; seconds are floored and
/// zero-padded. Negative and non-finite input renders as `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
