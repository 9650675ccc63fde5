//! Error types for playback sessions

use crate::backend::MediaHandle;
use thiserror::Error;

/// Playback errors
///
/// These are returned by media backends and by constructors. Controller
/// operations never return them: a failing backend call is folded into the
/// session snapshot as a [`SessionError`](crate::types::SessionError).
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Source URI was empty or otherwise unusable
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// Backend was asked about a handle it does not own
    #[error("Unknown media handle: {0}")]
    UnknownHandle(MediaHandle),

    /// Decoding or output failure reported by a backend
    #[error("Backend error: {0}")]
    Backend(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
