/// Desktop backend errors
use nostalgia_playback::PlaybackError;
use thiserror::Error;

/// Result type for desktop backend operations
pub type Result<T> = std::result::Result<T, DesktopError>;

/// Desktop backend errors
#[derive(Debug, Error)]
pub enum DesktopError {
    /// No output device (or none with the requested name)
    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    /// Device enumeration or query failure
    #[error("Device error: {0}")]
    DeviceError(String),

    /// Failed to build output stream
    #[error("Failed to build output stream: {0}")]
    StreamBuildError(String),

    /// Failed to start the stream
    #[error("Failed to play stream: {0}")]
    PlayError(String),

    /// Failed to pause the stream
    #[error("Failed to pause stream: {0}")]
    PauseError(String),

    /// Source URI cannot be opened by this backend
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// Container or codec problem
    #[error("Decode error: {0}")]
    Decode(String),

    /// Sample rate conversion error
    #[error("Sample rate conversion error: {0}")]
    ResampleError(String),

    /// A worker thread went away
    #[error("{0} thread is not running")]
    Disconnected(&'static str),

    /// Operation needs a decoded clip that is not there yet
    #[error("Clip {0} is not ready")]
    NotReady(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<cpal::BuildStreamError> for DesktopError {
    fn from(err: cpal::BuildStreamError) -> Self {
        DesktopError::StreamBuildError(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for DesktopError {
    fn from(err: cpal::PlayStreamError) -> Self {
        DesktopError::PlayError(err.to_string())
    }
}

impl From<cpal::PauseStreamError> for DesktopError {
    fn from(err: cpal::PauseStreamError) -> Self {
        DesktopError::PauseError(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for DesktopError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        DesktopError::DeviceError(err.to_string())
    }
}

impl From<cpal::DevicesError> for DesktopError {
    fn from(err: cpal::DevicesError) -> Self {
        DesktopError::DeviceError(err.to_string())
    }
}

impl From<symphonia::core::errors::Error> for DesktopError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        DesktopError::Decode(err.to_string())
    }
}

impl From<DesktopError> for PlaybackError {
    fn from(err: DesktopError) -> Self {
        match err {
            DesktopError::Io(e) => PlaybackError::Io(e),
            DesktopError::UnsupportedSource(uri) => PlaybackError::InvalidSource(uri),
            other => PlaybackError::Backend(other.to_string()),
        }
    }
}
