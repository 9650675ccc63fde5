//! Platform-agnostic media backend trait
//!
//! Abstracts the decoding/output capability for different platforms
//! (symphonia + cpal on desktop, `HTMLAudioElement` in the browser).

use crate::error::Result;
use crate::types::SourceRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a media resource owned by a backend
///
/// Backends allocate handles monotonically and never reuse a value, so a
/// notification about a released handle can never be mistaken for one
/// about a live resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MediaHandle(pub u64);

impl fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Options passed to [`MediaBackend::create`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    /// Volume to apply as soon as the resource exists
    pub volume: f32,

    /// Decode progressively instead of buffering the whole source
    pub streaming: bool,
}

/// Asynchronous notification from a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BackendEvent {
    /// Resource decoded far enough to know its duration
    Ready {
        handle: MediaHandle,
        duration_secs: f64,
    },

    /// Resource could not be opened or decoded
    LoadError { handle: MediaHandle, message: String },

    /// Resource failed while playing
    PlaybackError { handle: MediaHandle, message: String },

    /// Playback reached the end of the resource
    Ended { handle: MediaHandle },
}

impl BackendEvent {
    /// Failure notification for a resource
    ///
    /// Errors raised before the resource reported `Ready` are load failures;
    /// anything later happened during playback.
    pub fn failure(handle: MediaHandle, ready: bool, message: impl Into<String>) -> Self {
        let message = message.into();
        if ready {
            BackendEvent::PlaybackError { handle, message }
        } else {
            BackendEvent::LoadError { handle, message }
        }
    }

    /// Handle the event refers to
    pub fn handle(&self) -> MediaHandle {
        match self {
            BackendEvent::Ready { handle, .. }
            | BackendEvent::LoadError { handle, .. }
            | BackendEvent::PlaybackError { handle, .. }
            | BackendEvent::Ended { handle } => *handle,
        }
    }
}

/// Media decoding primitive
///
/// Implementors own the actual decoder and output. All methods are called
/// from the controller's thread; implementations that decode or play on
/// worker threads report back through [`poll_event`](Self::poll_event).
///
/// `create` must not block on I/O: it registers the request and returns a
/// handle, and the outcome arrives later as [`BackendEvent::Ready`] or
/// [`BackendEvent::LoadError`]. Returning `Err` from `create` means the
/// request could not even be issued.
pub trait MediaBackend {
    /// Request a new resource for `source`
    fn create(&mut self, source: &SourceRef, options: &LoadOptions) -> Result<MediaHandle>;

    /// Start or resume playback
    fn play(&mut self, handle: MediaHandle) -> Result<()>;

    /// Pause playback, keeping the position
    fn pause(&mut self, handle: MediaHandle) -> Result<()>;

    /// Halt playback and rewind to the start
    fn stop(&mut self, handle: MediaHandle) -> Result<()>;

    /// Move the playhead to `seconds`
    fn seek(&mut self, handle: MediaHandle, seconds: f64) -> Result<()>;

    /// Current playhead in seconds (0 for unknown handles)
    fn position(&self, handle: MediaHandle) -> f64;

    /// Total duration in seconds (0 until known)
    fn duration(&self, handle: MediaHandle) -> f64;

    /// Apply a volume in [0, 1]
    fn set_volume(&mut self, handle: MediaHandle, level: f32) -> Result<()>;

    /// Release the resource; unknown handles are ignored
    fn unload(&mut self, handle: MediaHandle);

    /// Next pending notification, if any (non-blocking)
    fn poll_event(&mut self) -> Option<BackendEvent>;
}

impl<B: MediaBackend + ?Sized> MediaBackend for Box<B> {
    fn create(&mut self, source: &SourceRef, options: &LoadOptions) -> Result<MediaHandle> {
        (**self).create(source, options)
    }

    fn play(&mut self, handle: MediaHandle) -> Result<()> {
        (**self).play(handle)
    }

    fn pause(&mut self, handle: MediaHandle) -> Result<()> {
        (**self).pause(handle)
    }

    fn stop(&mut self, handle: MediaHandle) -> Result<()> {
        (**self).stop(handle)
    }

    fn seek(&mut self, handle: MediaHandle, seconds: f64) -> Result<()> {
        (**self).seek(handle, seconds)
    }

    fn position(&self, handle: MediaHandle) -> f64 {
        (**self).position(handle)
    }

    fn duration(&self, handle: MediaHandle) -> f64 {
        (**self).duration(handle)
    }

    fn set_volume(&mut self, handle: MediaHandle, level: f32) -> Result<()> {
        (**self).set_volume(handle, level)
    }

    fn unload(&mut self, handle: MediaHandle) {
        (**self).unload(handle);
    }

    fn poll_event(&mut self) -> Option<BackendEvent> {
        (**self).poll_event()
    }
}
