//! Nostalgia - Playback Sessions
//!
//! Platform-agnostic playback session controller for the Nostalgia gallery.
//!
//! This crate provides:
//! - A single-session controller (load, play/pause, seek, volume, stop, release)
//! - A reactive [`PlaybackSession`] snapshot for views
//! - Generation-tagged discard of stale load results
//! - Periodic progress sampling that stops cleanly on pause/stop/teardown
//! - Playback events for view synchronization
//!
//! # Architecture
//!
//! `nostalgia-playback` does not decode or output audio itself:
//! - No dependency on CPAL or symphonia (desktop)
//! - No dependency on the DOM unless the `wasm` feature is enabled
//!
//! Platform-specific decoding is provided through the [`MediaBackend`] trait.
//! The controller runs on one thread; backends that work on other threads
//! report back through [`MediaBackend::poll_event`].
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use nostalgia_playback::{
//!     BackendEvent, LoadOptions, MediaBackend, MediaHandle, PlaybackConfig,
//!     PlaybackController, Result, SessionPhase, SourceRef,
//! };
//! use std::collections::VecDeque;
//!
//! // Backend that "decodes" everything instantly as a 3:45 clip
//! #[derive(Default)]
//! struct InstantBackend {
//!     next: u64,
//!     events: VecDeque<BackendEvent>,
//! }
//!
//! impl MediaBackend for InstantBackend {
//!     fn create(&mut self, _source: &SourceRef, _options: &LoadOptions) -> Result<MediaHandle> {
//!         self.next += 1;
//!         let handle = MediaHandle(self.next);
//!         self.events.push_back(BackendEvent::Ready { handle, duration_secs: 225.0 });
//!         Ok(handle)
//!     }
//!     fn play(&mut self, _: MediaHandle) -> Result<()> { Ok(()) }
//!     fn pause(&mut self, _: MediaHandle) -> Result<()> { Ok(()) }
//!     fn stop(&mut self, _: MediaHandle) -> Result<()> { Ok(()) }
//!     fn seek(&mut self, _: MediaHandle, _: f64) -> Result<()> { Ok(()) }
//!     fn position(&self, _: MediaHandle) -> f64 { 0.0 }
//!     fn duration(&self, _: MediaHandle) -> f64 { 225.0 }
//!     fn set_volume(&mut self, _: MediaHandle, _: f32) -> Result<()> { Ok(()) }
//!     fn unload(&mut self, _: MediaHandle) {}
//!     fn poll_event(&mut self) -> Option<BackendEvent> { self.events.pop_front() }
//! }
//!
//! let mut controller = PlaybackController::new(InstantBackend::default(), PlaybackConfig::default());
//!
//! controller.load(SourceRef::parse("file:///gallery/whispers-of-canvas.ogg")?);
//! assert_eq!(controller.phase(), SessionPhase::Loading);
//!
//! controller.pump();
//! assert_eq!(controller.phase(), SessionPhase::Ready);
//!
//! controller.toggle_play();
//! controller.seek(0.5);
//! controller.set_volume(0.8);
//! assert!(controller.session().playing);
//! assert_eq!(controller.session().duration_label(), "3:45");
//! # Ok::<(), nostalgia_playback::PlaybackError>(())
//! ```

mod backend;
mod config;
mod controller;
mod error;
pub mod events;
mod progress;
mod resource;
pub mod types;
mod volume;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use backend::{BackendEvent, LoadOptions, MediaBackend, MediaHandle};
pub use config::PlaybackConfig;
pub use controller::PlaybackController;
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use progress::{ProgressSampler, ProgressTicket};
pub use resource::Generation;
pub use types::{format_time, ErrorKind, PlaybackSession, SessionError, SessionPhase, SourceRef};
pub use volume::Volume;
