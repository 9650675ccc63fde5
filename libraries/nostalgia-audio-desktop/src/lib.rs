//! Desktop media backend for Nostalgia playback sessions
//!
//! Implements [`nostalgia_playback::MediaBackend`] with Symphonia decoding on
//! a background thread and CPAL output on a dedicated audio thread.
//!
//! # Example
//!
//! ```no_run
//! use nostalgia_audio_desktop::DesktopBackend;
//! use nostalgia_playback::{PlaybackConfig, PlaybackController, SourceRef};
//! use std::time::{Duration, Instant};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = DesktopBackend::open(None)?;
//! let mut controller = PlaybackController::new(backend, PlaybackConfig::default());
//!
//! controller.load(SourceRef::parse("file:///srv/gallery/whispers-of-canvas.ogg")?);
//!
//! let start = Instant::now();
//! while controller.session().loading {
//!     controller.update(start.elapsed());
//!     std::thread::sleep(Duration::from_millis(20));
//! }
//! controller.toggle_play();
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod backend;
pub mod decode;
mod error;
mod loader;
mod output;

pub use backend::{source_path, DesktopBackend};
pub use decode::{decode_file, resample, DecodedClip};
pub use error::{DesktopError, Result};
pub use loader::{ClipLoader, LoadOutcome, LoadRequest};
pub use output::{ClipOutput, CpalOutput};
