//! Nostalgia Player - command-line host for playback sessions
//!
//! Plays or probes one gallery source through the desktop backend.

pub mod config;
pub mod session;

pub use config::PlayerConfig;
pub use session::{play, probe, PlayOptions, PlayReport};
