//! WASM bindings for nostalgia-playback
//!
//! This module provides a browser [`MediaBackend`](crate::MediaBackend) over
//! `HTMLAudioElement` and a JavaScript-facing controller wrapper, so the
//! gallery's audio views can drive the session controller directly.

pub mod backend;
pub mod controller;

pub use backend::HtmlMediaBackend;
pub use controller::WasmPlaybackController;
