//! WASM-compatible PlaybackController wrapper

use super::backend::HtmlMediaBackend;
use crate::{PlaybackConfig, PlaybackController, PlaybackEvent, SessionPhase, SourceRef};
use js_sys::Function;
use std::time::Duration;
use wasm_bindgen::prelude::*;

/// WASM-compatible playback controller
///
/// Wraps [`PlaybackController`] over [`HtmlMediaBackend`] with a
/// JavaScript-friendly API. The host calls `update(performance.now())` from
/// `requestAnimationFrame` or `setInterval`; that pulls in element
/// notifications and samples progress.
#[wasm_bindgen]
pub struct WasmPlaybackController {
    inner: PlaybackController<HtmlMediaBackend>,
    on_event: Option<Function>,
}

#[wasm_bindgen]
impl WasmPlaybackController {
    /// Create a new controller
    ///
    /// `config` is an optional object shaped like `PlaybackConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmPlaybackController, JsValue> {
        console_error_panic_hook::set_once();

        let config = if config.is_undefined() || config.is_null() {
            PlaybackConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };

        Ok(Self {
            inner: PlaybackController::new(HtmlMediaBackend::new(), config),
            on_event: None,
        })
    }

    // ===== Playback Control =====

    /// Load a new source, replacing the current one
    pub fn load(&mut self, uri: String) -> Result<(), JsValue> {
        let source = SourceRef::parse(uri).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.load(source);
        self.flush_events();
        Ok(())
    }

    /// Mount-style source setter; `null`/`undefined` releases
    #[wasm_bindgen(js_name = setSource)]
    pub fn set_source(&mut self, uri: Option<String>) -> Result<(), JsValue> {
        let source = uri
            .map(SourceRef::parse)
            .transpose()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.set_source(source);
        self.flush_events();
        Ok(())
    }

    /// Flip between play and pause
    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&mut self) {
        self.inner.toggle_play();
        self.flush_events();
    }

    /// Seek to a fraction (0.0 - 1.0) of the duration
    pub fn seek(&mut self, fraction: f64) {
        self.inner.seek(fraction);
        self.flush_events();
    }

    /// Set volume (0.0 - 1.0)
    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&mut self, level: f32) {
        self.inner.set_volume(level);
        self.flush_events();
    }

    /// Stop and rewind, keeping the source loaded
    pub fn stop(&mut self) {
        self.inner.stop();
        self.flush_events();
    }

    /// Release the session (call on unmount)
    pub fn release(&mut self) {
        self.inner.release();
        self.flush_events();
    }

    /// Pull element notifications and sample progress
    ///
    /// `now_ms` is a monotonic timestamp such as `performance.now()`.
    pub fn update(&mut self, now_ms: f64) {
        let now = if now_ms.is_finite() && now_ms > 0.0 {
            Duration::from_secs_f64(now_ms / 1000.0)
        } else {
            Duration::ZERO
        };
        self.inner.update(now);
        self.flush_events();
    }

    // ===== State Queries =====

    /// Full session snapshot as a plain object
    pub fn session(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.inner.session()).unwrap_or(JsValue::NULL)
    }

    /// Current phase ("idle" | "loading" | "ready" | "errored")
    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        match self.inner.phase() {
            SessionPhase::Idle => "idle".to_string(),
            SessionPhase::Loading => "loading".to_string(),
            SessionPhase::Ready => "ready".to_string(),
            SessionPhase::Errored => "errored".to_string(),
        }
    }

    #[wasm_bindgen(getter, js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.inner.session().playing
    }

    #[wasm_bindgen(getter, js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.inner.session().loading
    }

    /// Position as a fraction of the duration
    #[wasm_bindgen(getter)]
    pub fn progress(&self) -> f64 {
        self.inner.session().progress()
    }

    #[wasm_bindgen(getter, js_name = currentTime)]
    pub fn current_time(&self) -> f64 {
        self.inner.session().current_time()
    }

    #[wasm_bindgen(getter)]
    pub fn duration(&self) -> f64 {
        self.inner.session().duration()
    }

    #[wasm_bindgen(getter)]
    pub fn volume(&self) -> f32 {
        self.inner.session().volume
    }

    /// Displayable error message, if the session failed
    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.inner.session().error.as_ref().map(|e| e.to_string())
    }

    // ===== Event Listeners =====

    /// Register a callback receiving every playback event object
    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&mut self, callback: Function) {
        self.on_event = Some(callback);
    }

    fn flush_events(&mut self) {
        let events: Vec<PlaybackEvent> = self.inner.drain_events();
        let Some(ref cb) = self.on_event else {
            return;
        };
        for event in events {
            if let Ok(value) = serde_wasm_bindgen::to_value(&event) {
                cb.call1(&JsValue::NULL, &value).ok();
            }
        }
    }
}
