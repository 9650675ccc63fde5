//! Shared test helpers: a scripted in-memory backend
//!
//! The backend never resolves anything on its own. Tests keep a clone of it
//! (clones share state) and decide when loads resolve, fail, or end.

#![allow(dead_code)]

use nostalgia_playback::{
    BackendEvent, LoadOptions, MediaBackend, MediaHandle, PlaybackConfig, PlaybackController,
    PlaybackError, Result, SourceRef,
};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

#[derive(Debug, Clone)]
pub struct Clip {
    pub source: SourceRef,
    pub position: f64,
    pub duration: f64,
    pub playing: bool,
    pub volume: f32,
    pub streaming: bool,
}

#[derive(Debug, Default)]
struct State {
    next_handle: u64,
    live: HashMap<MediaHandle, Clip>,
    created: Vec<MediaHandle>,
    unloaded: Vec<MediaHandle>,
    events: VecDeque<BackendEvent>,
    fail_next_create: Option<String>,
    fail_next_play: Option<String>,
    fail_next_seek: Option<String>,
}

/// In-memory backend whose asynchronous side is driven by the test
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    state: Rc<RefCell<State>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a controller over a clone of this backend
    pub fn controller(&self) -> PlaybackController<ScriptedBackend> {
        init_tracing();
        PlaybackController::new(self.clone(), PlaybackConfig::default())
    }

    pub fn controller_with(&self, config: PlaybackConfig) -> PlaybackController<ScriptedBackend> {
        init_tracing();
        PlaybackController::new(self.clone(), config)
    }

    // ===== Scripting =====

    /// Queue a Ready notification
    pub fn resolve(&self, handle: MediaHandle, duration: f64) {
        let mut state = self.state.borrow_mut();
        if let Some(clip) = state.live.get_mut(&handle) {
            clip.duration = duration;
        }
        state.events.push_back(BackendEvent::Ready {
            handle,
            duration_secs: duration,
        });
    }

    /// Queue a LoadError notification
    pub fn reject(&self, handle: MediaHandle, message: &str) {
        self.state.borrow_mut().events.push_back(BackendEvent::LoadError {
            handle,
            message: message.to_string(),
        });
    }

    /// Queue a PlaybackError notification
    pub fn break_playback(&self, handle: MediaHandle, message: &str) {
        self.state
            .borrow_mut()
            .events
            .push_back(BackendEvent::PlaybackError {
                handle,
                message: message.to_string(),
            });
    }

    /// Move the playhead to the end and queue an Ended notification
    pub fn finish(&self, handle: MediaHandle) {
        let mut state = self.state.borrow_mut();
        if let Some(clip) = state.live.get_mut(&handle) {
            clip.position = clip.duration;
            clip.playing = false;
        }
        state.events.push_back(BackendEvent::Ended { handle });
    }

    /// Advance the playhead as if audio had played for `seconds`
    pub fn advance(&self, handle: MediaHandle, seconds: f64) {
        if let Some(clip) = self.state.borrow_mut().live.get_mut(&handle) {
            clip.position += seconds;
        }
    }

    pub fn fail_next_create(&self, message: &str) {
        self.state.borrow_mut().fail_next_create = Some(message.to_string());
    }

    pub fn fail_next_play(&self, message: &str) {
        self.state.borrow_mut().fail_next_play = Some(message.to_string());
    }

    pub fn fail_next_seek(&self, message: &str) {
        self.state.borrow_mut().fail_next_seek = Some(message.to_string());
    }

    // ===== Inspection =====

    /// Handle returned by the most recent `create`
    pub fn last_handle(&self) -> MediaHandle {
        *self
            .state
            .borrow()
            .created
            .last()
            .expect("no resource was created")
    }

    pub fn created(&self) -> Vec<MediaHandle> {
        self.state.borrow().created.clone()
    }

    pub fn unloaded(&self) -> Vec<MediaHandle> {
        self.state.borrow().unloaded.clone()
    }

    pub fn is_live(&self, handle: MediaHandle) -> bool {
        self.state.borrow().live.contains_key(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn clip(&self, handle: MediaHandle) -> Option<Clip> {
        self.state.borrow().live.get(&handle).cloned()
    }
}

impl MediaBackend for ScriptedBackend {
    fn create(&mut self, source: &SourceRef, options: &LoadOptions) -> Result<MediaHandle> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = state.fail_next_create.take() {
            return Err(PlaybackError::Backend(message));
        }

        state.next_handle += 1;
        let handle = MediaHandle(state.next_handle);
        state.live.insert(
            handle,
            Clip {
                source: source.clone(),
                position: 0.0,
                duration: 0.0,
                playing: false,
                volume: options.volume,
                streaming: options.streaming,
            },
        );
        state.created.push(handle);
        Ok(handle)
    }

    fn play(&mut self, handle: MediaHandle) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = state.fail_next_play.take() {
            return Err(PlaybackError::Backend(message));
        }
        let clip = state
            .live
            .get_mut(&handle)
            .ok_or(PlaybackError::UnknownHandle(handle))?;
        clip.playing = true;
        Ok(())
    }

    fn pause(&mut self, handle: MediaHandle) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let clip = state
            .live
            .get_mut(&handle)
            .ok_or(PlaybackError::UnknownHandle(handle))?;
        clip.playing = false;
        Ok(())
    }

    fn stop(&mut self, handle: MediaHandle) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let clip = state
            .live
            .get_mut(&handle)
            .ok_or(PlaybackError::UnknownHandle(handle))?;
        clip.playing = false;
        clip.position = 0.0;
        Ok(())
    }

    fn seek(&mut self, handle: MediaHandle, seconds: f64) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = state.fail_next_seek.take() {
            return Err(PlaybackError::Backend(message));
        }
        let clip = state
            .live
            .get_mut(&handle)
            .ok_or(PlaybackError::UnknownHandle(handle))?;
        clip.position = seconds;
        Ok(())
    }

    fn position(&self, handle: MediaHandle) -> f64 {
        self.state
            .borrow()
            .live
            .get(&handle)
            .map(|clip| clip.position)
            .unwrap_or(0.0)
    }

    fn duration(&self, handle: MediaHandle) -> f64 {
        self.state
            .borrow()
            .live
            .get(&handle)
            .map(|clip| clip.duration)
            .unwrap_or(0.0)
    }

    fn set_volume(&mut self, handle: MediaHandle, level: f32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let clip = state
            .live
            .get_mut(&handle)
            .ok_or(PlaybackError::UnknownHandle(handle))?;
        clip.volume = level;
        Ok(())
    }

    fn unload(&mut self, handle: MediaHandle) {
        let mut state = self.state.borrow_mut();
        if state.live.remove(&handle).is_some() {
            state.unloaded.push(handle);
        }
    }

    fn poll_event(&mut self) -> Option<BackendEvent> {
        self.state.borrow_mut().events.pop_front()
    }
}

pub fn source(uri: &str) -> SourceRef {
    SourceRef::parse(uri).expect("valid test URI")
}
