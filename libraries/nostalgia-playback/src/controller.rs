//! Playback session controller - core orchestration
//!
//! Owns at most one backend resource at a time and translates imperative
//! operations (load, toggle, seek, volume, stop, release) into the
//! [`PlaybackSession`] snapshot and a queue of [`PlaybackEvent`]s.
//!
//! Everything runs on the caller's thread. Backend completions are pulled in
//! by [`pump`](PlaybackController::pump) / [`update`](PlaybackController::update)
//! and applied only if they belong to the current generation.

use crate::{
    backend::{BackendEvent, LoadOptions, MediaBackend, MediaHandle},
    config::PlaybackConfig,
    events::{secs_to_ms, PlaybackEvent},
    progress::{ProgressSampler, ProgressTicket},
    resource::{Generation, MediaResource},
    types::{ErrorKind, PlaybackSession, SessionError, SessionPhase, SourceRef},
    volume::Volume,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Playback session controller
pub struct PlaybackController<B: MediaBackend> {
    backend: B,
    config: PlaybackConfig,
    session: PlaybackSession,
    volume: Volume,

    // Bumped on every load; results tagged with an older one are dropped
    generation: Generation,
    resource: Option<MediaResource>,
    sampler: ProgressSampler,
    // Set by release() until the next load
    torn_down: bool,

    pending_events: Vec<PlaybackEvent>,
    last_state: (SessionPhase, bool),
}

impl<B: MediaBackend> PlaybackController<B> {
    /// Create an idle controller over `backend`
    pub fn new(backend: B, config: PlaybackConfig) -> Self {
        let volume = Volume::new(config.clamped_volume());
        let sampler = ProgressSampler::new(config.progress_interval());

        Self {
            backend,
            session: PlaybackSession::idle(volume.level()),
            volume,
            generation: Generation::default(),
            resource: None,
            sampler,
            torn_down: false,
            pending_events: Vec::new(),
            last_state: (SessionPhase::Idle, false),
            config,
        }
    }

    // ===== Snapshot =====

    /// Current session snapshot
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// Current outer phase
    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    /// Generation of the most recent `load`
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Configuration the controller was built with
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Read-only access to the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ===== Session lifecycle =====

    /// Request a new session for `source`
    ///
    /// Any active resource is released first. The session moves to
    /// `Loading`; the backend's `Ready`/`LoadError` notification resolves it.
    pub fn load(&mut self, source: SourceRef) {
        self.generation = self.generation.next();
        let generation = self.generation;

        self.teardown_resource();
        self.torn_down = false;

        info!(%source, %generation, "loading source");

        self.session.source = Some(source.clone());
        self.session.loading = true;
        self.session.playing = false;
        self.session.error = None;
        self.session.position_secs = 0.0;
        self.session.duration_secs = 0.0;

        self.pending_events.push(PlaybackEvent::SourceChanged {
            source: Some(source.clone()),
        });
        self.emit_state_changed();

        let options = LoadOptions {
            volume: self.volume.level(),
            streaming: self.config.streaming,
        };

        match self.backend.create(&source, &options) {
            Ok(handle) => {
                debug!(%handle, %generation, "backend accepted load request");
                self.resource = Some(MediaResource::new(generation, handle));
            }
            Err(e) => {
                warn!(%source, error = %e, "backend rejected load request");
                self.fail(ErrorKind::LoadFailed, e.to_string());
            }
        }
    }

    /// Mount-style entry point
    ///
    /// `None` releases the session. The source that is already loaded (and
    /// not errored) is left alone; anything else starts a new load.
    pub fn set_source(&mut self, source: Option<SourceRef>) {
        match source {
            None => self.release(),
            Some(source) => {
                let unchanged = self.session.source.as_ref() == Some(&source)
                    && self.session.phase() != SessionPhase::Errored;
                if unchanged {
                    debug!(%source, "source unchanged, keeping session");
                } else {
                    self.load(source);
                }
            }
        }
    }

    /// Tear the session down and return to `Idle`
    ///
    /// Releases the backend resource and stops progress sampling. Calling it
    /// again is a no-op.
    pub fn release(&mut self) {
        self.teardown_resource();

        if self.session.source.is_none() {
            return;
        }

        info!(generation = %self.generation, "releasing session");
        self.torn_down = true;
        self.session = PlaybackSession::idle(self.volume.level());
        self.pending_events
            .push(PlaybackEvent::SourceChanged { source: None });
        self.emit_state_changed();
    }

    // ===== Playback control =====

    /// Flip between play and pause
    ///
    /// No-op unless the session is `Ready`.
    pub fn toggle_play(&mut self) {
        let Some(handle) = self.ready_handle() else {
            debug!(phase = ?self.session.phase(), "toggle_play ignored");
            return;
        };

        if self.session.playing {
            if let Err(e) = self.backend.pause(handle) {
                self.fail(ErrorKind::PlaybackFailed, e.to_string());
                return;
            }
            self.session.playing = false;
            self.sampler.stop();
            self.sample_progress(handle);
        } else {
            let at_end = self.session.duration_secs > 0.0
                && self.session.position_secs >= self.session.duration_secs;
            if at_end {
                // Finished sources restart from the top
                if let Err(e) = self.backend.seek(handle, 0.0) {
                    self.fail(ErrorKind::PlaybackFailed, e.to_string());
                    return;
                }
                self.session.position_secs = 0.0;
            }
            if let Err(e) = self.backend.play(handle) {
                self.fail(ErrorKind::PlaybackFailed, e.to_string());
                return;
            }
            self.session.playing = true;
            self.sampler.start(self.generation);
        }

        self.emit_state_changed();
    }

    /// Seek to a fraction of the duration
    ///
    /// `fraction` is clamped to [0, 1]. No-op while the duration is unknown,
    /// outside `Ready`, or for NaN input.
    pub fn seek(&mut self, fraction: f64) {
        if fraction.is_nan() || self.session.duration_secs <= 0.0 {
            return;
        }
        let Some(handle) = self.ready_handle() else {
            debug!(phase = ?self.session.phase(), "seek ignored");
            return;
        };

        let target = fraction.clamp(0.0, 1.0) * self.session.duration_secs;
        if let Err(e) = self.backend.seek(handle, target) {
            self.fail(ErrorKind::PlaybackFailed, e.to_string());
            return;
        }

        self.session.position_secs = target;
        self.emit_position();
    }

    /// Set the volume, clamped to [0, 1]
    ///
    /// Applies to the live resource immediately (playing or not) and is
    /// kept for later sources. NaN is ignored, and so is any call on a
    /// released session until the next `load`.
    pub fn set_volume(&mut self, level: f32) {
        if self.torn_down {
            debug!("set_volume ignored on released session");
            return;
        }
        let Some(level) = self.volume.set_level(level) else {
            return;
        };
        self.session.volume = level;
        self.pending_events
            .push(PlaybackEvent::VolumeChanged { level });

        let Some(handle) = self.resource.as_ref().map(MediaResource::handle) else {
            return;
        };
        if let Err(e) = self.backend.set_volume(handle, level) {
            if self.session.phase() == SessionPhase::Ready {
                self.fail(ErrorKind::PlaybackFailed, e.to_string());
            } else {
                warn!(%handle, error = %e, "volume not applied while loading");
            }
        }
    }

    /// Halt playback and rewind, keeping the source loaded
    pub fn stop(&mut self) {
        let Some(handle) = self.ready_handle() else {
            return;
        };

        if let Err(e) = self.backend.stop(handle) {
            self.fail(ErrorKind::PlaybackFailed, e.to_string());
            return;
        }

        self.sampler.stop();
        self.session.playing = false;
        self.session.position_secs = 0.0;
        self.emit_position();
        self.emit_state_changed();
    }

    // ===== Event loop integration =====

    /// Apply all pending backend notifications
    pub fn pump(&mut self) {
        while let Some(event) = self.backend.poll_event() {
            self.apply_backend_event(event);
        }
    }

    /// Pump backend notifications, then sample progress if due
    ///
    /// `now` is a monotonic timestamp from any fixed origin.
    pub fn update(&mut self, now: Duration) {
        self.pump();

        if !self.session.playing || !self.sampler.poll(now) {
            return;
        }
        if let Some(handle) = self.ready_handle() {
            self.sample_progress(handle);
        }
    }

    /// Ticket for hosts that schedule their own progress timer
    ///
    /// `None` while the sampler is stopped.
    pub fn progress_ticket(&self) -> Option<ProgressTicket> {
        self.sampler.ticket()
    }

    /// Sample progress for a host-scheduled tick
    ///
    /// Returns `false` (and does nothing) if the ticket is stale.
    pub fn on_progress_tick(&mut self, ticket: ProgressTicket) -> bool {
        if !self.sampler.accepts(ticket, self.generation) {
            debug!(ticket = ?ticket, "dropping stale progress tick");
            return false;
        }
        match self.ready_handle() {
            Some(handle) => {
                self.sample_progress(handle);
                true
            }
            None => false,
        }
    }

    // ===== Internals =====

    fn ready_handle(&self) -> Option<MediaHandle> {
        if self.session.phase() != SessionPhase::Ready {
            return None;
        }
        self.resource
            .as_ref()
            .filter(|resource| resource.generation() == self.generation)
            .map(MediaResource::handle)
    }

    fn apply_backend_event(&mut self, event: BackendEvent) {
        let handle = event.handle();
        let owner = self.resource.as_ref().and_then(|r| r.owns(handle));
        if owner != Some(self.generation) {
            debug!(%handle, current = %self.generation, "discarding stale backend event");
            return;
        }

        match event {
            BackendEvent::Ready { duration_secs, .. } => {
                if !self.session.loading {
                    debug!(%handle, "ignoring repeated ready notification");
                    return;
                }
                self.session.loading = false;
                self.session.duration_secs = sanitize_secs(duration_secs);
                info!(
                    %handle,
                    duration_secs = self.session.duration_secs,
                    "source ready"
                );
                self.pending_events.push(PlaybackEvent::Ready {
                    duration_ms: secs_to_ms(self.session.duration_secs),
                });
                self.emit_state_changed();
            }
            BackendEvent::LoadError { message, .. } => {
                self.fail(ErrorKind::LoadFailed, message);
            }
            BackendEvent::PlaybackError { message, .. } => {
                self.fail(ErrorKind::PlaybackFailed, message);
            }
            BackendEvent::Ended { .. } => {
                if self.session.phase() != SessionPhase::Ready {
                    return;
                }
                debug!(%handle, "source ended");
                self.sampler.stop();
                self.session.playing = false;
                let duration = sanitize_secs(self.backend.duration(handle));
                if duration > 0.0 {
                    self.session.duration_secs = duration;
                }
                self.session.position_secs = self.session.duration_secs;
                self.emit_position();
                self.pending_events.push(PlaybackEvent::Ended);
                self.emit_state_changed();
            }
        }
    }

    fn sample_progress(&mut self, handle: MediaHandle) {
        let duration = sanitize_secs(self.backend.duration(handle));
        if duration > 0.0 {
            self.session.duration_secs = duration;
        }

        let mut position = sanitize_secs(self.backend.position(handle));
        if self.session.duration_secs > 0.0 {
            position = position.min(self.session.duration_secs);
        }
        self.session.position_secs = position;
        self.emit_position();
    }

    /// Record a session failure and release the resource
    fn fail(&mut self, kind: ErrorKind, message: String) {
        warn!(?kind, %message, generation = %self.generation, "session failed");

        self.teardown_resource();
        self.session.playing = false;
        self.session.loading = false;
        self.session.error = Some(SessionError::new(kind, message.clone()));

        self.pending_events
            .push(PlaybackEvent::Error { kind, message });
        self.emit_state_changed();
    }

    /// Single release point for the backend resource
    fn teardown_resource(&mut self) {
        self.sampler.stop();
        if let Some(resource) = self.resource.take() {
            resource.release(&mut self.backend);
        }
    }

    fn emit_position(&mut self) {
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            position_ms: secs_to_ms(self.session.position_secs),
            duration_ms: secs_to_ms(self.session.duration_secs),
        });
    }

    fn emit_state_changed(&mut self) {
        let state = (self.session.phase(), self.session.playing);
        if state == self.last_state {
            return;
        }
        self.last_state = state;
        self.pending_events.push(PlaybackEvent::StateChanged {
            phase: state.0,
            playing: state.1,
        });
    }
}

impl<B: MediaBackend> Drop for PlaybackController<B> {
    fn drop(&mut self) {
        self.teardown_resource();
    }
}

fn sanitize_secs(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}
