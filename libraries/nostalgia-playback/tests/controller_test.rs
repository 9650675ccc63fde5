//! Integration tests for the playback session controller
//!
//! These tests drive the controller through real view workflows: opening a
//! piece in the audio gallery, switching pieces quickly, closing the modal.

mod support;

use nostalgia_playback::{
    ErrorKind, Generation, PlaybackConfig, PlaybackEvent, SessionPhase,
};
use std::time::Duration;
use support::{source, ScriptedBackend};

const SECOND: Duration = Duration::from_secs(1);

// ===== Lifecycle =====

#[test]
fn open_play_pause_close() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("file:///gallery/whispers-of-canvas.ogg"));
    let handle = backend.last_handle();
    assert_eq!(ctrl.phase(), SessionPhase::Loading);

    backend.resolve(handle, 225.0);
    ctrl.pump();
    assert_eq!(ctrl.phase(), SessionPhase::Ready);
    assert_eq!(ctrl.session().duration_secs, 225.0);
    assert_eq!(ctrl.session().position_secs, 0.0);

    ctrl.toggle_play();
    assert!(ctrl.session().playing);
    assert!(backend.clip(handle).unwrap().playing);

    ctrl.toggle_play();
    assert!(!ctrl.session().playing);
    assert!(!backend.clip(handle).unwrap().playing);

    ctrl.release();
    assert_eq!(ctrl.phase(), SessionPhase::Idle);
    assert!(ctrl.session().source.is_none());
    assert!(!backend.is_live(handle));
}

#[test]
fn release_is_idempotent() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let handle = backend.last_handle();

    ctrl.release();
    ctrl.release();

    assert_eq!(backend.unloaded(), vec![handle]);
    assert_eq!(ctrl.phase(), SessionPhase::Idle);
}

#[test]
fn operations_after_release_are_noops() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    backend.resolve(backend.last_handle(), 60.0);
    ctrl.pump();
    ctrl.release();
    ctrl.drain_events();

    ctrl.toggle_play();
    ctrl.seek(0.5);
    ctrl.set_volume(0.3);
    ctrl.stop();

    assert_eq!(ctrl.phase(), SessionPhase::Idle);
    assert!(!ctrl.session().playing);
    assert_eq!(ctrl.session().position_secs, 0.0);
    assert_eq!(ctrl.session().volume, 1.0);
    assert!(ctrl.drain_events().is_empty());
}

#[test]
fn volume_accepted_again_after_reload() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    ctrl.release();
    ctrl.set_volume(0.3);

    ctrl.load(source("b.ogg"));
    assert_eq!(backend.clip(backend.last_handle()).unwrap().volume, 1.0);

    ctrl.set_volume(0.6);
    assert_eq!(ctrl.session().volume, 0.6);
    assert_eq!(backend.clip(backend.last_handle()).unwrap().volume, 0.6);
}

#[test]
fn dropping_controller_releases_resource() {
    let backend = ScriptedBackend::new();
    {
        let mut ctrl = backend.controller();
        ctrl.load(source("a.ogg"));
        assert_eq!(backend.live_count(), 1);
    }
    assert_eq!(backend.live_count(), 0);
}

// ===== Most recent load wins =====

#[test]
fn stale_ready_from_superseded_load_is_discarded() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let first = backend.last_handle();
    ctrl.load(source("b.ogg"));
    let second = backend.last_handle();

    assert!(!backend.is_live(first), "previous resource released before new request");
    assert_eq!(ctrl.generation(), Generation(2));

    // A resolves late, after B was requested
    backend.resolve(first, 999.0);
    ctrl.pump();
    assert_eq!(ctrl.phase(), SessionPhase::Loading);
    assert_eq!(ctrl.session().duration_secs, 0.0);
    assert_eq!(ctrl.session().source, Some(source("b.ogg")));

    backend.resolve(second, 42.0);
    ctrl.pump();
    assert_eq!(ctrl.phase(), SessionPhase::Ready);
    assert_eq!(ctrl.session().duration_secs, 42.0);
}

#[test]
fn stale_error_from_superseded_load_is_discarded() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let first = backend.last_handle();
    ctrl.load(source("b.ogg"));
    let second = backend.last_handle();

    backend.resolve(second, 30.0);
    backend.reject(first, "404 not found");
    ctrl.pump();

    assert_eq!(ctrl.phase(), SessionPhase::Ready);
    assert!(ctrl.session().error.is_none());
}

#[test]
fn events_after_release_are_discarded() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let handle = backend.last_handle();
    ctrl.release();

    backend.resolve(handle, 10.0);
    ctrl.pump();

    assert_eq!(ctrl.phase(), SessionPhase::Idle);
    assert_eq!(ctrl.session().duration_secs, 0.0);
}

#[test]
fn reloading_same_source_creates_new_resource() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let first = backend.last_handle();
    backend.resolve(first, 10.0);
    ctrl.pump();

    ctrl.load(source("a.ogg"));
    let second = backend.last_handle();

    assert_ne!(first, second);
    assert_eq!(ctrl.phase(), SessionPhase::Loading);
    assert_eq!(ctrl.session().duration_secs, 0.0);
}

// ===== Mount-style source changes =====

#[test]
fn set_source_keeps_unchanged_session() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.set_source(Some(source("a.ogg")));
    backend.resolve(backend.last_handle(), 10.0);
    ctrl.pump();
    ctrl.toggle_play();

    ctrl.set_source(Some(source("a.ogg")));
    assert_eq!(backend.created().len(), 1);
    assert!(ctrl.session().playing);

    ctrl.set_source(Some(source("b.ogg")));
    assert_eq!(backend.created().len(), 2);
    assert_eq!(ctrl.phase(), SessionPhase::Loading);

    ctrl.set_source(None);
    assert_eq!(ctrl.phase(), SessionPhase::Idle);
    assert_eq!(backend.live_count(), 0);
}

#[test]
fn set_source_retries_errored_source() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.set_source(Some(source("a.ogg")));
    backend.reject(backend.last_handle(), "decode error");
    ctrl.pump();
    assert_eq!(ctrl.phase(), SessionPhase::Errored);

    ctrl.set_source(Some(source("a.ogg")));
    assert_eq!(ctrl.phase(), SessionPhase::Loading);
    assert_eq!(backend.created().len(), 2);
}

// ===== Play / pause =====

#[test]
fn toggle_play_ignored_while_loading_or_idle() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.toggle_play();
    assert!(!ctrl.session().playing);

    ctrl.load(source("a.ogg"));
    ctrl.toggle_play();
    assert!(!ctrl.session().playing);
    assert!(!backend.clip(backend.last_handle()).unwrap().playing);
}

#[test]
fn play_failure_sets_playback_failed() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let handle = backend.last_handle();
    backend.resolve(handle, 10.0);
    ctrl.pump();

    backend.fail_next_play("output device lost");
    ctrl.toggle_play();

    assert!(!ctrl.session().playing);
    let error = ctrl.session().error.clone().unwrap();
    assert_eq!(error.kind, ErrorKind::PlaybackFailed);
    assert_eq!(error.message, "Backend error: output device lost");
    assert_eq!(ctrl.phase(), SessionPhase::Errored);
    assert!(!backend.is_live(handle), "failed resource is released");
    assert_eq!(ctrl.session().source, Some(source("a.ogg")));
}

#[test]
fn playback_error_event_stops_playback() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let handle = backend.last_handle();
    backend.resolve(handle, 10.0);
    ctrl.pump();
    ctrl.toggle_play();

    backend.break_playback(handle, "stream interrupted");
    ctrl.pump();

    assert!(!ctrl.session().playing);
    assert_eq!(
        ctrl.session().error.as_ref().map(|e| e.kind),
        Some(ErrorKind::PlaybackFailed)
    );
    assert!(ctrl.progress_ticket().is_none());
}

// ===== Seek / stop =====

#[test]
fn seek_sets_fraction_of_duration() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let handle = backend.last_handle();
    backend.resolve(handle, 200.0);
    ctrl.pump();

    ctrl.seek(0.25);
    assert_eq!(ctrl.session().position_secs, 50.0);
    assert_eq!(backend.clip(handle).unwrap().position, 50.0);

    ctrl.seek(7.0);
    assert_eq!(ctrl.session().position_secs, 200.0);

    ctrl.seek(-1.0);
    assert_eq!(ctrl.session().position_secs, 0.0);
}

#[test]
fn seek_while_loading_is_noop() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    ctrl.drain_events();
    ctrl.seek(0.5);

    assert_eq!(ctrl.session().position_secs, 0.0);
    assert!(ctrl.drain_events().is_empty());
}

#[test]
fn seek_failure_sets_playback_failed() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    backend.resolve(backend.last_handle(), 100.0);
    ctrl.pump();

    backend.fail_next_seek("not seekable");
    ctrl.seek(0.5);

    assert_eq!(ctrl.phase(), SessionPhase::Errored);
    assert_eq!(ctrl.session().position_secs, 0.0);
}

#[test]
fn stop_rewinds_but_keeps_source() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let handle = backend.last_handle();
    backend.resolve(handle, 100.0);
    ctrl.pump();
    ctrl.toggle_play();
    ctrl.seek(0.6);

    ctrl.stop();

    assert_eq!(ctrl.session().position_secs, 0.0);
    assert!(!ctrl.session().playing);
    assert_eq!(ctrl.session().source, Some(source("a.ogg")));
    assert_eq!(ctrl.phase(), SessionPhase::Ready);
    assert!(backend.is_live(handle));
    assert_eq!(backend.clip(handle).unwrap().position, 0.0);
}

// ===== Volume =====

#[test]
fn volume_applies_immediately_and_persists_across_loads() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let first = backend.last_handle();
    backend.resolve(first, 10.0);
    ctrl.pump();

    // Paused: still applied
    ctrl.set_volume(0.3);
    assert_eq!(backend.clip(first).unwrap().volume, 0.3);

    ctrl.load(source("b.ogg"));
    let second = backend.last_handle();
    assert_eq!(backend.clip(second).unwrap().volume, 0.3);
    assert_eq!(ctrl.session().volume, 0.3);
}

#[test]
fn volume_set_before_first_load_is_remembered() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.set_volume(1.5);
    assert_eq!(ctrl.session().volume, 1.0);
    ctrl.set_volume(0.2);

    ctrl.load(source("a.ogg"));
    assert_eq!(backend.clip(backend.last_handle()).unwrap().volume, 0.2);
}

#[test]
fn nan_volume_is_ignored() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.set_volume(0.4);
    ctrl.set_volume(f32::NAN);
    assert_eq!(ctrl.session().volume, 0.4);
}

#[test]
fn initial_volume_comes_from_config() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller_with(PlaybackConfig {
        initial_volume: 0.5,
        streaming: false,
        ..PlaybackConfig::default()
    });

    ctrl.load(source("a.ogg"));
    let clip = backend.clip(backend.last_handle()).unwrap();
    assert_eq!(clip.volume, 0.5);
    assert!(!clip.streaming);
}

// ===== Failures =====

#[test]
fn load_failure_then_successful_reload_clears_error() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("broken.ogg"));
    let handle = backend.last_handle();
    backend.reject(handle, "unsupported codec");
    ctrl.pump();

    assert_eq!(ctrl.phase(), SessionPhase::Errored);
    assert!(!ctrl.session().playing);
    let error = ctrl.session().error.clone().unwrap();
    assert_eq!(error.kind, ErrorKind::LoadFailed);
    assert_eq!(error.message, "unsupported codec");
    assert!(!backend.is_live(handle));

    // Errored sessions do not play
    ctrl.toggle_play();
    assert!(!ctrl.session().playing);

    ctrl.load(source("fixed.ogg"));
    assert!(ctrl.session().error.is_none());
    backend.resolve(backend.last_handle(), 12.0);
    ctrl.pump();
    assert_eq!(ctrl.phase(), SessionPhase::Ready);
    assert!(ctrl.session().error.is_none());
}

#[test]
fn synchronous_create_failure_surfaces_message() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    backend.fail_next_create("no such file");
    ctrl.load(source("gone.ogg"));

    assert_eq!(ctrl.phase(), SessionPhase::Errored);
    assert_eq!(
        ctrl.session().error.as_ref().map(|e| e.message.as_str()),
        Some("Backend error: no such file")
    );
    assert_eq!(backend.live_count(), 0);
}

// ===== End of media =====

#[test]
fn ended_stops_playback_and_restart_rewinds() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let handle = backend.last_handle();
    backend.resolve(handle, 30.0);
    ctrl.pump();
    ctrl.toggle_play();

    backend.finish(handle);
    ctrl.pump();

    assert!(!ctrl.session().playing);
    assert_eq!(ctrl.session().position_secs, 30.0);
    assert_eq!(ctrl.session().progress(), 1.0);
    assert!(ctrl.progress_ticket().is_none());
    assert!(ctrl.drain_events().contains(&PlaybackEvent::Ended));

    ctrl.toggle_play();
    assert!(ctrl.session().playing);
    assert_eq!(ctrl.session().position_secs, 0.0);
    assert_eq!(backend.clip(handle).unwrap().position, 0.0);
}

// ===== Progress telemetry =====

#[test]
fn update_samples_progress_once_per_interval() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let handle = backend.last_handle();
    backend.resolve(handle, 60.0);
    ctrl.update(Duration::ZERO);
    ctrl.toggle_play();

    backend.advance(handle, 0.5);
    ctrl.update(Duration::from_millis(100));
    assert_eq!(ctrl.session().position_secs, 0.5);

    backend.advance(handle, 0.5);
    ctrl.update(Duration::from_millis(600));
    assert_eq!(ctrl.session().position_secs, 0.5, "not due yet");

    ctrl.update(Duration::from_millis(1100));
    assert_eq!(ctrl.session().position_secs, 1.0);
}

#[test]
fn paused_session_is_not_sampled() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let handle = backend.last_handle();
    backend.resolve(handle, 60.0);
    ctrl.pump();
    ctrl.toggle_play();
    backend.advance(handle, 3.0);
    ctrl.toggle_play();
    assert_eq!(ctrl.session().position_secs, 3.0, "pause publishes final position");

    backend.advance(handle, 10.0);
    ctrl.update(SECOND * 5);
    assert_eq!(ctrl.session().position_secs, 3.0);
}

#[test]
fn sampled_position_never_exceeds_duration() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    let handle = backend.last_handle();
    backend.resolve(handle, 10.0);
    ctrl.pump();
    ctrl.toggle_play();

    backend.advance(handle, 12.5);
    ctrl.update(SECOND);
    assert_eq!(ctrl.session().position_secs, 10.0);
}

#[test]
fn progress_ticket_is_stale_after_pause_and_reload() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    backend.resolve(backend.last_handle(), 60.0);
    ctrl.pump();
    assert!(ctrl.progress_ticket().is_none());

    ctrl.toggle_play();
    let ticket = ctrl.progress_ticket().unwrap();
    assert!(ctrl.on_progress_tick(ticket));

    ctrl.toggle_play();
    assert!(!ctrl.on_progress_tick(ticket), "paused");

    ctrl.toggle_play();
    let resumed = ctrl.progress_ticket().unwrap();
    assert_ne!(ticket, resumed);
    assert!(ctrl.on_progress_tick(resumed));

    ctrl.load(source("b.ogg"));
    backend.resolve(backend.last_handle(), 60.0);
    ctrl.pump();
    ctrl.toggle_play();
    assert!(!ctrl.on_progress_tick(resumed), "superseded session");
}

// ===== Events =====

#[test]
fn load_and_play_emit_view_events_in_order() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    backend.resolve(backend.last_handle(), 2.5);
    ctrl.pump();
    ctrl.toggle_play();

    let events = ctrl.drain_events();
    assert_eq!(
        events,
        vec![
            PlaybackEvent::SourceChanged {
                source: Some(source("a.ogg"))
            },
            PlaybackEvent::StateChanged {
                phase: SessionPhase::Loading,
                playing: false
            },
            PlaybackEvent::Ready { duration_ms: 2500 },
            PlaybackEvent::StateChanged {
                phase: SessionPhase::Ready,
                playing: false
            },
            PlaybackEvent::StateChanged {
                phase: SessionPhase::Ready,
                playing: true
            },
        ]
    );
}

#[test]
fn failure_emits_error_event() {
    let backend = ScriptedBackend::new();
    let mut ctrl = backend.controller();

    ctrl.load(source("a.ogg"));
    backend.reject(backend.last_handle(), "bad header");
    ctrl.pump();

    let events = ctrl.drain_events();
    assert!(events.contains(&PlaybackEvent::Error {
        kind: ErrorKind::LoadFailed,
        message: "bad header".to_string()
    }));
    assert_eq!(
        events.last(),
        Some(&PlaybackEvent::StateChanged {
            phase: SessionPhase::Errored,
            playing: false
        })
    );
}
