//! Host loop driving one playback session to completion
//!
//! The controller is single-threaded and pull-based: this loop calls
//! `update` on a fixed period, reacts to the queued events, and sleeps.

use anyhow::{bail, Result};
use nostalgia_playback::{
    format_time, MediaBackend, PlaybackController, PlaybackEvent, SessionPhase, SourceRef,
};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Adjustments applied once the source is ready
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayOptions {
    /// Volume in [0, 1]
    pub volume: Option<f32>,
    /// Start position as a fraction of the duration
    pub start: Option<f64>,
}

/// How a `play` run ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayReport {
    pub duration_secs: f64,
    pub position_secs: f64,
}

/// Load `source`, play it to the end, and log progress
pub fn play<B: MediaBackend>(
    controller: &mut PlaybackController<B>,
    source: SourceRef,
    options: PlayOptions,
    poll_interval: Duration,
) -> Result<PlayReport> {
    if let Some(volume) = options.volume {
        controller.set_volume(volume);
    }
    controller.load(source);

    let clock = Instant::now();
    loop {
        controller.update(clock.elapsed());

        for event in controller.drain_events() {
            match event {
                PlaybackEvent::Ready { .. } => {
                    info!(duration = %controller.session().duration_label(), "ready");
                    if let Some(fraction) = options.start {
                        controller.seek(fraction);
                    }
                    controller.toggle_play();
                }
                PlaybackEvent::PositionUpdate { .. } => {
                    let session = controller.session();
                    info!(
                        "{} / {}",
                        session.current_time_label(),
                        session.duration_label()
                    );
                }
                PlaybackEvent::Ended => {
                    let session = controller.session();
                    return Ok(PlayReport {
                        duration_secs: session.duration(),
                        position_secs: session.current_time(),
                    });
                }
                PlaybackEvent::Error { kind, message } => {
                    bail!("{kind}: {message}");
                }
                other => debug!(?other, "playback event"),
            }
        }

        std::thread::sleep(poll_interval);
    }
}

/// Load `source` and return its duration in seconds
pub fn probe<B: MediaBackend>(
    controller: &mut PlaybackController<B>,
    source: SourceRef,
    poll_interval: Duration,
) -> Result<f64> {
    controller.load(source);

    let clock = Instant::now();
    while controller.phase() == SessionPhase::Loading {
        std::thread::sleep(poll_interval);
        controller.update(clock.elapsed());
    }

    let session = controller.session();
    if let Some(error) = &session.error {
        bail!("{error}");
    }

    info!(
        duration = %format_time(session.duration()),
        "probed source"
    );
    let duration = session.duration();
    controller.release();
    Ok(duration)
}
