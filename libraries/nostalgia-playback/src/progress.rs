//! Periodic progress sampling
//!
//! While a session is playing, position/duration are re-read from the
//! backend on a fixed period and republished into the session snapshot.
//!
//! Two ways to drive it:
//! - polling hosts call `PlaybackController::update(now)` from their loop and
//!   the sampler decides whether a sample is due
//! - timer hosts (`setInterval`, `requestAnimationFrame`) capture a
//!   [`ProgressTicket`] when scheduling and hand it back on every tick
//!
//! Every start/stop bumps an epoch, so a ticket captured before a pause,
//! stop, reload or release is rejected even if the same generation is
//! still loaded.

use crate::resource::Generation;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifies one run of the sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressTicket {
    generation: Generation,
    epoch: u64,
}

impl ProgressTicket {
    /// Generation the ticket was issued for
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// Progress sampling schedule
#[derive(Debug, Clone)]
pub struct ProgressSampler {
    interval: Duration,
    epoch: u64,
    running: Option<Generation>,
    next_due: Option<Duration>,
}

impl ProgressSampler {
    /// Create a stopped sampler
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            epoch: 0,
            running: None,
            next_due: None,
        }
    }

    /// Sampling period
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start sampling for `generation`
    ///
    /// The first poll after starting is due immediately.
    pub fn start(&mut self, generation: Generation) -> ProgressTicket {
        self.epoch = self.epoch.wrapping_add(1);
        self.running = Some(generation);
        self.next_due = None;
        ProgressTicket {
            generation,
            epoch: self.epoch,
        }
    }

    /// Stop sampling; outstanding tickets become stale
    pub fn stop(&mut self) {
        if self.running.take().is_some() {
            self.epoch = self.epoch.wrapping_add(1);
        }
        self.next_due = None;
    }

    /// Whether the sampler is running
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Ticket for the current run
    pub fn ticket(&self) -> Option<ProgressTicket> {
        self.running.map(|generation| ProgressTicket {
            generation,
            epoch: self.epoch,
        })
    }

    /// Whether `ticket` belongs to the current run of `generation`
    pub fn accepts(&self, ticket: ProgressTicket, generation: Generation) -> bool {
        self.running == Some(generation)
            && ticket.generation == generation
            && ticket.epoch == self.epoch
    }

    /// Check whether a sample is due at `now`, and reschedule if it is
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.running.is_none() {
            return false;
        }
        match self.next_due {
            Some(due) if now < due => false,
            _ => {
                self.next_due = Some(now + self.interval);
                true
            }
        }
    }
}
