//! Background clip loader
//!
//! Decoding (and resampling) a file can take hundreds of milliseconds, so it
//! runs on a dedicated thread. The backend queues requests and polls for
//! outcomes without blocking.
//!
//! ```text
//! Controller thread               Loader thread
//!        │                              │
//!        │  request(handle, path)       │
//!        │─────────────────────────────>│
//!        │                              │ decode_file() + resample()
//!        │                              │
//!        │  poll() -> Some(outcome)     │
//!        │<─────────────────────────────│
//! ```
//!
//! Outcomes carry the handle they were requested for. Cancelled handles are
//! skipped if the thread has not started on them yet, and their outcomes are
//! never returned from `poll`.

use crate::decode::{self, DecodedClip};
use crate::error::{DesktopError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use nostalgia_playback::MediaHandle;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Request to decode one file
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub handle: MediaHandle,
    pub path: PathBuf,
    /// Output sample rate the clip must be converted to
    pub target_rate: u32,
}

/// Result of one request
#[derive(Debug)]
pub struct LoadOutcome {
    pub handle: MediaHandle,
    pub result: Result<DecodedClip>,
}

/// Background clip loader
pub struct ClipLoader {
    request_tx: Sender<LoadRequest>,
    outcome_rx: Receiver<LoadOutcome>,
    // Entries are removed when the thread skips them or `poll` drops them
    cancelled: Arc<Mutex<HashSet<MediaHandle>>>,
    // Dropping `request_tx` ends the thread
    _thread: JoinHandle<()>,
}

impl ClipLoader {
    /// Spawn the loader thread
    pub fn spawn() -> Result<Self> {
        let (request_tx, request_rx) = unbounded::<LoadRequest>();
        let (outcome_tx, outcome_rx) = unbounded::<LoadOutcome>();
        let cancelled = Arc::new(Mutex::new(HashSet::new()));

        let thread = {
            let cancelled = Arc::clone(&cancelled);
            thread::Builder::new()
                .name("nostalgia-loader".to_string())
                .spawn(move || Self::run(&request_rx, &outcome_tx, &cancelled))?
        };

        Ok(Self {
            request_tx,
            outcome_rx,
            cancelled,
            _thread: thread,
        })
    }

    /// Queue a request (non-blocking)
    pub fn request(&self, request: LoadRequest) -> Result<()> {
        self.request_tx
            .send(request)
            .map_err(|_| DesktopError::Disconnected("loader"))
    }

    /// Give up on a queued or running request
    ///
    /// Only for handles whose outcome has not been polled yet.
    pub fn cancel(&self, handle: MediaHandle) {
        if let Ok(mut cancelled) = self.cancelled.lock() {
            cancelled.insert(handle);
        }
    }

    /// Next finished outcome, if any (non-blocking)
    pub fn poll(&self) -> Option<LoadOutcome> {
        loop {
            match self.outcome_rx.try_recv() {
                Ok(outcome) => {
                    if take_cancelled(&self.cancelled, outcome.handle) {
                        debug!(handle = %outcome.handle, "dropping cancelled outcome");
                        continue;
                    }
                    return Some(outcome);
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    warn!("loader outcome channel disconnected");
                    return None;
                }
            }
        }
    }

    fn run(
        request_rx: &Receiver<LoadRequest>,
        outcome_tx: &Sender<LoadOutcome>,
        cancelled: &Mutex<HashSet<MediaHandle>>,
    ) {
        debug!("loader thread started");

        while let Ok(request) = request_rx.recv() {
            let start = Instant::now();
            let handle = request.handle;

            if take_cancelled(cancelled, handle) {
                debug!(%handle, "skipping cancelled request");
                continue;
            }

            let result = decode::decode_file(&request.path)
                .and_then(|clip| decode::resample(clip, request.target_rate));

            match &result {
                Ok(clip) => info!(
                    %handle,
                    path = %request.path.display(),
                    duration_secs = clip.duration_secs(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "clip loaded"
                ),
                Err(e) => warn!(
                    %handle,
                    path = %request.path.display(),
                    error = %e,
                    "clip failed to load"
                ),
            }

            if outcome_tx.send(LoadOutcome { handle, result }).is_err() {
                break;
            }
        }

        debug!("loader thread exiting");
    }
}

fn take_cancelled(cancelled: &Mutex<HashSet<MediaHandle>>, handle: MediaHandle) -> bool {
    cancelled
        .lock()
        .map(|mut set| set.remove(&handle))
        .unwrap_or(false)
}
