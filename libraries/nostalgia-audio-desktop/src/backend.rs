//! Desktop [`MediaBackend`]: background decoding + a single clip output
//!
//! Every `create` allocates a handle and queues a decode on the
//! [`ClipLoader`]. When the decode finishes the handle becomes ready and a
//! `Ready` event is reported. Only one clip is attached to the output at a
//! time; other ready clips remember their playhead until they are played.
//!
//! Sources are always decoded in full, so `LoadOptions::streaming` has no
//! effect here.

use crate::error::{DesktopError, Result};
use crate::loader::{ClipLoader, LoadOutcome, LoadRequest};
use crate::output::{ClipOutput, CpalOutput};
use nostalgia_playback::{
    BackendEvent, LoadOptions, MediaBackend, MediaHandle, PlaybackError, SourceRef,
};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug)]
enum Slot {
    Pending,
    Ready {
        samples: Arc<Vec<f32>>,
        duration_secs: f64,
        /// Playhead while not attached to the output
        position_secs: f64,
    },
}

#[derive(Debug)]
struct Clip {
    slot: Slot,
    volume: f32,
}

/// Desktop media backend
pub struct DesktopBackend<O: ClipOutput = CpalOutput> {
    loader: ClipLoader,
    output: O,
    next_handle: u64,
    clips: HashMap<MediaHandle, Clip>,
    /// Clip currently loaded into the output
    attached: Option<MediaHandle>,
    events: VecDeque<BackendEvent>,
}

impl DesktopBackend<CpalOutput> {
    /// Open the named output device (or the default) and start the loader
    pub fn open(device_name: Option<&str>) -> Result<Self> {
        Self::with_output(CpalOutput::open(device_name)?)
    }
}

impl<O: ClipOutput> DesktopBackend<O> {
    /// Backend over an existing output
    pub fn with_output(output: O) -> Result<Self> {
        Ok(Self {
            loader: ClipLoader::spawn()?,
            output,
            next_handle: 0,
            clips: HashMap::new(),
            attached: None,
            events: VecDeque::new(),
        })
    }

    /// The output clips are played through
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Number of handles that have not been unloaded
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    fn clip_mut(&mut self, handle: MediaHandle) -> std::result::Result<&mut Clip, PlaybackError> {
        self.clips
            .get_mut(&handle)
            .ok_or(PlaybackError::UnknownHandle(handle))
    }

    /// Make `handle` the output's clip, parking the previous one
    fn attach(&mut self, handle: MediaHandle) -> Result<()> {
        if self.attached == Some(handle) {
            return Ok(());
        }

        if let Some(previous) = self.attached.take() {
            let position = self.output.position_secs();
            self.output.pause()?;
            if let Some(Clip {
                slot: Slot::Ready { position_secs, .. },
                ..
            }) = self.clips.get_mut(&previous)
            {
                *position_secs = position;
            }
        }

        let Some(clip) = self.clips.get(&handle) else {
            return Err(DesktopError::NotReady(handle.to_string()));
        };
        let Slot::Ready {
            samples,
            position_secs,
            ..
        } = &clip.slot
        else {
            return Err(DesktopError::NotReady(handle.to_string()));
        };

        self.output.load(Arc::clone(samples), *position_secs)?;
        self.output.set_volume(clip.volume);
        self.attached = Some(handle);
        debug!(%handle, "clip attached to output");
        Ok(())
    }

    /// Move loader outcomes and output notifications into the event queue
    fn collect(&mut self) {
        while let Some(outcome) = self.loader.poll() {
            self.apply_outcome(outcome);
        }

        let Some(handle) = self.attached else {
            // Errors from an unloaded clip's stream have no owner
            while self.output.poll_error().is_some() {}
            return;
        };

        while let Some(message) = self.output.poll_error() {
            self.events
                .push_back(BackendEvent::PlaybackError { handle, message });
        }

        if self.output.take_ended() {
            if let Some(Clip {
                slot:
                    Slot::Ready {
                        duration_secs,
                        position_secs,
                        ..
                    },
                ..
            }) = self.clips.get_mut(&handle)
            {
                *position_secs = *duration_secs;
            }
            self.events.push_back(BackendEvent::Ended { handle });
        }
    }

    fn apply_outcome(&mut self, outcome: LoadOutcome) {
        let LoadOutcome { handle, result } = outcome;
        let Some(clip) = self.clips.get_mut(&handle) else {
            debug!(%handle, "dropping decode result for unloaded handle");
            return;
        };

        match result {
            Ok(decoded) => {
                let duration_secs = decoded.duration_secs();
                clip.slot = Slot::Ready {
                    samples: Arc::new(decoded.samples),
                    duration_secs,
                    position_secs: 0.0,
                };
                self.events.push_back(BackendEvent::Ready {
                    handle,
                    duration_secs,
                });
            }
            Err(e) => {
                self.clips.remove(&handle);
                self.events.push_back(BackendEvent::LoadError {
                    handle,
                    message: e.to_string(),
                });
            }
        }
    }
}

impl<O: ClipOutput> MediaBackend for DesktopBackend<O> {
    fn create(
        &mut self,
        source: &SourceRef,
        options: &LoadOptions,
    ) -> nostalgia_playback::Result<MediaHandle> {
        let path = source_path(source)?;

        self.next_handle += 1;
        let handle = MediaHandle(self.next_handle);

        self.loader.request(LoadRequest {
            handle,
            path,
            target_rate: self.output.sample_rate(),
        })?;
        self.clips.insert(
            handle,
            Clip {
                slot: Slot::Pending,
                volume: options.volume,
            },
        );

        info!(%handle, %source, "decode requested");
        Ok(handle)
    }

    fn play(&mut self, handle: MediaHandle) -> nostalgia_playback::Result<()> {
        self.clip_mut(handle)?;
        self.attach(handle)?;
        self.output.play()?;
        Ok(())
    }

    fn pause(&mut self, handle: MediaHandle) -> nostalgia_playback::Result<()> {
        self.clip_mut(handle)?;
        if self.attached == Some(handle) {
            self.output.pause()?;
        }
        Ok(())
    }

    fn stop(&mut self, handle: MediaHandle) -> nostalgia_playback::Result<()> {
        let clip = self.clip_mut(handle)?;
        if let Slot::Ready { position_secs, .. } = &mut clip.slot {
            *position_secs = 0.0;
        }
        if self.attached == Some(handle) {
            self.output.stop()?;
        }
        Ok(())
    }

    fn seek(&mut self, handle: MediaHandle, seconds: f64) -> nostalgia_playback::Result<()> {
        let attached = self.attached == Some(handle);
        let clip = self.clip_mut(handle)?;
        let Slot::Ready {
            duration_secs,
            position_secs,
            ..
        } = &mut clip.slot
        else {
            return Err(DesktopError::NotReady(handle.to_string()).into());
        };

        let target = seconds.clamp(0.0, *duration_secs);
        *position_secs = target;
        if attached {
            self.output.seek(target);
        }
        Ok(())
    }

    fn position(&self, handle: MediaHandle) -> f64 {
        if self.attached == Some(handle) {
            return self.output.position_secs();
        }
        match self.clips.get(&handle).map(|clip| &clip.slot) {
            Some(Slot::Ready { position_secs, .. }) => *position_secs,
            _ => 0.0,
        }
    }

    fn duration(&self, handle: MediaHandle) -> f64 {
        match self.clips.get(&handle).map(|clip| &clip.slot) {
            Some(Slot::Ready { duration_secs, .. }) => *duration_secs,
            _ => 0.0,
        }
    }

    fn set_volume(&mut self, handle: MediaHandle, level: f32) -> nostalgia_playback::Result<()> {
        self.clip_mut(handle)?.volume = level;
        if self.attached == Some(handle) {
            self.output.set_volume(level);
        }
        Ok(())
    }

    fn unload(&mut self, handle: MediaHandle) {
        let Some(clip) = self.clips.remove(&handle) else {
            return;
        };
        if matches!(clip.slot, Slot::Pending) {
            self.loader.cancel(handle);
        }
        if self.attached == Some(handle) {
            self.attached = None;
            self.output.unload();
        }
        debug!(%handle, "clip unloaded");
    }

    fn poll_event(&mut self) -> Option<BackendEvent> {
        if self.events.is_empty() {
            self.collect();
        }
        self.events.pop_front()
    }
}

/// Resolve a source URI to a local path
///
/// Accepts `file://` URLs and plain paths. Other schemes are rejected; this
/// backend only reads local files.
pub fn source_path(source: &SourceRef) -> Result<PathBuf> {
    let raw = source.as_str();
    match url::Url::parse(raw) {
        // Single-letter "schemes" are Windows drive letters
        Ok(url) if url.scheme().len() == 1 => Ok(PathBuf::from(raw)),
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|()| DesktopError::UnsupportedSource(raw.to_string())),
        Ok(url) => {
            warn!(scheme = url.scheme(), %source, "remote source rejected");
            Err(DesktopError::UnsupportedSource(raw.to_string()))
        }
        Err(_) => Ok(PathBuf::from(raw)),
    }
}
