/// CPAL clip output with a dedicated audio thread
use crate::decode::CHANNELS;
use crate::error::{DesktopError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use nostalgia_playback::Volume;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Sink for one decoded clip at a time
///
/// Clips are interleaved stereo at [`sample_rate`](ClipOutput::sample_rate).
/// Loading a clip replaces the previous one.
pub trait ClipOutput {
    /// Rate clips must be resampled to
    fn sample_rate(&self) -> u32;

    /// Replace the current clip; playback stays paused
    fn load(&mut self, samples: Arc<Vec<f32>>, start_secs: f64) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Pause and rewind
    fn stop(&mut self) -> Result<()>;

    fn seek(&mut self, seconds: f64);

    fn set_volume(&mut self, level: f32);

    /// Drop the current clip
    fn unload(&mut self);

    /// Playhead of the current clip
    fn position_secs(&self) -> f64;

    /// Whether the clip reached its end since the last call
    fn take_ended(&mut self) -> bool;

    /// Next asynchronous stream error, if any
    fn poll_error(&mut self) -> Option<String>;
}

/// Commands sent to the audio thread
enum AudioCommand {
    Play,
    Pause,
    Unload,
    Shutdown,
}

const NO_SEEK: usize = usize::MAX;

/// State shared between the control side and the audio callback
struct OutputState {
    /// Interleaved stereo clip
    ///
    /// Held for the whole callback; transport resets take it too, so a
    /// callback never commits end-of-clip over a stop, seek or reload.
    buffer: Mutex<Arc<Vec<f32>>>,
    /// Playhead in samples (not frames)
    position: AtomicUsize,
    /// Pending seek target in samples, `NO_SEEK` if none
    seek_to: AtomicUsize,
    playing: AtomicBool,
    ended: AtomicBool,
    /// `f32` bits
    volume: AtomicU32,
}

impl OutputState {
    fn new() -> Self {
        Self {
            buffer: Mutex::new(Arc::new(Vec::new())),
            position: AtomicUsize::new(0),
            seek_to: AtomicUsize::new(NO_SEEK),
            playing: AtomicBool::new(false),
            ended: AtomicBool::new(false),
            volume: AtomicU32::new(1.0f32.to_bits()),
        }
    }

    fn volume(&self) -> Volume {
        Volume::new(f32::from_bits(self.volume.load(Ordering::Relaxed)))
    }

    /// Move the playhead; the callback picks it up on its next run
    fn jump_to(&self, sample: usize) {
        self.position.store(sample, Ordering::Relaxed);
        self.seek_to.store(sample, Ordering::Relaxed);
    }

    fn lock_buffer(&self) -> Result<MutexGuard<'_, Arc<Vec<f32>>>> {
        self.buffer
            .lock()
            .map_err(|_| DesktopError::Disconnected("audio"))
    }

    /// Pause, clear the end flag and move the playhead
    ///
    /// Callers hold the buffer lock.
    fn reset(&self, sample: usize) {
        self.playing.store(false, Ordering::Release);
        self.ended.store(false, Ordering::Release);
        self.jump_to(sample);
    }
}

/// CPAL audio output
///
/// A dedicated audio thread owns the CPAL `Stream` (which is not `Send` on
/// every platform). The control side talks to it over a channel and shares
/// the clip, playhead, and volume through [`OutputState`].
pub struct CpalOutput {
    command_tx: Sender<AudioCommand>,
    error_rx: Receiver<String>,
    state: Arc<OutputState>,
    sample_rate: u32,
    /// Length of the loaded clip in samples
    loaded_len: usize,
    _audio_thread: JoinHandle<()>,
}

impl CpalOutput {
    /// Open the named output device, or the default one
    pub fn open(device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => host
                .output_devices()?
                .find(|device| device.name().is_ok_and(|n| n == name))
                .ok_or_else(|| DesktopError::DeviceNotFound(name.to_string()))?,
            None => host
                .default_output_device()
                .ok_or_else(|| DesktopError::DeviceNotFound("default".to_string()))?,
        };

        let supported = device.default_output_config()?;
        let sample_rate = supported.sample_rate();
        let config = supported.config();

        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            sample_rate,
            channels = config.channels,
            "opened output device"
        );

        Self::with_device_and_config(device, config, sample_rate)
    }

    fn with_device_and_config(device: Device, config: StreamConfig, sample_rate: u32) -> Result<Self> {
        let state = Arc::new(OutputState::new());
        let (command_tx, command_rx) = bounded::<AudioCommand>(32);
        let (error_tx, error_rx) = unbounded::<String>();

        let thread_state = Arc::clone(&state);
        let audio_thread = thread::Builder::new()
            .name("nostalgia-audio".to_string())
            .spawn(move || {
                Self::audio_thread_run(device, config, thread_state, command_rx, error_tx);
            })?;

        Ok(Self {
            command_tx,
            error_rx,
            state,
            sample_rate,
            loaded_len: 0,
            _audio_thread: audio_thread,
        })
    }

    fn send(&self, command: AudioCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| DesktopError::Disconnected("audio"))
    }

    /// Audio thread main loop; owns the stream
    fn audio_thread_run(
        device: Device,
        config: StreamConfig,
        state: Arc<OutputState>,
        command_rx: Receiver<AudioCommand>,
        error_tx: Sender<String>,
    ) {
        let mut stream: Option<Stream> = None;

        while let Ok(cmd) = command_rx.recv() {
            match cmd {
                AudioCommand::Play => {
                    if stream.is_none() {
                        match Self::build_stream(&device, &config, &state, &error_tx) {
                            Ok(s) => stream = Some(s),
                            Err(e) => {
                                state.playing.store(false, Ordering::Release);
                                error_tx.send(e.to_string()).ok();
                                continue;
                            }
                        }
                    }
                    if let Some(s) = &stream {
                        if let Err(e) = s.play() {
                            state.playing.store(false, Ordering::Release);
                            error_tx.send(DesktopError::from(e).to_string()).ok();
                        }
                    }
                }
                AudioCommand::Pause => {
                    if let Some(s) = &stream {
                        if let Err(e) = s.pause() {
                            // Callback already renders silence
                            debug!(error = %e, "stream pause failed");
                        }
                    }
                }
                AudioCommand::Unload => {
                    stream = None;
                }
                AudioCommand::Shutdown => break,
            }
        }

        debug!("audio thread exiting");
    }

    fn build_stream(
        device: &Device,
        config: &StreamConfig,
        state: &Arc<OutputState>,
        error_tx: &Sender<String>,
    ) -> Result<Stream> {
        let channels = usize::from(config.channels);
        let callback_state = Arc::clone(state);
        let stream_errors = error_tx.clone();

        let stream = device.build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                render(data, channels, &callback_state);
            },
            move |err| {
                error!(error = %err, "audio stream error");
                stream_errors.send(err.to_string()).ok();
            },
            None,
        )?;
        Ok(stream)
    }

    fn seconds_to_sample(&self, seconds: f64) -> usize {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        let frame = (seconds * f64::from(self.sample_rate)) as usize;
        (frame * CHANNELS).min(self.loaded_len)
    }
}

/// Audio callback body (runs on the real-time thread)
///
/// Fills `data` (interleaved, `channels` wide) from the shared clip and
/// advances the playhead. Silence when paused or past the end.
fn render(data: &mut [f32], channels: usize, state: &OutputState) {
    let Ok(buffer) = state.buffer.lock() else {
        data.fill(0.0);
        return;
    };
    if channels == 0 || !state.playing.load(Ordering::Acquire) {
        data.fill(0.0);
        return;
    }

    let mut pos = state.position.load(Ordering::Relaxed);
    let requested = state.seek_to.swap(NO_SEEK, Ordering::Relaxed);
    if requested != NO_SEEK {
        pos = requested;
    }

    for frame in data.chunks_mut(channels) {
        let Some(&[left, right]) = buffer.get(pos..pos + CHANNELS) else {
            frame.fill(0.0);
            continue;
        };
        match frame {
            [mono] => *mono = (left + right) * 0.5,
            [l, r, rest @ ..] => {
                *l = left;
                *r = right;
                rest.fill(0.0);
            }
            [] => {}
        }
        pos += CHANNELS;
    }

    state.volume().apply(data);

    let end = buffer.len();
    state.position.store(pos.min(end), Ordering::Relaxed);
    if pos >= end {
        state.playing.store(false, Ordering::Release);
        state.ended.store(true, Ordering::Release);
    }
}

impl ClipOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn load(&mut self, samples: Arc<Vec<f32>>, start_secs: f64) -> Result<()> {
        self.loaded_len = samples.len();
        let start = self.seconds_to_sample(start_secs);

        let mut buffer = self.state.lock_buffer()?;
        *buffer = samples;
        self.state.reset(start);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.state.ended.store(false, Ordering::Release);
        self.state.playing.store(true, Ordering::Release);
        self.send(AudioCommand::Play)
    }

    fn pause(&mut self) -> Result<()> {
        self.state.playing.store(false, Ordering::Release);
        self.send(AudioCommand::Pause)
    }

    fn stop(&mut self) -> Result<()> {
        let guard = self.state.lock_buffer()?;
        self.state.reset(0);
        drop(guard);
        self.send(AudioCommand::Pause)
    }

    fn seek(&mut self, seconds: f64) {
        let target = self.seconds_to_sample(seconds);
        let guard = self.state.lock_buffer();
        self.state.jump_to(target);
        drop(guard);
    }

    fn set_volume(&mut self, level: f32) {
        self.state.volume.store(level.to_bits(), Ordering::Relaxed);
    }

    fn unload(&mut self) {
        if let Ok(mut buffer) = self.state.lock_buffer() {
            *buffer = Arc::new(Vec::new());
        }
        self.state.reset(0);
        self.loaded_len = 0;
        self.send(AudioCommand::Unload).ok();
    }

    fn position_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        let frames = self.state.position.load(Ordering::Relaxed) / CHANNELS;
        frames as f64 / f64::from(self.sample_rate)
    }

    fn take_ended(&mut self) -> bool {
        self.state.ended.swap(false, Ordering::AcqRel)
    }

    fn poll_error(&mut self) -> Option<String> {
        self.error_rx.try_recv().ok()
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        // Audio thread drops the stream and exits
        self.send(AudioCommand::Shutdown).ok();
    }
}
