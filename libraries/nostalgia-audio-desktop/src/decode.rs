//! Whole-file decoding with Symphonia
//!
//! Gallery pieces are short, so the desktop backend decodes a source fully
//! up front and plays it from memory. Every sample format Symphonia produces
//! goes through the same interleaving path; only the normalization differs.
//!
//! Output is always interleaved stereo `f32` in [-1.0, 1.0]:
//! - mono is duplicated to both channels
//! - more than two channels keep the first two

use crate::error::{DesktopError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

/// Output channel count of every decoded clip
pub const CHANNELS: usize = 2;

/// Fully decoded clip
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClip {
    /// Interleaved stereo samples
    pub samples: Vec<f32>,
    /// Frames per second
    pub sample_rate: u32,
}

impl DecodedClip {
    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / CHANNELS
    }

    /// Length in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode an audio file into memory
pub fn decode_file(path: &Path) -> Result<DecodedClip> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| DesktopError::Decode("no audio track found".into()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder =
        symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut sample_rate = codec_params.sample_rate;
    let mut samples = match codec_params.n_frames {
        Some(frames) => Vec::with_capacity(frames as usize * CHANNELS),
        None => Vec::new(),
    };

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                sample_rate.get_or_insert(decoded.spec().rate);
                append_stereo(decoded, &mut samples);
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                // Corrupt packet; keep going
                warn!(path = %path.display(), %msg, "skipping undecodable packet");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let sample_rate =
        sample_rate.ok_or_else(|| DesktopError::Decode("unknown sample rate".into()))?;

    let clip = DecodedClip {
        samples,
        sample_rate,
    };
    debug!(
        path = %path.display(),
        sample_rate,
        duration_secs = clip.duration_secs(),
        "decoded clip"
    );
    Ok(clip)
}

/// Convert a clip to `target_rate`
///
/// Returns the clip unchanged when the rates already match.
pub fn resample(clip: DecodedClip, target_rate: u32) -> Result<DecodedClip> {
    if clip.sample_rate == target_rate || clip.frames() == 0 {
        return Ok(DecodedClip {
            samples: clip.samples,
            sample_rate: target_rate,
        });
    }
    if target_rate == 0 {
        return Err(DesktopError::ResampleError("target rate is zero".into()));
    }

    let frames = clip.frames();
    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(target_rate) / f64::from(clip.sample_rate),
        2.0,
        params,
        frames,
        CHANNELS,
    )
    .map_err(|e| DesktopError::ResampleError(e.to_string()))?;

    let mut deinterleaved = vec![Vec::with_capacity(frames); CHANNELS];
    for frame in clip.samples.chunks_exact(CHANNELS) {
        for (channel, sample) in deinterleaved.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }

    let resampled = resampler
        .process(&deinterleaved, None)
        .map_err(|e| DesktopError::ResampleError(e.to_string()))?;

    let output_frames = resampled.first().map_or(0, Vec::len);
    let mut samples = Vec::with_capacity(output_frames * CHANNELS);
    for frame_idx in 0..output_frames {
        for channel in &resampled {
            samples.push(channel[frame_idx]);
        }
    }

    debug!(
        from = clip.sample_rate,
        to = target_rate,
        frames_in = frames,
        frames_out = output_frames,
        "resampled clip"
    );

    Ok(DecodedClip {
        samples,
        sample_rate: target_rate,
    })
}

/// Append a decoded packet as interleaved stereo f32
fn append_stereo(decoded: AudioBufferRef<'_>, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::F32(buf) => interleave(&buf, out, |s| s),
        AudioBufferRef::F64(buf) => interleave(&buf, out, |s| s as f32),

        AudioBufferRef::S8(buf) => interleave(&buf, out, |s| s as f32 / i8::MAX as f32),
        AudioBufferRef::S16(buf) => interleave(&buf, out, |s| s as f32 / i16::MAX as f32),
        AudioBufferRef::S24(buf) => interleave(&buf, out, |s| s.inner() as f32 / 8_388_607.0),
        AudioBufferRef::S32(buf) => interleave(&buf, out, |s| s as f32 / i32::MAX as f32),

        AudioBufferRef::U8(buf) => {
            interleave(&buf, out, |s| (s as f32 / u8::MAX as f32) * 2.0 - 1.0);
        }
        AudioBufferRef::U16(buf) => {
            interleave(&buf, out, |s| (s as f32 / u16::MAX as f32) * 2.0 - 1.0);
        }
        AudioBufferRef::U24(buf) => {
            interleave(&buf, out, |s| (s.inner() as f32 / 16_777_215.0) * 2.0 - 1.0);
        }
        AudioBufferRef::U32(buf) => {
            interleave(&buf, out, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0);
        }
    }
}

fn interleave<T, F>(buf: &AudioBuffer<T>, out: &mut Vec<f32>, normalize: F)
where
    T: Sample,
    F: Fn(T) -> f32,
{
    let channels = buf.spec().channels.count();
    if channels == 0 {
        return;
    }

    let left = buf.chan(0);
    let right = if channels > 1 { buf.chan(1) } else { left };

    out.reserve(buf.frames() * CHANNELS);
    for (l, r) in left.iter().zip(right) {
        out.push(normalize(*l));
        out.push(normalize(*r));
    }
}
