//! Audio file I/O for Somnus
//!
//! WAV is read and written with `hound`. Compressed background tracks
//! (MP3, AAC/M4A) are decoded with `symphonia`. Export always goes through
//! [`normalize_and_quantize`], the single float to 16-bit boundary.

use std::fs::File;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, formats::FormatOptions, io::MediaSourceStream,
    meta::MetadataOptions, probe::Hint,
};

use crate::dsp::normalize_and_quantize;
use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::error::{Result, SomnusError};

/// Load an audio file into an [`AudioBuffer`] at its native sample rate
///
/// `.wav` files go through `hound`; anything else is probed by `symphonia`.
/// Files with more than two channels are downmixed to stereo.
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file cannot be decoded
/// * `UnsupportedFormat` - If the sample format is not understood
pub fn import_audio(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(SomnusError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let (interleaved, channels, sample_rate) = if is_wav(path) {
        read_wav(path)?
    } else {
        decode_with_symphonia(path)?
    };

    if channels == 0 {
        return Err(SomnusError::InvalidAudio {
            reason: format!("{} reports zero channels", path.display()),
            source: None,
        });
    }

    let channel_data = deinterleave(&interleaved, channels);
    let buffer = AudioBuffer {
        samples: channel_data,
        sample_rate,
    };

    match buffer.channel_layout() {
        Some(_) => Ok(buffer),
        None => Ok(buffer.into_layout(ChannelLayout::Stereo)),
    }
}

/// Write a buffer as a 16-bit PCM WAV file
///
/// Samples are clamped and quantized; nothing outside [-1, 1] can wrap.
pub fn export_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.channels().max(1) as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(wav_error)?;
    for sample in normalize_and_quantize(&buffer.to_interleaved()) {
        writer.write_sample(sample).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;

    Ok(())
}

/// Write a buffer next to `path` first and rename it into place
///
/// A crash mid-write leaves only the uniquely named temporary sibling, never
/// a truncated file under the canonical name.
pub fn export_wav_atomic(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let temp_path = partial_path(path);
    let written = export_wav(buffer, &temp_path)
        .and_then(|()| std::fs::rename(&temp_path, path).map_err(SomnusError::from));
    if written.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    written
}

/// Uniquely named temporary sibling of `path` used for atomic writes
pub fn partial_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    path.with_file_name(format!(
        ".{}.{}.partial{}",
        file_name,
        uuid::Uuid::new_v4().simple(),
        extension
    ))
}

/// Read the duration of an audio file from its header, if it can be known
/// without decoding the whole stream
pub fn probe_duration(path: &Path) -> Option<f64> {
    if is_wav(path) {
        let reader = WavReader::open(path).ok()?;
        let spec = reader.spec();
        return Some(reader.duration() as f64 / spec.sample_rate as f64);
    }

    let file = File::open(path).ok()?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &extension_hint(path),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()?;
    let track = probed.format.default_track()?;
    let frames = track.codec_params.n_frames?;
    let rate = track.codec_params.sample_rate?;
    Some(frames as f64 / rate as f64)
}

/// Resample every channel of a buffer to `target_rate`
///
/// Uses linear interpolation, which is adequate for quiet background beds.
pub fn resample(buffer: AudioBuffer, target_rate: u32) -> AudioBuffer {
    if buffer.sample_rate == target_rate || buffer.sample_rate == 0 {
        return buffer;
    }
    let ratio = target_rate as f64 / buffer.sample_rate as f64;
    AudioBuffer {
        samples: buffer
            .samples
            .iter()
            .map(|channel| resample_linear(channel, ratio))
            .collect(),
        sample_rate: target_rate,
    }
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn is_wav(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

fn extension_hint(path: &Path) -> Hint {
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }
    hint
}

fn wav_error(e: hound::Error) -> SomnusError {
    match e {
        hound::Error::IoError(io) => SomnusError::Io(io),
        other => SomnusError::InvalidAudio {
            reason: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}

/// Read a WAV file into interleaved f32 samples
fn read_wav(path: &Path) -> Result<(Vec<f32>, usize, u32)> {
    let mut reader = WavReader::open(path).map_err(|e| SomnusError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>(),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect(),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect(),
        // 24-bit stored as i32 in hound
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect(),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect(),
        (SampleFormat::Int, bits) => {
            return Err(SomnusError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits),
            })
        }
    }
    .map_err(|e| SomnusError::InvalidAudio {
        reason: format!("Failed to read samples: {}", e),
        source: Some(Box::new(e)),
    })?;

    Ok((samples, spec.channels as usize, spec.sample_rate))
}

/// Decode any container symphonia understands into interleaved f32 samples
fn decode_with_symphonia(path: &Path) -> Result<(Vec<f32>, usize, u32)> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &extension_hint(path),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| SomnusError::UnsupportedFormat {
            format: format!("{} ({})", path.display(), e),
        })?;
    let mut format_reader = probed.format;

    let track = format_reader
        .default_track()
        .ok_or_else(|| SomnusError::InvalidAudio {
            reason: "No default audio track found".to_string(),
            source: None,
        })?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| SomnusError::InvalidAudio {
            reason: "Unknown sample rate".to_string(),
            source: None,
        })?;
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SomnusError::UnsupportedFormat {
            format: e.to_string(),
        })?;

    let mut all_samples = Vec::<f32>::new();
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            // End of stream
            Err(symphonia::core::errors::Error::IoError(_)) => break,
            Err(e) => {
                return Err(SomnusError::InvalidAudio {
                    reason: format!("Failed to read packet: {}", e),
                    source: Some(Box::new(e)),
                })
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                channels = decoded.spec().channels.count();
                let mut sample_buf =
                    SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                sample_buf.copy_interleaved_ref(decoded);
                all_samples.extend_from_slice(sample_buf.samples());
            }
            // A corrupt packet is skipped; the rest of the stream is still usable.
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                tracing::debug!(path = %path.display(), error = e, "skipping undecodable packet");
            }
            Err(e) => {
                return Err(SomnusError::InvalidAudio {
                    reason: format!("Failed to decode packet: {}", e),
                    source: Some(Box::new(e)),
                })
            }
        }
    }

    Ok((all_samples, channels, sample_rate))
}

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut result = vec![Vec::with_capacity(frames); channels];

    for frame in samples.chunks_exact(channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            result[ch].push(sample);
        }
    }

    result
}

/// Linear interpolation resampling
fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).round() as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ============================================================================
// Tests
// ============================================================================
