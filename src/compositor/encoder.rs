//! Media encoder seam
//!
//! The compositor hands a finished audio mix and a still image to a
//! [`MediaEncoder`]. The default implementation shells out to `ffmpeg`.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::EncoderConfig;
use crate::engine::{export_wav, AudioBuffer};
use crate::error::{Result, SomnusError};

/// How the still image is framed in the video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameHandling {
    /// Scale to cover the frame, then center-crop to it
    Fit { width: u32, height: u32 },
    /// Use the image at its own size, no filter graph
    Native,
}

/// Everything an encoder needs for one video
#[derive(Debug, Clone, Copy)]
pub struct EncodeJob<'a> {
    pub audio: &'a AudioBuffer,
    pub image: &'a Path,
    pub duration_secs: f64,
    pub frame: FrameHandling,
    /// Exact path the encoder must write to
    pub output: &'a Path,
}

/// Turns a still image and an audio buffer into a video file
pub trait MediaEncoder: Send + Sync {
    fn encode(&self, job: &EncodeJob<'_>) -> Result<()>;

    /// Encoder name for logs
    fn name(&self) -> &str;
}

/// Encoder backed by the `ffmpeg` command-line tool
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: String,
    fps: u32,
    audio_bitrate: String,
}

impl FfmpegEncoder {
    pub fn new(config: &EncoderConfig) -> Self {
        Self {
            program: config.program.clone(),
            fps: config.fps,
            audio_bitrate: config.audio_bitrate.clone(),
        }
    }

    /// Full argument list for one job, with the mix already written to `audio_path`
    pub fn command_args(&self, job: &EncodeJob<'_>, audio_path: &Path) -> Vec<String> {
        let fps = self.fps.to_string();
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-loop".into(),
            "1".into(),
            "-framerate".into(),
            fps.clone(),
            "-i".into(),
            job.image.to_string_lossy().into_owned(),
            "-i".into(),
            audio_path.to_string_lossy().into_owned(),
        ];

        if let FrameHandling::Fit { width, height } = job.frame {
            args.push("-vf".into());
            args.push(format!(
                "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
                w = width,
                h = height
            ));
        }

        args.extend(
            [
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-r",
                fps.as_str(),
                "-c:a",
                "aac",
                "-b:a",
                self.audio_bitrate.as_str(),
                "-movflags",
                "+faststart",
                "-t",
            ]
            .map(String::from),
        );
        args.push(format!("{:.3}", job.duration_secs));
        args.extend(["-shortest", "-f", "mp4"].map(String::from));
        args.push(job.output.to_string_lossy().into_owned());
        args
    }
}

impl MediaEncoder for FfmpegEncoder {
    fn encode(&self, job: &EncodeJob<'_>) -> Result<()> {
        let work_dir = tempfile::tempdir()?;
        let audio_path = work_dir.path().join("mix.wav");
        export_wav(job.audio, &audio_path)?;

        let args = self.command_args(job, &audio_path);
        debug!(program = %self.program, ?args, "running encoder");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| SomnusError::EncoderFailed {
                reason: format!("failed to start {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no output");
            return Err(SomnusError::EncoderFailed {
                reason: format!("{} exited with {}: {}", self.program, output.status, detail),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn job<'a>(audio: &'a AudioBuffer, frame: FrameHandling) -> EncodeJob<'a> {
        EncodeJob {
            audio,
            image: Path::new("bg.png"),
            duration_secs: 60.0,
            frame,
            output: Path::new("out/.video.partial.mp4"),
        }
    }

    #[test]
    fn test_fit_frame_args() {
        let encoder = FfmpegEncoder::new(&EncoderConfig::default());
        let audio = AudioBuffer::default();
        let args = encoder.command_args(
            &job(
                &audio,
                FrameHandling::Fit {
                    width: 1920,
                    height: 1080,
                },
            ),
            Path::new("mix.wav"),
        );

        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(
            args[vf + 1],
            "scale=1920:1080:force_original_aspect_ratio=increase,crop=1920:1080"
        );
        for expected in ["libx264", "yuv420p", "+faststart", "aac", "128k", "60.000"] {
            assert!(args.iter().any(|a| a == expected), "missing {}", expected);
        }
        assert_eq!(args.last().unwrap(), "out/.video.partial.mp4");
    }

    #[test]
    fn test_native_frame_has_no_filter() {
        let encoder = FfmpegEncoder::new(&EncoderConfig::default());
        let audio = AudioBuffer::default();
        let args = encoder.command_args(&job(&audio, FrameHandling::Native), Path::new("mix.wav"));
        assert!(!args.iter().any(|a| a == "-vf"));
    }

    #[test]
    fn test_missing_program_is_encoder_failure() {
        let config = EncoderConfig {
            program: "somnus-test-no-such-encoder".to_string(),
            ..EncoderConfig::default()
        };
        let audio = AudioBuffer::silent(100, crate::engine::ChannelLayout::Mono, 8000);
        let err = FfmpegEncoder::new(&config)
            .encode(&job(&audio, FrameHandling::Native))
            .unwrap_err();
        assert_eq!(err.error_code(), "ENCODER_FAILED");
    }
}
