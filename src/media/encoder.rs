//! Re-encoding and cutting via ffmpeg.

use crate::config::EncodeSettings;
use crate::error::{KlippError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// One ffmpeg invocation: re-encode `input` to `output`, optionally seeking
/// to an offset and limiting the output length.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Seek offset in seconds applied before decoding.
    pub seek_seconds: Option<f64>,
    /// Maximum output length in seconds.
    pub duration_limit: Option<f64>,
}

impl EncodeJob {
    /// Full re-encode, no seek or length limit.
    pub fn full(input: PathBuf, output: PathBuf) -> Self {
        Self {
            input,
            output,
            seek_seconds: None,
            duration_limit: None,
        }
    }

    /// Cut a window out of the input.
    pub fn window(input: PathBuf, output: PathBuf, start: f64, duration: f64) -> Self {
        Self {
            input,
            output,
            seek_seconds: Some(start),
            duration_limit: Some(duration),
        }
    }
}

/// Trait for the codec tool.
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    async fn encode(&self, job: &EncodeJob) -> Result<()>;
}

/// ffmpeg encoder with a fixed delivery profile.
pub struct FfmpegEncoder {
    video_codec: String,
    audio_codec: String,
    audio_bitrate: String,
    preset: String,
    timeout: Duration,
}

impl FfmpegEncoder {
    pub fn new(settings: &EncodeSettings) -> Self {
        Self {
            video_codec: settings.video_codec.clone(),
            audio_codec: settings.audio_codec.clone(),
            audio_bitrate: settings.audio_bitrate.clone(),
            preset: settings.preset.clone(),
            timeout: Duration::from_secs(settings.timeout_seconds),
        }
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    async fn encode(&self, job: &EncodeJob) -> Result<()> {
        debug!(
            "Encoding {} -> {} (seek {:?}, limit {:?})",
            job.input.display(),
            job.output.display(),
            job.seek_seconds,
            job.duration_limit
        );

        let mut cmd = Command::new("ffmpeg");
        // Seek before the input for fast keyframe seeking
        if let Some(seek) = job.seek_seconds {
            cmd.arg("-ss").arg(format!("{:.3}", seek));
        }
        cmd.arg("-i").arg(&job.input);
        if let Some(limit) = job.duration_limit {
            cmd.arg("-t").arg(format!("{:.3}", limit));
        }
        cmd.arg("-c:v").arg(&self.video_codec)
            .arg("-c:a").arg(&self.audio_codec)
            .arg("-b:a").arg(&self.audio_bitrate)
            .arg("-preset").arg(&self.preset)
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg(&job.output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                KlippError::Encode(format!(
                    "ffmpeg timed out after {}s for {}",
                    self.timeout.as_secs(),
                    job.input.display()
                ))
            })?;

        match result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(KlippError::Encode(format!("ffmpeg failed: {err}")))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(KlippError::ToolNotFound("ffmpeg".into()))
            }
            Err(e) => Err(KlippError::Encode(format!("ffmpeg error: {e}"))),
        }
    }
}
