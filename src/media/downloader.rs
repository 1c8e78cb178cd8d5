//! Full source-video download via yt-dlp.

use crate::config::DownloadSettings;
use crate::error::{KlippError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::info;

/// Trait for downloading a source video to a local file.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Download the video at `source_url` to exactly `dest`.
    async fn download(&self, source_url: &str, dest: &Path) -> Result<()>;
}

/// Downloads videos with yt-dlp under fixed format constraints.
pub struct YtDlpDownloader {
    format: String,
    format_sort: String,
    cookies_file: Option<PathBuf>,
    timeout: Duration,
}

impl YtDlpDownloader {
    pub fn new(settings: &DownloadSettings, cookies_file: Option<PathBuf>) -> Self {
        Self {
            format: settings.format.clone(),
            format_sort: settings.format_sort.clone(),
            cookies_file,
            timeout: Duration::from_secs(settings.timeout_seconds),
        }
    }
}

#[async_trait]
impl MediaDownloader for YtDlpDownloader {
    async fn download(&self, source_url: &str, dest: &Path) -> Result<()> {
        info!("Downloading {} to {}", source_url, dest.display());

        let mut cmd = Command::new("yt-dlp");
        cmd.arg("--format").arg(&self.format)
            .arg("--format-sort").arg(&self.format_sort)
            .arg("--merge-output-format").arg("mp4")
            .arg("--output").arg(dest)
            .arg("--no-part")
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings");
        if let Some(cookies) = &self.cookies_file {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.arg(source_url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                KlippError::Download(format!(
                    "yt-dlp timed out after {}s for {}",
                    self.timeout.as_secs(),
                    source_url
                ))
            })?;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KlippError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(KlippError::Download(format!("yt-dlp execution failed: {e}")));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KlippError::Download(format!("yt-dlp failed: {stderr}")));
        }

        if !dest.exists() {
            return Err(KlippError::Download(format!(
                "yt-dlp reported success but {} was not created",
                dest.display()
            )));
        }

        Ok(())
    }
}
