//! YouTube reference resolution and channel listing.

use crate::error::{KlippError, Result};
use regex::Regex;
use std::path::PathBuf;
use tracing::{debug, info};
use url::Url;

/// Resolves YouTube references and lists channel uploads.
pub struct YoutubeSource {
    video_id_regex: Regex,
    cookies_file: Option<PathBuf>,
}

impl YoutubeSource {
    pub fn new(cookies_file: Option<PathBuf>) -> Self {
        // Matches path-style YouTube URL formats and bare video IDs.
        // watch?v= URLs are handled by proper query parsing instead, since
        // the v parameter is not always first.
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                (?:https?://)?
                (?:www\.)?
                (?:youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/|youtube\.com/v/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            # Bare video ID (11 characters)
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        Self {
            video_id_regex,
            cookies_file,
        }
    }

    /// Extract a video id from a URL or bare id. Pure string work, no I/O.
    pub fn extract_video_id(&self, input: &str) -> Option<String> {
        let input = input.trim();

        // watch URLs carry the id in the v query parameter
        if input.contains("youtube.com/watch") {
            let parsed = Url::parse(input)
                .or_else(|_| Url::parse(&format!("https://{}", input)))
                .ok()?;
            return parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.to_string())
                .filter(|v| v.len() == 11);
        }

        let caps = self.video_id_regex.captures(input)?;
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Resolve a reference to a video id, failing with `InvalidReference`.
    pub fn resolve(&self, input: &str) -> Result<String> {
        self.extract_video_id(input)
            .ok_or_else(|| KlippError::InvalidReference(input.to_string()))
    }

    /// Canonical watch URL for a video id.
    pub fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", video_id)
    }

    /// List the latest watch URLs from a channel or playlist.
    ///
    /// Uses yt-dlp flat-playlist extraction, which resolves @handles,
    /// channel pages and playlist URLs alike.
    pub async fn list_latest(&self, source: &str, count: usize) -> Result<Vec<String>> {
        info!("Listing latest {} videos from {}", count, source);

        let mut cmd = tokio::process::Command::new("yt-dlp");
        cmd.args([
            "--dump-json",
            "--no-download",
            "--no-warnings",
            "--flat-playlist",
            "--playlist-end",
            &count.to_string(),
        ]);
        if let Some(cookies) = &self.cookies_file {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.arg(source);

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KlippError::ToolNotFound("yt-dlp".to_string())
            } else {
                KlippError::InvalidInput(format!("Failed to run yt-dlp: {}", e))
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KlippError::InvalidInput(format!(
                "Failed to list videos from {}: {}",
                source, stderr
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut urls = Vec::new();

        for line in stdout.lines() {
            if line.trim().is_empty() {
                continue;
            }

            if let Ok(json) = serde_json::from_str::<serde_json::Value>(line) {
                // Entries may carry a full URL instead of a bare id
                let id = json["id"]
                    .as_str()
                    .or_else(|| json["url"].as_str())
                    .and_then(|s| self.extract_video_id(s));

                if let Some(video_id) = id {
                    urls.push(Self::watch_url(&video_id));
                }
            }
        }

        debug!("Resolved {} watch URLs", urls.len());
        Ok(urls)
    }
}

impl Default for YoutubeSource {
    fn default() -> Self {
        Self::new(None)
    }
}
