//! YouTube transcript provider backed by yt-dlp caption discovery.
//!
//! yt-dlp's metadata dump lists the caption tracks for a video; the track
//! content itself is fetched over HTTP in YouTube's json3 format.

use super::{TranscriptEntry, TranscriptError, TranscriptProvider};
use crate::source::YoutubeSource;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Fetches transcripts via yt-dlp and the json3 caption endpoint.
pub struct YtDlpTranscriptProvider {
    language: String,
    cookies_file: Option<PathBuf>,
    http: reqwest::Client,
}

impl YtDlpTranscriptProvider {
    pub fn new(
        language: &str,
        cookies_file: Option<PathBuf>,
        timeout_seconds: u64,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .unwrap_or_default();

        Self {
            language: language.to_string(),
            cookies_file,
            http,
        }
    }

    /// Dump video metadata with yt-dlp and return the parsed JSON.
    async fn dump_metadata(
        &self,
        video_id: &str,
    ) -> std::result::Result<serde_json::Value, TranscriptError> {
        let url = YoutubeSource::watch_url(video_id);

        let mut cmd = tokio::process::Command::new("yt-dlp");
        cmd.args(["--dump-json", "--no-download", "--no-warnings"]);
        if let Some(cookies) = &self.cookies_file {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.arg(&url);

        let output = cmd
            .output()
            .await
            .map_err(|e| TranscriptError::Fetch(format!("failed to run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscriptError::Fetch(format!(
                "yt-dlp metadata dump failed for {}: {}",
                video_id, stderr
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| TranscriptError::Fetch(format!("invalid yt-dlp output: {}", e)))
    }
}

#[async_trait]
impl TranscriptProvider for YtDlpTranscriptProvider {
    async fn fetch(
        &self,
        video_id: &str,
    ) -> std::result::Result<Vec<TranscriptEntry>, TranscriptError> {
        let metadata = self.dump_metadata(video_id).await?;

        let track_url = select_track(&metadata, &self.language)?;
        debug!("Fetching {} caption track for {}", self.language, video_id);

        let body = self
            .http
            .get(&track_url)
            .send()
            .await
            .map_err(|e| TranscriptError::Fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| TranscriptError::Fetch(e.to_string()))?
            .text()
            .await
            .map_err(|e| TranscriptError::Fetch(e.to_string()))?;

        let entries = parse_json3(&body)?;
        info!(
            "Fetched transcript for {} ({} entries)",
            video_id,
            entries.len()
        );
        Ok(entries)
    }
}

/// Pick the json3 track URL for the requested language.
///
/// Manual subtitles win over automatic captions; within the automatic map a
/// language-prefixed variant (e.g. `en-orig` for `en`) is accepted.
fn select_track(
    metadata: &serde_json::Value,
    language: &str,
) -> std::result::Result<String, TranscriptError> {
    let subtitles = metadata["subtitles"].as_object();
    let automatic = metadata["automatic_captions"].as_object();

    let no_subs = subtitles.is_none_or(|m| m.is_empty());
    let no_auto = automatic.is_none_or(|m| m.is_empty());
    if no_subs && no_auto {
        return Err(TranscriptError::Disabled);
    }

    for map in [subtitles, automatic].into_iter().flatten() {
        let track = map.get(language).or_else(|| {
            map.iter()
                .find(|(lang, _)| lang.starts_with(&format!("{}-", language)))
                .map(|(_, v)| v)
        });

        if let Some(formats) = track.and_then(|t| t.as_array()) {
            if let Some(url) = formats
                .iter()
                .find(|f| f["ext"].as_str() == Some("json3"))
                .and_then(|f| f["url"].as_str())
            {
                return Ok(url.to_string());
            }
        }
    }

    Err(TranscriptError::NotFound(language.to_string()))
}

#[derive(Deserialize)]
struct Json3Track {
    events: Option<Vec<Json3Event>>,
}

#[derive(Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs")]
    start_ms: Option<u64>,
    #[serde(rename = "dDurationMs")]
    duration_ms: Option<u64>,
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Deserialize)]
struct Json3Seg {
    utf8: Option<String>,
}

/// Parse a json3 caption payload into ordered transcript entries.
fn parse_json3(body: &str) -> std::result::Result<Vec<TranscriptEntry>, TranscriptError> {
    let track: Json3Track = serde_json::from_str(body)
        .map_err(|e| TranscriptError::Fetch(format!("invalid json3 payload: {}", e)))?;

    let mut entries = Vec::new();
    for event in track.events.unwrap_or_default() {
        let Some(segs) = event.segs else { continue };

        let text: String = segs
            .into_iter()
            .filter_map(|s| s.utf8)
            .collect::<String>()
            .trim()
            .to_string();
        if text.is_empty() {
            continue;
        }

        entries.push(TranscriptEntry {
            text,
            start: event.start_ms.unwrap_or(0) as f64 / 1000.0,
            duration: event.duration_ms.unwrap_or(0) as f64 / 1000.0,
        });
    }

    Ok(entries)
}
