//! Content-addressed cache of full source videos.
//!
//! Holds at most one canonical copy of a source video per video id. The
//! first request for an id downloads the raw file and re-encodes it into
//! the delivery format; every later request gets the cached path back
//! without touching the network.
//!
//! Concurrent first-time requests for the same id are serialized through a
//! per-id lock held across the whole download+encode critical section, so
//! exactly one download happens and every waiter observes the result.

use crate::error::Result;
use crate::media::{EncodeJob, MediaDownloader, MediaEncoder};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Lifecycle state of a cached source video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Absent,
    Downloading,
    Ready,
    Failed,
}

#[derive(Debug)]
struct SourceRecord {
    state: SourceState,
}

/// Download-once cache of re-encoded source videos, keyed by video id.
pub struct SourceCache {
    videos_dir: PathBuf,
    downloader: Arc<dyn MediaDownloader>,
    encoder: Arc<dyn MediaEncoder>,
    registry: Mutex<HashMap<String, Arc<Mutex<SourceRecord>>>>,
}

impl SourceCache {
    pub fn new(
        videos_dir: PathBuf,
        downloader: Arc<dyn MediaDownloader>,
        encoder: Arc<dyn MediaEncoder>,
    ) -> Self {
        Self {
            videos_dir,
            downloader,
            encoder,
            registry: Mutex::new(HashMap::new()),
        }
    }

    /// Path of the canonical cached copy for a video id.
    pub fn video_path(&self, video_id: &str) -> PathBuf {
        self.videos_dir.join(format!("{}.mp4", video_id))
    }

    /// Current cache state for a video id.
    pub async fn state(&self, video_id: &str) -> SourceState {
        let entry = {
            let registry = self.registry.lock().await;
            registry.get(video_id).cloned()
        };
        match entry {
            Some(record) => record.lock().await.state,
            None => SourceState::Absent,
        }
    }

    /// Ensure a Ready local copy of the video exists and return its path.
    ///
    /// Failures propagate to the caller; the record is left `Failed` and a
    /// later call for the same id starts a fresh attempt.
    pub async fn ensure_available(&self, video_id: &str, source_url: &str) -> Result<PathBuf> {
        let entry = {
            let mut registry = self.registry.lock().await;
            registry
                .entry(video_id.to_string())
                .or_insert_with(|| {
                    Arc::new(Mutex::new(SourceRecord {
                        state: SourceState::Absent,
                    }))
                })
                .clone()
        };

        // Per-id critical section: held across download and encode so
        // concurrent first requests trigger exactly one download.
        let mut record = entry.lock().await;

        let final_path = self.video_path(video_id);
        if final_path.exists() {
            if record.state != SourceState::Ready {
                debug!("Found existing cached copy for {}", video_id);
                record.state = SourceState::Ready;
            }
            return Ok(final_path);
        }

        info!("Cache miss for {}, downloading", video_id);
        record.state = SourceState::Downloading;

        tokio::fs::create_dir_all(&self.videos_dir).await?;
        let raw_path = self.videos_dir.join(format!("{}.raw.mp4", video_id));

        let result = self.populate(source_url, &raw_path, &final_path).await;

        // The raw intermediate never survives, success or failure
        if raw_path.exists() {
            if let Err(e) = tokio::fs::remove_file(&raw_path).await {
                warn!("Failed to remove raw intermediate {}: {}", raw_path.display(), e);
            }
        }

        match result {
            Ok(()) => {
                record.state = SourceState::Ready;
                info!("Cached source video for {}", video_id);
                Ok(final_path)
            }
            Err(e) => {
                record.state = SourceState::Failed;
                // A partial output must not be mistaken for a Ready copy later
                let _ = tokio::fs::remove_file(&final_path).await;
                Err(e)
            }
        }
    }

    /// Download the raw file and re-encode it into the delivery format.
    async fn populate(&self, source_url: &str, raw_path: &Path, final_path: &Path) -> Result<()> {
        self.downloader.download(source_url, raw_path).await?;

        debug!("Re-encoding {} into delivery format", raw_path.display());
        self.encoder
            .encode(&EncodeJob::full(raw_path.to_path_buf(), final_path.to_path_buf()))
            .await
    }
}
