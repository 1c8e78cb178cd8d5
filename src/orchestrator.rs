//! Pipeline orchestrator for Klipp.
//!
//! Coordinates a clip request end to end: resolve the video reference,
//! search the transcript, ensure the source video is cached, and cut one
//! clip per matched window. Partial success is a normal outcome; per-clip
//! failures are collected into the report rather than aborting the rest.

use crate::bundle::{Bundle, BundleManager};
use crate::cache::SourceCache;
use crate::config::Settings;
use crate::error::Result;
use crate::extract::ClipExtractor;
use crate::matcher::match_phrase;
use crate::media::{FfmpegEncoder, MediaEncoder, YtDlpDownloader};
use crate::source::YoutubeSource;
use crate::transcript::{TranscriptProvider, YtDlpTranscriptProvider};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// One successfully extracted clip.
#[derive(Debug, Clone, Serialize)]
pub struct ClipOutcome {
    /// Window start offset in seconds.
    pub start: f64,
    /// Path of the clip file.
    pub path: PathBuf,
}

/// One window that failed to extract.
#[derive(Debug, Clone, Serialize)]
pub struct ClipFailure {
    /// Window start offset in seconds.
    pub start: f64,
    /// What went wrong.
    pub error: String,
}

/// Result of a clip request.
#[derive(Debug, Serialize)]
pub struct ClipRunReport {
    /// Resolved video id.
    pub video_id: String,
    /// Number of transcript entries that matched the phrase.
    pub match_count: usize,
    /// Clips produced, in transcript order.
    pub clips: Vec<ClipOutcome>,
    /// Windows that failed to extract.
    pub failures: Vec<ClipFailure>,
}

impl ClipRunReport {
    fn no_matches(video_id: String) -> Self {
        Self {
            video_id,
            match_count: 0,
            clips: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// The main orchestrator for the Klipp pipeline.
pub struct Orchestrator {
    source: YoutubeSource,
    transcripts: Arc<dyn TranscriptProvider>,
    cache: SourceCache,
    extractor: ClipExtractor,
    bundles: BundleManager,
}

impl Orchestrator {
    /// Create an orchestrator wired to the real yt-dlp/ffmpeg tooling.
    pub fn new(settings: &Settings) -> Self {
        let cookies = settings.cookies_file();

        let downloader = Arc::new(YtDlpDownloader::new(&settings.download, cookies.clone()));
        let encoder: Arc<dyn MediaEncoder> = Arc::new(FfmpegEncoder::new(&settings.encode));

        let transcripts = Arc::new(YtDlpTranscriptProvider::new(
            &settings.transcript.language,
            cookies.clone(),
            settings.transcript.timeout_seconds,
        ));

        Self {
            source: YoutubeSource::new(cookies),
            transcripts,
            cache: SourceCache::new(settings.videos_dir(), downloader, encoder.clone()),
            extractor: ClipExtractor::new(settings.clips_root(), encoder),
            bundles: BundleManager::new(
                settings.clips_root(),
                settings.bundles_dir(),
                Duration::from_secs(settings.bundle.expiry_seconds),
            ),
        }
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        source: YoutubeSource,
        transcripts: Arc<dyn TranscriptProvider>,
        cache: SourceCache,
        extractor: ClipExtractor,
        bundles: BundleManager,
    ) -> Self {
        Self {
            source,
            transcripts,
            cache,
            extractor,
            bundles,
        }
    }

    /// Resolve a video reference to its id without performing any I/O.
    pub fn resolve(&self, reference: &str) -> Result<String> {
        self.source.resolve(reference)
    }

    /// List the latest watch URLs from a channel or playlist.
    pub async fn list_latest(&self, source: &str, count: usize) -> Result<Vec<String>> {
        self.source.list_latest(source, count).await
    }

    /// Run a phrase search and cut one clip per matched window.
    #[instrument(skip(self), fields(reference = %reference, phrase = %phrase))]
    pub async fn request_clips(
        &self,
        reference: &str,
        phrase: &str,
        before: f64,
        after: f64,
    ) -> Result<ClipRunReport> {
        let video_id = self.source.resolve(reference)?;

        let transcript = match self.transcripts.fetch(&video_id).await {
            Ok(entries) => entries,
            Err(e) => {
                // Missing or disabled transcripts mean "nothing to clip",
                // not a failed request
                warn!("Transcript unavailable for {}: {}", video_id, e);
                return Ok(ClipRunReport::no_matches(video_id));
            }
        };

        let windows = match_phrase(&transcript, phrase, before, after);
        if windows.is_empty() {
            info!("No matches for '{}' in {}", phrase, video_id);
            return Ok(ClipRunReport::no_matches(video_id));
        }
        info!("Found {} match(es) for '{}' in {}", windows.len(), phrase, video_id);

        // The source must be cached before any window can be cut; a cache
        // failure aborts the request with no clips attempted
        let source_path = self
            .cache
            .ensure_available(&video_id, &YoutubeSource::watch_url(&video_id))
            .await?;

        let mut clips = Vec::new();
        let mut failures = Vec::new();
        for window in &windows {
            match self.extractor.extract(&source_path, &video_id, window).await {
                Ok(path) => clips.push(ClipOutcome {
                    start: window.start,
                    path,
                }),
                Err(e) => {
                    warn!(
                        "Clip at {:.2}s failed for {}: {}",
                        window.start, video_id, e
                    );
                    failures.push(ClipFailure {
                        start: window.start,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Produced {} clip(s), {} failure(s) for {}",
            clips.len(),
            failures.len(),
            video_id
        );

        Ok(ClipRunReport {
            video_id,
            match_count: windows.len(),
            clips,
            failures,
        })
    }

    /// Ensure the source video for a reference is cached and return its path.
    #[instrument(skip(self))]
    pub async fn ensure_source(&self, reference: &str) -> Result<PathBuf> {
        let video_id = self.source.resolve(reference)?;
        self.cache
            .ensure_available(&video_id, &YoutubeSource::watch_url(&video_id))
            .await
    }

    /// Bundle the clips currently present for a video id.
    pub async fn create_bundle(&self, video_id: &str) -> Result<Bundle> {
        self.bundles.create_bundle(video_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KlippError;
    use crate::media::{EncodeJob, MediaDownloader};
    use crate::transcript::{TranscriptEntry, TranscriptError};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FakeTranscripts {
        entries: Option<Vec<TranscriptEntry>>,
    }

    #[async_trait]
    impl TranscriptProvider for FakeTranscripts {
        async fn fetch(
            &self,
            _video_id: &str,
        ) -> std::result::Result<Vec<TranscriptEntry>, TranscriptError> {
            match &self.entries {
                Some(entries) => Ok(entries.clone()),
                None => Err(TranscriptError::Disabled),
            }
        }
    }

    struct FakeDownloader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MediaDownloader for FakeDownloader {
        async fn download(&self, _source_url: &str, dest: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::fs::write(dest, b"raw video").await?;
            Ok(())
        }
    }

    /// Copies input to output, failing for outputs whose name contains the
    /// configured marker.
    struct FakeEncoder {
        fail_marker: Option<String>,
    }

    #[async_trait]
    impl MediaEncoder for FakeEncoder {
        async fn encode(&self, job: &EncodeJob) -> Result<()> {
            if let Some(marker) = &self.fail_marker {
                if job.output.to_string_lossy().contains(marker.as_str()) {
                    return Err(KlippError::Encode("simulated failure".into()));
                }
            }
            let data = tokio::fs::read(&job.input).await?;
            tokio::fs::write(&job.output, data).await?;
            Ok(())
        }
    }

    fn entry(text: &str, start: f64, duration: f64) -> TranscriptEntry {
        TranscriptEntry {
            text: text.to_string(),
            start,
            duration,
        }
    }

    fn build(
        dir: &TempDir,
        entries: Option<Vec<TranscriptEntry>>,
        fail_marker: Option<&str>,
    ) -> (Orchestrator, Arc<FakeDownloader>) {
        let downloader = Arc::new(FakeDownloader {
            calls: AtomicUsize::new(0),
        });
        let encoder: Arc<dyn MediaEncoder> = Arc::new(FakeEncoder {
            fail_marker: fail_marker.map(String::from),
        });

        let orchestrator = Orchestrator::with_components(
            YoutubeSource::default(),
            Arc::new(FakeTranscripts { entries }),
            SourceCache::new(dir.path().join("videos"), downloader.clone(), encoder.clone()),
            ClipExtractor::new(dir.path().join("clips"), encoder),
            BundleManager::new(
                dir.path().join("clips"),
                dir.path().join("bundles"),
                Duration::from_secs(60),
            ),
        );

        (orchestrator, downloader)
    }

    #[tokio::test]
    async fn test_invalid_reference_fails_without_io() {
        let dir = TempDir::new().unwrap();
        let (orchestrator, downloader) = build(&dir, Some(vec![]), None);

        let err = orchestrator
            .request_clips("https://example.com/video", "phrase", 2.0, 2.0)
            .await
            .unwrap_err();

        assert!(matches!(err, KlippError::InvalidReference(_)));
        assert_eq!(downloader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_matches_skips_cache_and_bundle_fails() {
        let dir = TempDir::new().unwrap();
        let (orchestrator, downloader) = build(
            &dir,
            Some(vec![entry("nothing relevant here", 0.0, 5.0)]),
            None,
        );

        let report = orchestrator
            .request_clips("dQw4w9WgXcQ", "amplification", 2.0, 2.0)
            .await
            .unwrap();

        assert_eq!(report.match_count, 0);
        assert!(report.clips.is_empty());
        assert_eq!(downloader.calls.load(Ordering::SeqCst), 0);

        // No clips were ever produced, so bundling this id fails
        let err = orchestrator.create_bundle("dQw4w9WgXcQ").await.unwrap_err();
        assert!(matches!(err, KlippError::NoClips(_)));
    }

    #[tokio::test]
    async fn test_unavailable_transcript_is_zero_matches() {
        let dir = TempDir::new().unwrap();
        let (orchestrator, downloader) = build(&dir, None, None);

        let report = orchestrator
            .request_clips("dQw4w9WgXcQ", "amplification", 2.0, 2.0)
            .await
            .unwrap();

        assert_eq!(report.match_count, 0);
        assert_eq!(downloader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_matched_windows_produce_named_clips() {
        let dir = TempDir::new().unwrap();
        let (orchestrator, downloader) = build(
            &dir,
            Some(vec![
                entry("intro", 0.0, 2.0),
                entry("discussing amplification now", 5.0, 3.0),
                entry("more amplification talk", 20.0, 2.0),
            ]),
            None,
        );

        let report = orchestrator
            .request_clips("dQw4w9WgXcQ", "amplification", 2.0, 2.0)
            .await
            .unwrap();

        assert_eq!(report.match_count, 2);
        assert_eq!(report.clips.len(), 2);
        assert!(report.failures.is_empty());
        assert_eq!(downloader.calls.load(Ordering::SeqCst), 1);

        let names: Vec<String> = report
            .clips
            .iter()
            .map(|c| c.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["clip_3.mp4", "clip_18.mp4"]);
        for clip in &report.clips {
            assert!(clip.path.exists());
        }
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_sibling_clips() {
        let dir = TempDir::new().unwrap();
        let (orchestrator, _) = build(
            &dir,
            Some(vec![
                entry("amplification one", 5.0, 2.0),
                entry("amplification two", 20.0, 2.0),
                entry("amplification three", 40.0, 2.0),
            ]),
            Some("clip_18"),
        );

        let report = orchestrator
            .request_clips("dQw4w9WgXcQ", "amplification", 2.0, 2.0)
            .await
            .unwrap();

        assert_eq!(report.match_count, 3);
        assert_eq!(report.clips.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].start, 18.0);
        assert!(report.failures[0].error.contains("simulated failure"));
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_download() {
        let dir = TempDir::new().unwrap();
        let transcript = vec![entry("amplification here", 5.0, 2.0)];
        let (orchestrator, downloader) = build(&dir, Some(transcript), None);
        let orchestrator = Arc::new(orchestrator);

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let orchestrator = orchestrator.clone();
                tokio::spawn(async move {
                    orchestrator
                        .request_clips("dQw4w9WgXcQ", "amplification", 2.0, 2.0)
                        .await
                })
            })
            .collect();

        for task in tasks {
            let report = task.await.unwrap().unwrap();
            assert_eq!(report.clips.len(), 1);
            assert!(report.failures.is_empty());
        }

        assert_eq!(downloader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bundle_after_clipping() {
        let dir = TempDir::new().unwrap();
        let (orchestrator, _) = build(
            &dir,
            Some(vec![entry("amplification here", 5.0, 2.0)]),
            None,
        );

        orchestrator
            .request_clips("dQw4w9WgXcQ", "amplification", 2.0, 2.0)
            .await
            .unwrap();

        let bundle = orchestrator.create_bundle("dQw4w9WgXcQ").await.unwrap();
        bundle.cancel_expiry();
        assert!(bundle.path.exists());
        assert_eq!(bundle.video_id, "dQw4w9WgXcQ");
    }
}
