//! Clip extraction from cached source videos.

use crate::error::{KlippError, Result};
use crate::matcher::ClipWindow;
use crate::media::{EncodeJob, MediaEncoder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Cuts clip windows out of a cached source video.
///
/// Output names are deterministic (`clip_{floor(start)}.mp4` under the
/// per-id clips directory), so repeating a request overwrites the previous
/// clip instead of accumulating duplicates.
pub struct ClipExtractor {
    clips_root: PathBuf,
    encoder: Arc<dyn MediaEncoder>,
}

impl ClipExtractor {
    pub fn new(clips_root: PathBuf, encoder: Arc<dyn MediaEncoder>) -> Self {
        Self {
            clips_root,
            encoder,
        }
    }

    /// Per-id directory holding extracted clips.
    pub fn clip_dir(&self, video_id: &str) -> PathBuf {
        self.clips_root.join(video_id)
    }

    /// Deterministic output path for a window.
    pub fn clip_path(&self, video_id: &str, window: &ClipWindow) -> PathBuf {
        self.clip_dir(video_id)
            .join(format!("clip_{}.mp4", window.start.floor() as u64))
    }

    /// Extract one window into its clip file.
    ///
    /// The source must already be a Ready cached copy. Failures are
    /// reported per clip; the caller decides whether to continue with
    /// sibling windows.
    pub async fn extract(
        &self,
        source_path: &Path,
        video_id: &str,
        window: &ClipWindow,
    ) -> Result<PathBuf> {
        if !source_path.exists() {
            return Err(KlippError::Extraction(format!(
                "source video missing: {}",
                source_path.display()
            )));
        }

        tokio::fs::create_dir_all(self.clip_dir(video_id)).await?;
        let output = self.clip_path(video_id, window);

        let job = EncodeJob::window(
            source_path.to_path_buf(),
            output.clone(),
            window.start,
            window.duration,
        );

        self.encoder.encode(&job).await.map_err(|e| match e {
            // The shared codec tool reports encode errors; during cutting
            // they are extraction failures
            KlippError::Encode(msg) => KlippError::Extraction(msg),
            other => other,
        })?;

        info!(
            "Extracted clip at {:.2}s ({:.2}s long) for {}",
            window.start, window.duration, video_id
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FakeEncoder {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl FakeEncoder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl MediaEncoder for FakeEncoder {
        async fn encode(&self, job: &EncodeJob) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(KlippError::Encode("simulated failure".into()));
            }
            tokio::fs::write(&job.output, b"clip").await?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_deterministic_floor_naming() {
        let dir = TempDir::new().unwrap();
        let encoder = Arc::new(FakeEncoder::new());
        let extractor = ClipExtractor::new(dir.path().join("clips"), encoder.clone());

        let source = dir.path().join("source.mp4");
        tokio::fs::write(&source, b"video").await.unwrap();

        let window = ClipWindow {
            start: 3.9,
            duration: 7.0,
        };
        let path = extractor
            .extract(&source, "vid00000001", &window)
            .await
            .unwrap();

        assert_eq!(
            path,
            dir.path().join("clips").join("vid00000001").join("clip_3.mp4")
        );
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_repeat_extraction_overwrites() {
        let dir = TempDir::new().unwrap();
        let encoder = Arc::new(FakeEncoder::new());
        let extractor = ClipExtractor::new(dir.path().join("clips"), encoder.clone());

        let source = dir.path().join("source.mp4");
        tokio::fs::write(&source, b"video").await.unwrap();

        let window = ClipWindow {
            start: 18.0,
            duration: 6.0,
        };
        let first = extractor
            .extract(&source, "vid00000001", &window)
            .await
            .unwrap();
        let second = extractor
            .extract(&source, "vid00000001", &window)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_reported_as_extraction() {
        let dir = TempDir::new().unwrap();
        let encoder = Arc::new(FakeEncoder::new());
        encoder.fail.store(true, Ordering::SeqCst);
        let extractor = ClipExtractor::new(dir.path().join("clips"), encoder);

        let source = dir.path().join("source.mp4");
        tokio::fs::write(&source, b"video").await.unwrap();

        let err = extractor
            .extract(
                &source,
                "vid00000001",
                &ClipWindow {
                    start: 0.0,
                    duration: 1.0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, KlippError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_missing_source_fails_without_tool_call() {
        let dir = TempDir::new().unwrap();
        let encoder = Arc::new(FakeEncoder::new());
        let extractor = ClipExtractor::new(dir.path().join("clips"), encoder.clone());

        let err = extractor
            .extract(
                &dir.path().join("nope.mp4"),
                "vid00000001",
                &ClipWindow {
                    start: 0.0,
                    duration: 1.0,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, KlippError::Extraction(_)));
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
    }
}
