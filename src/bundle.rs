//! Bundle assembly and expiry.
//!
//! A bundle is a zip archive of the clip files present for one video id at
//! the moment of creation. Bundles are transient: a background task deletes
//! the archive after a grace delay, whether or not anyone downloaded it.

use crate::error::{KlippError, Result};
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zip::write::FileOptions;
use zip::ZipWriter;

/// A created bundle archive with its scheduled expiry.
#[derive(Debug)]
pub struct Bundle {
    pub video_id: String,
    pub path: PathBuf,
    pub created_at: DateTime<Local>,
    pub expires_at: DateTime<Local>,
    cleanup: JoinHandle<()>,
}

impl Bundle {
    /// Cancel the scheduled deletion, leaving the archive on disk.
    pub fn cancel_expiry(&self) {
        self.cleanup.abort();
    }

    /// Wait for the expiry task to run (or to be cancelled).
    pub async fn await_expiry(self) {
        let _ = self.cleanup.await;
    }
}

/// Creates self-expiring zip bundles of extracted clips.
pub struct BundleManager {
    clips_root: PathBuf,
    bundles_dir: PathBuf,
    expiry: Duration,
}

impl BundleManager {
    pub fn new(clips_root: PathBuf, bundles_dir: PathBuf, expiry: Duration) -> Self {
        Self {
            clips_root,
            bundles_dir,
            expiry,
        }
    }

    /// Archive the clips currently present for a video id.
    ///
    /// Fails with `NoClips` when the id has no clip files. Clips extracted
    /// after this call are not part of the returned bundle.
    pub async fn create_bundle(&self, video_id: &str) -> Result<Bundle> {
        let clips = self.snapshot_clips(video_id).await?;
        if clips.is_empty() {
            return Err(KlippError::NoClips(video_id.to_string()));
        }

        tokio::fs::create_dir_all(&self.bundles_dir).await?;

        let created_at = Local::now();
        let archive_name = format!(
            "clips_{}_{}.zip",
            video_id,
            created_at.format("%Y%m%d_%H%M%S")
        );
        let path = self.bundles_dir.join(archive_name);

        let zip_path = path.clone();
        tokio::task::spawn_blocking(move || write_archive(&zip_path, &clips))
            .await
            .map_err(|e| KlippError::Bundle(format!("archive task failed: {e}")))??;

        info!(
            "Created bundle {} (expires in {}s)",
            path.display(),
            self.expiry.as_secs()
        );

        let cleanup = spawn_expiry(path.clone(), self.expiry);

        Ok(Bundle {
            video_id: video_id.to_string(),
            path,
            created_at,
            expires_at: created_at + chrono::Duration::seconds(self.expiry.as_secs() as i64),
            cleanup,
        })
    }

    /// Snapshot the clip files present for a video id, in name order.
    async fn snapshot_clips(&self, video_id: &str) -> Result<Vec<PathBuf>> {
        let clip_dir = self.clips_root.join(video_id);
        let mut clips = Vec::new();

        if !clip_dir.exists() {
            return Ok(clips);
        }

        let mut entries = tokio::fs::read_dir(&clip_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "mp4") {
                clips.push(path);
            }
        }

        clips.sort();
        Ok(clips)
    }
}

/// Write the clip files into a zip archive, flat, by file name.
fn write_archive(path: &Path, clips: &[PathBuf]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for clip in clips {
        let name = clip
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| KlippError::Bundle(format!("unusable clip name: {}", clip.display())))?;

        zip.start_file(name, options)
            .map_err(|e| KlippError::Bundle(e.to_string()))?;
        let data = std::fs::read(clip)?;
        zip.write_all(&data)?;
    }

    zip.finish()
        .map_err(|e| KlippError::Bundle(e.to_string()))?;
    Ok(())
}

/// Spawn the deferred deletion task for a bundle archive.
///
/// Deletion is idempotent: an archive that is already gone is not an error.
fn spawn_expiry(path: PathBuf, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!("Deleted expired bundle {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Bundle {} was already removed", path.display());
            }
            Err(e) => warn!("Failed to delete bundle {}: {}", path.display(), e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn seed_clips(root: &Path, video_id: &str, names: &[&str]) {
        let dir = root.join(video_id);
        tokio::fs::create_dir_all(&dir).await.unwrap();
        for name in names {
            tokio::fs::write(dir.join(name), b"clip data").await.unwrap();
        }
    }

    fn manager(dir: &TempDir, expiry: Duration) -> BundleManager {
        BundleManager::new(
            dir.path().join("clips"),
            dir.path().join("bundles"),
            expiry,
        )
    }

    #[tokio::test]
    async fn test_no_clips_is_an_error() {
        let dir = TempDir::new().unwrap();
        let bundles = manager(&dir, Duration::from_secs(60));

        let err = bundles.create_bundle("vid00000001").await.unwrap_err();
        assert!(matches!(err, KlippError::NoClips(_)));
    }

    #[tokio::test]
    async fn test_bundle_contains_snapshot_of_clips() {
        let dir = TempDir::new().unwrap();
        let bundles = manager(&dir, Duration::from_secs(60));
        seed_clips(
            &dir.path().join("clips"),
            "vid00000001",
            &["clip_3.mp4", "clip_18.mp4"],
        )
        .await;

        let bundle = bundles.create_bundle("vid00000001").await.unwrap();
        bundle.cancel_expiry();
        assert!(bundle.path.exists());

        // A clip added after creation is not in this bundle instance
        seed_clips(&dir.path().join("clips"), "vid00000001", &["clip_40.mp4"]).await;

        let file = std::fs::File::open(&bundle.path).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        let mut names: Vec<_> = archive.file_names().map(String::from).collect();
        names.sort();
        assert_eq!(names, vec!["clip_18.mp4", "clip_3.mp4"]);
    }

    #[tokio::test]
    async fn test_bundle_expires_after_grace_delay() {
        let dir = TempDir::new().unwrap();
        let bundles = manager(&dir, Duration::from_millis(50));
        seed_clips(&dir.path().join("clips"), "vid00000001", &["clip_0.mp4"]).await;

        let bundle = bundles.create_bundle("vid00000001").await.unwrap();
        let path = bundle.path.clone();
        assert!(path.exists());

        bundle.await_expiry().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_double_deletion_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let bundles = manager(&dir, Duration::from_millis(50));
        seed_clips(&dir.path().join("clips"), "vid00000001", &["clip_0.mp4"]).await;

        let bundle = bundles.create_bundle("vid00000001").await.unwrap();
        tokio::fs::remove_file(&bundle.path).await.unwrap();

        // The expiry task finds the file already gone and completes cleanly
        bundle.await_expiry().await;
    }

    #[tokio::test]
    async fn test_cancel_expiry_keeps_archive() {
        let dir = TempDir::new().unwrap();
        let bundles = manager(&dir, Duration::from_millis(50));
        seed_clips(&dir.path().join("clips"), "vid00000001", &["clip_0.mp4"]).await;

        let bundle = bundles.create_bundle("vid00000001").await.unwrap();
        bundle.cancel_expiry();
        let path = bundle.path.clone();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_two_bundles_coexist() {
        let dir = TempDir::new().unwrap();
        let bundles = manager(&dir, Duration::from_secs(60));
        seed_clips(&dir.path().join("clips"), "vid00000001", &["clip_0.mp4"]).await;

        let first = bundles.create_bundle("vid00000001").await.unwrap();
        first.cancel_expiry();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let second = bundles.create_bundle("vid00000001").await.unwrap();
        second.cancel_expiry();

        // Timestamped names keep bundles from different instants distinct
        assert_ne!(first.path, second.path);
        assert!(first.path.exists());
        assert!(second.path.exists());
    }
}
