//! External media tooling.
//!
//! Wraps yt-dlp (full-video download) and ffmpeg (re-encode and cutting)
//! behind traits so the cache and extractor can be exercised without the
//! real tools.

mod downloader;
mod encoder;

pub use downloader::{MediaDownloader, YtDlpDownloader};
pub use encoder::{EncodeJob, FfmpegEncoder, MediaEncoder};
