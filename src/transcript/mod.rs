//! Transcript retrieval abstraction.
//!
//! A transcript is an ordered list of timed text entries. Providers either
//! return the full list or fail with a [`TranscriptError`]; the pipeline
//! treats every transcript failure as "no matches" rather than aborting.

mod youtube;

pub use youtube::YtDlpTranscriptProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One timed caption line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Caption text.
    pub text: String,
    /// Start offset in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

/// Why a transcript could not be retrieved.
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("transcripts are disabled for this video")]
    Disabled,

    #[error("no transcript found for language '{0}'")]
    NotFound(String),

    #[error("transcript fetch failed: {0}")]
    Fetch(String),
}

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Fetch the transcript for a video id.
    async fn fetch(
        &self,
        video_id: &str,
    ) -> std::result::Result<Vec<TranscriptEntry>, TranscriptError>;
}
