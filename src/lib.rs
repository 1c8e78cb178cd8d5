//! Klipp - Phrase-matched video clipping
//!
//! A CLI tool and service for cutting short clips around every mention of a
//! phrase in a YouTube video's transcript.
//!
//! The name "Klipp" comes from the Norwegian/Scandinavian word for "cut."
//!
//! # Overview
//!
//! Klipp allows you to:
//! - Search a video's transcript for a phrase and cut a clip per match
//! - Cache the full source video per video id so repeated searches never
//!   re-download
//! - Bundle a video's clips into a zip archive that expires on its own
//! - List the latest uploads of a channel or playlist
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `source` - Video reference resolution and channel listing
//! - `transcript` - Transcript retrieval abstraction
//! - `matcher` - Phrase-to-window matching
//! - `media` - yt-dlp and ffmpeg collaborators
//! - `cache` - Download-once source video cache
//! - `extract` - Clip extraction
//! - `bundle` - Bundle assembly and expiry
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use klipp::config::Settings;
//! use klipp::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings);
//!
//!     // Clip every mention of a phrase, padded by two seconds each side
//!     let report = orchestrator
//!         .request_clips("dQw4w9WgXcQ", "amplification", 2.0, 2.0)
//!         .await?;
//!     println!("Created {} clip(s)", report.clips.len());
//!
//!     Ok(())
//! }
//! ```

pub mod bundle;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod media;
pub mod orchestrator;
pub mod source;
pub mod transcript;

pub use error::{KlippError, Result};
