//! CLI module for Klipp.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Klipp - Phrase-matched video clipping
///
/// A CLI tool and service for cutting clips around every mention of a phrase
/// in a YouTube video's transcript. The name "Klipp" comes from the
/// Norwegian/Scandinavian word for "cut."
#[derive(Parser, Debug)]
#[command(name = "klipp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Cut a clip around every transcript mention of a phrase
    Clip {
        /// YouTube URL or video ID
        reference: String,

        /// Phrase to search for (case-insensitive)
        phrase: String,

        /// Seconds of lead-in before each matched line
        #[arg(short, long, default_value_t = 2.0)]
        before: f64,

        /// Seconds of tail after each matched line
        #[arg(short, long, default_value_t = 2.0)]
        after: f64,

        /// Also bundle the produced clips into a zip archive
        #[arg(long)]
        bundle: bool,
    },

    /// Download and cache the full source video without clipping
    Fetch {
        /// YouTube URL or video ID
        reference: String,
    },

    /// List the latest watch URLs from a channel or playlist
    Latest {
        /// Channel URL, @handle or playlist URL
        source: String,

        /// Maximum number of videos to list
        #[arg(short, long, default_value_t = 10)]
        count: usize,
    },

    /// Bundle the clips already extracted for a video into a zip archive
    Bundle {
        /// Video ID whose clips to bundle
        video_id: String,

        /// Keep the archive instead of letting it expire
        #[arg(long)]
        keep: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
