//! Klipp CLI entry point.

use anyhow::Result;
use clap::Parser;
use klipp::cli::{commands, Cli, Commands};
use klipp::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("klipp={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure storage directories exist
    std::fs::create_dir_all(settings.videos_dir())?;
    std::fs::create_dir_all(settings.clips_root())?;
    std::fs::create_dir_all(settings.bundles_dir())?;

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Clip {
            reference,
            phrase,
            before,
            after,
            bundle,
        } => {
            commands::run_clip(reference, phrase, *before, *after, *bundle, settings).await?;
        }

        Commands::Fetch { reference } => {
            commands::run_fetch(reference, settings).await?;
        }

        Commands::Latest { source, count } => {
            commands::run_latest(source, *count, settings).await?;
        }

        Commands::Bundle { video_id, keep } => {
            commands::run_bundle(video_id, *keep, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
