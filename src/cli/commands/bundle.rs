//! Bundle command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the bundle command.
pub async fn run_bundle(video_id: &str, keep: bool, settings: Settings) -> Result<()> {
    let expiry_seconds = settings.bundle.expiry_seconds;
    let orchestrator = Orchestrator::new(&settings);

    let bundle = orchestrator.create_bundle(video_id).await?;
    Output::success(&format!("Created bundle {}", bundle.path.display()));

    if keep {
        bundle.cancel_expiry();
        Output::info("Expiry cancelled; the archive will not be removed.");
    } else {
        Output::info(&format!(
            "The archive self-deletes in {}s; pass --keep to retain it.",
            expiry_seconds
        ));
        // Stay alive until the deferred deletion has run, otherwise the
        // process exits with the archive still scheduled for removal
        bundle.await_expiry().await;
    }

    Ok(())
}
