//! Fetch command - pre-populate the source cache.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the fetch command.
pub async fn run_fetch(reference: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(&settings);

    let spinner = Output::spinner("Downloading and re-encoding source video...");
    let path = orchestrator.ensure_source(reference).await?;
    spinner.finish_and_clear();

    Output::success(&format!("Source video cached at {}", path.display()));
    Ok(())
}
