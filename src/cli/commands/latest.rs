//! Latest command - list recent uploads from a channel or playlist.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the latest command.
pub async fn run_latest(source: &str, count: usize, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(&settings);

    let spinner = Output::spinner("Fetching video list...");
    let urls = orchestrator.list_latest(source, count).await?;
    spinner.finish_and_clear();

    if urls.is_empty() {
        Output::warning("No videos found.");
        return Ok(());
    }

    Output::success(&format!("Found {} video(s):", urls.len()));
    for url in &urls {
        Output::list_item(url);
    }

    Ok(())
}
