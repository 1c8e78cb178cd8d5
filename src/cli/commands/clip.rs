//! Clip command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the clip command.
pub async fn run_clip(
    reference: &str,
    phrase: &str,
    before: f64,
    after: f64,
    bundle: bool,
    settings: Settings,
) -> Result<()> {
    let orchestrator = Orchestrator::new(&settings);

    let spinner = Output::spinner(&format!("Searching for \"{}\"...", phrase));
    let report = orchestrator
        .request_clips(reference, phrase, before, after)
        .await?;
    spinner.finish_and_clear();

    if report.match_count == 0 {
        Output::warning("No matches found for the phrase.");
        return Ok(());
    }

    Output::success(&format!(
        "Matched {} line(s), created {} clip(s).",
        report.match_count,
        report.clips.len()
    ));
    for clip in &report.clips {
        Output::list_item(&clip.path.display().to_string());
    }

    for failure in &report.failures {
        Output::error(&format!(
            "Window at {:.2}s failed: {}",
            failure.start, failure.error
        ));
    }

    if bundle && !report.clips.is_empty() {
        let created = orchestrator.create_bundle(&report.video_id).await?;
        // The CLI user wants the file, so the grace-delay deletion is cancelled
        created.cancel_expiry();
        Output::success(&format!("Bundled clips into {}", created.path.display()));
    }

    Ok(())
}
