//! Build command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the build command.
pub async fn run_build(force: bool, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = if force {
        Output::spinner("Rebuilding index from scratch...")
    } else {
        Output::spinner("Building index...")
    };

    match orchestrator.build_index(force).await {
        Ok(report) => {
            spinner.finish_and_clear();

            if report.indexed.is_empty() && report.skipped.is_empty() && report.failed.is_empty() {
                Output::warning("No sources found in the configured source directories.");
                return Ok(());
            }

            if !report.indexed.is_empty() {
                Output::success(&format!("Indexed {} sources", report.indexed.len()));
                for source in &report.indexed {
                    Output::list_item(source);
                }
            }

            if !report.skipped.is_empty() {
                Output::info(&format!(
                    "Skipped {} already-indexed sources",
                    report.skipped.len()
                ));
            }

            if !report.failed.is_empty() {
                Output::warning(&format!("Failed to index {} sources", report.failed.len()));
                for source in &report.failed {
                    Output::list_item(source);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Build failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
