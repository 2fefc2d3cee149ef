//! Summary command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the summary command.
pub async fn run_summary(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let Some(summary) = orchestrator.load_summary() else {
        Output::info("No knowledge summary available yet.");
        Output::info("It is generated automatically after 'svar build'.");
        return Ok(());
    };

    Output::header("Overview");
    println!("  {}", summary.overview);

    if !summary.topics.is_empty() {
        Output::header("Topics");
        for topic in &summary.topics {
            Output::list_item(topic);
        }
    }

    if !summary.suggested_questions.is_empty() {
        Output::header("Suggested Questions");
        for question in &summary.suggested_questions {
            Output::list_item(question);
        }
    }

    Ok(())
}
