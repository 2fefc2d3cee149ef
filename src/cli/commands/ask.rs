//! Ask command implementation.

use crate::answer::AnswerResponse;
use crate::cli::output::format_timestamp;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::SvarError;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, json: bool, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let engine = orchestrator.answer_engine();

    let spinner = Output::spinner("Searching knowledge base...");

    match engine.answer(question).await {
        Ok(response) => {
            spinner.finish_and_clear();

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
                return Ok(());
            }

            print_response(&response);
        }
        Err(SvarError::EmptyIndex(_)) => {
            spinner.finish_and_clear();
            Output::warning("The index is empty.");
            Output::info("Run 'svar build' to index your sources first.");
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

fn print_response(response: &AnswerResponse) {
    match response {
        AnswerResponse::Pdf { answer, source } => {
            println!("\n{}\n", answer);
            Output::header("Source");
            Output::search_result(
                &source.pdf_filename,
                &format!("page {}, paragraph {}", source.page_number, source.paragraph_index),
                source.score,
                &source.snippet,
            );
        }
        AnswerResponse::Video { answer, source } => {
            println!("\n{}\n", answer);
            Output::header("Source");
            Output::search_result(
                &source.video_id,
                &format!(
                    "{} - {}",
                    format_timestamp(source.start_timestamp),
                    format_timestamp(source.end_timestamp)
                ),
                source.score,
                &source.transcript_snippet,
            );
        }
        AnswerResponse::NoAnswer { message } => {
            Output::info(message);
        }
    }
}
