//! Search command implementation.

use crate::cli::output::format_timestamp;
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::SvarError;
use crate::orchestrator::Orchestrator;
use crate::query::QueryProcessor;
use crate::vector_store::{Locator, Modality, SearchResult};
use anyhow::Result;
use std::sync::Arc;

/// Run the search command.
pub async fn run_search(
    query: &str,
    limit: usize,
    modality: Option<String>,
    settings: Settings,
) -> Result<()> {
    let modalities = match modality.as_deref() {
        None => vec![Modality::Pdf, Modality::Video],
        Some("pdf") => vec![Modality::Pdf],
        Some("video") => vec![Modality::Video],
        Some(other) => {
            Output::error(&format!(
                "Unknown modality '{}'. Use 'pdf' or 'video'.",
                other
            ));
            return Err(SvarError::InvalidInput(format!("unknown modality: {}", other)).into());
        }
    };

    let orchestrator = Orchestrator::new(settings.clone())?;

    let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::new(
        &settings.openai,
        &settings.embedding.model,
        settings.embedding.dimensions as usize,
    ));
    let query_processor = QueryProcessor::new(embedder);

    let spinner = Output::spinner("Searching...");

    let query_embedding = match query_processor.process_query(query).await {
        Ok(embedding) => embedding,
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    };

    let store = orchestrator.store();
    let mut results: Vec<SearchResult> = Vec::new();
    for m in modalities {
        match store.search(&query_embedding, m, limit).await {
            Ok(mut partition) => results.append(&mut partition),
            Err(SvarError::EmptyIndex(_)) => {}
            Err(e) => {
                spinner.finish_and_clear();
                Output::error(&format!("Search failed: {}", e));
                return Err(e.into());
            }
        }
    }
    spinner.finish_and_clear();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    if results.is_empty() {
        Output::warning("No results found matching your query.");
        return Ok(());
    }

    Output::success(&format!("Found {} results", results.len()));
    for result in &results {
        print_result(result);
    }

    Ok(())
}

fn print_result(result: &SearchResult) {
    match &result.chunk.locator {
        Locator::Pdf {
            pdf_filename,
            page_number,
            paragraph_index,
            ..
        } => {
            Output::search_result(
                pdf_filename,
                &format!("page {}, paragraph {}", page_number, paragraph_index),
                result.score,
                &result.chunk.text,
            );
        }
        Locator::Video {
            video_id,
            start_timestamp,
            end_timestamp,
            ..
        } => {
            Output::search_result(
                video_id,
                &format!(
                    "{} - {}",
                    format_timestamp(*start_timestamp),
                    format_timestamp(*end_timestamp)
                ),
                result.score,
                &result.chunk.text,
            );
        }
    }
}
