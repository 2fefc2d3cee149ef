//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::vector_store::Modality;
use anyhow::Result;

/// Run the status command.
pub async fn run_status(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings.clone())?;

    Output::header("Configuration");
    Output::kv("Config file", &Settings::default_config_path().display().to_string());
    Output::kv("Data directory", &settings.data_dir().display().to_string());
    Output::kv("Index database", &settings.sqlite_path().display().to_string());
    Output::kv("PDF sources", &settings.pdf_dir().display().to_string());
    Output::kv("Video sources", &settings.video_dir().display().to_string());
    Output::kv("Embedding model", &settings.embedding.model);
    Output::kv("Generation model", &settings.generation.model);
    Output::kv(
        "Relevance threshold",
        &format!("{:.2}", settings.retrieval.relevance_threshold),
    );

    let indexed = orchestrator.indexed_sources().await?;
    let store = orchestrator.store();
    let pdf_chunks = store.chunk_count(Modality::Pdf).await?;
    let video_chunks = store.chunk_count(Modality::Video).await?;

    Output::header("Index");
    if indexed.is_empty() {
        Output::info("The index is empty. Run 'svar build' to index your sources.");
        return Ok(());
    }

    Output::kv("PDF documents", &indexed.pdfs.len().to_string());
    Output::kv("Video transcripts", &indexed.videos.len().to_string());
    Output::kv("PDF chunks", &pdf_chunks.to_string());
    Output::kv("Video chunks", &video_chunks.to_string());

    if !indexed.pdfs.is_empty() {
        Output::header("PDF Documents");
        for pdf in &indexed.pdfs {
            Output::list_item(pdf);
        }
    }

    if !indexed.videos.is_empty() {
        Output::header("Video Transcripts");
        for video in &indexed.videos {
            Output::list_item(video);
        }
    }

    Ok(())
}
