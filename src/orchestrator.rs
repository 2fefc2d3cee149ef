//! Index lifecycle coordination for Svar.
//!
//! Coordinates building the index from extracted sources: diffing against
//! the manifest, embedding, per-source atomic commits, and knowledge
//! summary regeneration.

use crate::answer::AnswerEngine;
use crate::chunking::{JsonChunker, SourceChunker};
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, SvarError};
use crate::generation::{Generator, OpenAIGenerator};
use crate::summary::{KnowledgeSummary, KnowledgeSummaryGenerator};
use crate::vector_store::{
    Chunk, ChunkStore, IndexedSources, Locator, MemoryChunkStore, Modality, SourceRef,
    SqliteChunkStore,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main orchestrator for the Svar index lifecycle.
pub struct Orchestrator {
    settings: Settings,
    chunker: Arc<dyn SourceChunker>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    store: Arc<dyn ChunkStore>,
    summary_generator: Option<KnowledgeSummaryGenerator>,
    build_in_progress: AtomicBool,
}

/// Result of a build run.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Sources processed and committed in this run.
    pub indexed: Vec<String>,
    /// Sources left untouched because the manifest already had them.
    pub skipped: Vec<String>,
    /// Sources that failed and were skipped; the rest of the build
    /// continued without them.
    pub failed: Vec<String>,
}

/// Resets the build flag when a build run ends, for any exit path.
struct BuildGuard<'a>(&'a AtomicBool);

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Orchestrator {
    /// Create a new orchestrator with default components.
    pub fn new(settings: Settings) -> Result<Self> {
        let chunker: Arc<dyn SourceChunker> =
            Arc::new(JsonChunker::new(settings.pdf_dir(), settings.video_dir()));

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::new(
            &settings.openai,
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let generator: Arc<dyn Generator> = Arc::new(OpenAIGenerator::new(
            &settings.openai,
            &settings.generation.model,
            settings.generation.temperature,
        ));

        let store: Arc<dyn ChunkStore> = match settings.vector_store.provider.as_str() {
            "memory" => Arc::new(MemoryChunkStore::new()),
            _ => Arc::new(SqliteChunkStore::new(&settings.sqlite_path())?),
        };

        let summary_generator = Some(KnowledgeSummaryGenerator::new(
            &settings.openai,
            &settings.generation.model,
            settings.summary_path(),
        ));

        Ok(Self {
            settings,
            chunker,
            embedder,
            generator,
            store,
            summary_generator,
            build_in_progress: AtomicBool::new(false),
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        chunker: Arc<dyn SourceChunker>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        store: Arc<dyn ChunkStore>,
        summary_generator: Option<KnowledgeSummaryGenerator>,
    ) -> Self {
        Self {
            settings,
            chunker,
            embedder,
            generator,
            store,
            summary_generator,
            build_in_progress: AtomicBool::new(false),
        }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a reference to the chunk store.
    pub fn store(&self) -> Arc<dyn ChunkStore> {
        self.store.clone()
    }

    /// Build an answer engine wired to this orchestrator's components.
    pub fn answer_engine(&self) -> AnswerEngine {
        AnswerEngine::new(
            self.store.clone(),
            self.embedder.clone(),
            self.generator.clone(),
            self.settings.retrieval.relevance_threshold,
            self.settings.retrieval.max_results,
        )
    }

    /// True iff at least one source has been indexed.
    pub async fn check_index_exists(&self) -> Result<bool> {
        Ok(!self.store.list_indexed().await?.is_empty())
    }

    /// Read the manifest of indexed sources.
    pub async fn indexed_sources(&self) -> Result<IndexedSources> {
        self.store.list_indexed().await
    }

    /// Load the cached knowledge summary, if one exists.
    pub fn load_summary(&self) -> Option<KnowledgeSummary> {
        self.summary_generator.as_ref().and_then(|g| g.load())
    }

    /// Discover sources in the configured directories and build the index.
    pub async fn build_index(&self, force_rebuild: bool) -> Result<BuildReport> {
        let pdfs = self.chunker.list_pdf_sources()?;
        let videos = self.chunker.list_video_sources()?;
        self.build_sources(&pdfs, &videos, force_rebuild).await
    }

    /// Build the index from explicit source lists.
    ///
    /// Incremental by default: sources already in the manifest are left
    /// untouched, so a re-run with the same set is a no-op. With
    /// `force_rebuild` the store and manifest are discarded first and
    /// every source is processed from scratch. Concurrent builds are
    /// rejected with `BuildInProgress`.
    #[instrument(skip_all, fields(pdfs = pdfs.len(), videos = videos.len(), force = force_rebuild))]
    pub async fn build_sources(
        &self,
        pdfs: &[String],
        videos: &[String],
        force_rebuild: bool,
    ) -> Result<BuildReport> {
        if self
            .build_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SvarError::BuildInProgress);
        }
        let _guard = BuildGuard(&self.build_in_progress);

        if force_rebuild {
            info!("Force rebuild: discarding existing index");
            self.store.clear().await?;
        }

        // The manifest is read once up front and is the sole authority
        // for skipping already-indexed sources.
        let already = self.store.list_indexed().await?;

        let mut report = BuildReport::default();

        for pdf in pdfs {
            let source = SourceRef::Pdf(pdf.clone());
            if !force_rebuild && already.pdfs.contains(pdf) {
                report.skipped.push(source.to_string());
                continue;
            }
            self.process_source(&source, &mut report).await;
        }

        for video in videos {
            let source = SourceRef::Video(video.clone());
            if !force_rebuild && already.videos.contains(video) {
                report.skipped.push(source.to_string());
                continue;
            }
            self.process_source(&source, &mut report).await;
        }

        info!(
            "Build complete: {} indexed, {} skipped, {} failed",
            report.indexed.len(),
            report.skipped.len(),
            report.failed.len()
        );

        // Summary regeneration is best-effort; its failure never fails
        // the build.
        if let Err(e) = self.regenerate_summary().await {
            warn!("Failed to regenerate knowledge summary: {}", e);
        }

        Ok(report)
    }

    /// Chunk, embed, and commit one source, recording the outcome. A
    /// failed source leaves no trace in the store or manifest.
    async fn process_source(&self, source: &SourceRef, report: &mut BuildReport) {
        match self.index_source(source).await {
            Ok(count) => {
                info!("Indexed {} ({} chunks)", source, count);
                report.indexed.push(source.to_string());
            }
            Err(e) => {
                warn!("Skipping source {}: {}", source, e);
                report.failed.push(source.to_string());
            }
        }
    }

    async fn index_source(&self, source: &SourceRef) -> Result<usize> {
        let chunks = match source {
            SourceRef::Pdf(pdf_filename) => {
                let segments = self.chunker.chunk_pdf(pdf_filename).await?;
                let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
                let embeddings = self.embedder.embed_batch(&texts).await?;

                segments
                    .into_iter()
                    .zip(embeddings)
                    .map(|(segment, embedding)| {
                        Chunk::new(
                            segment.text,
                            embedding,
                            Locator::Pdf {
                                pdf_filename: pdf_filename.clone(),
                                page_number: segment.page_number,
                                paragraph_index: segment.paragraph_index,
                                title: segment.title,
                            },
                        )
                    })
                    .collect::<Vec<_>>()
            }
            SourceRef::Video(video_id) => {
                let segments = self.chunker.chunk_video(video_id).await?;
                let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
                let embeddings = self.embedder.embed_batch(&texts).await?;

                segments
                    .into_iter()
                    .zip(embeddings)
                    .map(|(segment, embedding)| {
                        Chunk::new(
                            segment.text,
                            embedding,
                            Locator::Video {
                                video_id: video_id.clone(),
                                start_timestamp: segment.start_timestamp,
                                end_timestamp: segment.end_timestamp,
                                start_token_id: segment.start_token_id,
                                end_token_id: segment.end_token_id,
                            },
                        )
                    })
                    .collect::<Vec<_>>()
            }
        };

        self.store.commit_source(source, &chunks).await
    }

    async fn regenerate_summary(&self) -> Result<()> {
        let Some(generator) = &self.summary_generator else {
            return Ok(());
        };

        let indexed = self.store.list_indexed().await?;
        if indexed.is_empty() {
            return Ok(());
        }

        let pdf_samples = self.store.sample_texts(Modality::Pdf, 5).await?;
        let video_samples = self.store.sample_texts(Modality::Video, 5).await?;

        generator
            .generate(&indexed, &pdf_samples, &video_samples)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::{PdfSegment, VideoSegment};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Chunker serving fixed segments; sources named "corrupt*" fail.
    struct FixtureChunker {
        pdfs: HashMap<String, Vec<PdfSegment>>,
        videos: HashMap<String, Vec<VideoSegment>>,
    }

    impl FixtureChunker {
        fn new() -> Self {
            let mut pdfs = HashMap::new();
            pdfs.insert(
                "physics.pdf".to_string(),
                vec![
                    PdfSegment {
                        text: "Forces and motion.".to_string(),
                        page_number: 1,
                        paragraph_index: 0,
                        title: "Physics".to_string(),
                    },
                    PdfSegment {
                        text: "Energy conservation.".to_string(),
                        page_number: 2,
                        paragraph_index: 0,
                        title: "Physics".to_string(),
                    },
                ],
            );
            pdfs.insert(
                "chemistry.pdf".to_string(),
                vec![PdfSegment {
                    text: "Atomic structure.".to_string(),
                    page_number: 1,
                    paragraph_index: 0,
                    title: "Chemistry".to_string(),
                }],
            );

            let mut videos = HashMap::new();
            videos.insert(
                "lecture01".to_string(),
                vec![VideoSegment {
                    text: "Welcome to the course.".to_string(),
                    start_timestamp: 0.0,
                    end_timestamp: 12.5,
                    start_token_id: 0,
                    end_token_id: 40,
                }],
            );

            Self { pdfs, videos }
        }
    }

    #[async_trait]
    impl SourceChunker for FixtureChunker {
        async fn chunk_pdf(&self, pdf_filename: &str) -> Result<Vec<PdfSegment>> {
            if pdf_filename.starts_with("corrupt") {
                return Err(SvarError::SourceUnavailable(pdf_filename.to_string()));
            }
            self.pdfs
                .get(pdf_filename)
                .cloned()
                .ok_or_else(|| SvarError::SourceUnavailable(pdf_filename.to_string()))
        }

        async fn chunk_video(&self, video_id: &str) -> Result<Vec<VideoSegment>> {
            if video_id.starts_with("corrupt") {
                return Err(SvarError::SourceUnavailable(video_id.to_string()));
            }
            self.videos
                .get(video_id)
                .cloned()
                .ok_or_else(|| SvarError::SourceUnavailable(video_id.to_string()))
        }

        fn list_pdf_sources(&self) -> Result<Vec<String>> {
            let mut sources: Vec<String> = self.pdfs.keys().cloned().collect();
            sources.sort();
            Ok(sources)
        }

        fn list_video_sources(&self) -> Result<Vec<String>> {
            let mut sources: Vec<String> = self.videos.keys().cloned().collect();
            sources.sort();
            Ok(sources)
        }
    }

    struct TestEmbedder;

    #[async_trait]
    impl Embedder for TestEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    struct TestGenerator;

    #[async_trait]
    impl Generator for TestGenerator {
        async fn generate(&self, _question: &str, context: &str) -> Result<String> {
            Ok(context.to_string())
        }
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::with_components(
            Settings::default(),
            Arc::new(FixtureChunker::new()),
            Arc::new(TestEmbedder),
            Arc::new(TestGenerator),
            Arc::new(MemoryChunkStore::new()),
            None,
        )
    }

    #[tokio::test]
    async fn test_build_indexes_all_sources() {
        let orch = orchestrator();

        assert!(!orch.check_index_exists().await.unwrap());

        let report = orch.build_index(false).await.unwrap();
        assert_eq!(report.indexed.len(), 3);
        assert!(report.failed.is_empty());

        assert!(orch.check_index_exists().await.unwrap());
        let indexed = orch.indexed_sources().await.unwrap();
        assert!(indexed.pdfs.contains("physics.pdf"));
        assert!(indexed.pdfs.contains("chemistry.pdf"));
        assert!(indexed.videos.contains("lecture01"));

        assert_eq!(orch.store().chunk_count(Modality::Pdf).await.unwrap(), 3);
        assert_eq!(orch.store().chunk_count(Modality::Video).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_incremental_rerun_is_noop() {
        let orch = orchestrator();

        orch.build_index(false).await.unwrap();
        let before = orch.indexed_sources().await.unwrap();
        let pdf_count = orch.store().chunk_count(Modality::Pdf).await.unwrap();

        let report = orch.build_index(false).await.unwrap();
        assert!(report.indexed.is_empty());
        assert_eq!(report.skipped.len(), 3);

        let after = orch.indexed_sources().await.unwrap();
        assert_eq!(before.pdfs, after.pdfs);
        assert_eq!(before.videos, after.videos);
        assert_eq!(
            orch.store().chunk_count(Modality::Pdf).await.unwrap(),
            pdf_count
        );
    }

    #[tokio::test]
    async fn test_incremental_adds_only_new_sources() {
        let orch = orchestrator();

        let first = vec!["physics.pdf".to_string()];
        orch.build_sources(&first, &[], false).await.unwrap();

        let all = vec!["physics.pdf".to_string(), "chemistry.pdf".to_string()];
        let report = orch.build_sources(&all, &[], false).await.unwrap();

        assert_eq!(report.indexed, vec!["pdf:chemistry.pdf"]);
        assert_eq!(report.skipped, vec!["pdf:physics.pdf"]);
    }

    #[tokio::test]
    async fn test_force_rebuild_clears_prior_state() {
        let orch = orchestrator();

        orch.build_index(false).await.unwrap();

        // Force-build with a smaller source set; only it should remain.
        let subset = vec!["chemistry.pdf".to_string()];
        let report = orch.build_sources(&subset, &[], true).await.unwrap();
        assert_eq!(report.indexed, vec!["pdf:chemistry.pdf"]);

        let indexed = orch.indexed_sources().await.unwrap();
        assert_eq!(indexed.pdfs.len(), 1);
        assert!(indexed.pdfs.contains("chemistry.pdf"));
        assert!(indexed.videos.is_empty());
        assert_eq!(orch.store().chunk_count(Modality::Video).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_partial_failure_continues_build() {
        let orch = orchestrator();

        let sources = vec!["physics.pdf".to_string(), "corrupt.pdf".to_string()];
        let report = orch.build_sources(&sources, &[], false).await.unwrap();

        assert_eq!(report.indexed, vec!["pdf:physics.pdf"]);
        assert_eq!(report.failed, vec!["pdf:corrupt.pdf"]);

        // The failed source left neither manifest entry nor chunks.
        let indexed = orch.indexed_sources().await.unwrap();
        assert!(indexed.pdfs.contains("physics.pdf"));
        assert!(!indexed.pdfs.contains("corrupt.pdf"));
        assert_eq!(orch.store().chunk_count(Modality::Pdf).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_build_rejected() {
        use tokio::sync::Notify;

        /// Chunker that stalls until released, to hold a build open.
        struct StallingChunker {
            release: Arc<Notify>,
        }

        #[async_trait]
        impl SourceChunker for StallingChunker {
            async fn chunk_pdf(&self, _pdf_filename: &str) -> Result<Vec<PdfSegment>> {
                self.release.notified().await;
                Ok(Vec::new())
            }

            async fn chunk_video(&self, _video_id: &str) -> Result<Vec<VideoSegment>> {
                Ok(Vec::new())
            }

            fn list_pdf_sources(&self) -> Result<Vec<String>> {
                Ok(vec!["slow.pdf".to_string()])
            }

            fn list_video_sources(&self) -> Result<Vec<String>> {
                Ok(Vec::new())
            }
        }

        let release = Arc::new(Notify::new());
        let orch = Arc::new(Orchestrator::with_components(
            Settings::default(),
            Arc::new(StallingChunker {
                release: release.clone(),
            }),
            Arc::new(TestEmbedder),
            Arc::new(TestGenerator),
            Arc::new(MemoryChunkStore::new()),
            None,
        ));

        let first = tokio::spawn({
            let orch = orch.clone();
            async move { orch.build_index(false).await }
        });

        // Let the first build reach the stalled chunker.
        tokio::task::yield_now().await;

        let err = orch.build_index(false).await.unwrap_err();
        assert!(matches!(err, SvarError::BuildInProgress));

        release.notify_one();
        first.await.unwrap().unwrap();

        // The flag resets once the first build finishes.
        orch.build_index(false).await.unwrap();
    }

    #[tokio::test]
    async fn test_answer_engine_end_to_end() {
        let orch = orchestrator();
        orch.build_index(false).await.unwrap();

        let engine = orch.answer_engine();
        // TestEmbedder scores every chunk 1.0, above the 0.75 default.
        let response = engine.answer("What is covered?").await.unwrap();
        assert_ne!(response.answer_type(), "no_answer");
    }
}
