//! Answer engine implementation.

use super::{build_response, is_answerable, AnswerResponse, NO_ANSWER_MESSAGE};
use crate::embedding::Embedder;
use crate::error::{Result, SvarError};
use crate::generation::Generator;
use crate::query::QueryProcessor;
use crate::vector_store::{best_match, ChunkStore, Modality, SearchResult};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answers questions by searching both modality partitions and gating the
/// best match on the configured relevance threshold.
pub struct AnswerEngine {
    query_processor: QueryProcessor,
    store: Arc<dyn ChunkStore>,
    generator: Arc<dyn Generator>,
    relevance_threshold: f32,
    max_results: usize,
}

impl AnswerEngine {
    /// Create a new answer engine.
    ///
    /// `relevance_threshold` comes from configuration; this layer never
    /// hard-codes a cutoff.
    pub fn new(
        store: Arc<dyn ChunkStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        relevance_threshold: f32,
        max_results: usize,
    ) -> Self {
        Self {
            query_processor: QueryProcessor::new(embedder),
            store,
            generator,
            relevance_threshold,
            max_results,
        }
    }

    /// Answer a question, or decline when nothing retrieved is relevant.
    ///
    /// Fails with `EmptyIndex` when neither modality has any chunks, and
    /// surfaces generation failures unchanged rather than downgrading them
    /// to a decline.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn answer(&self, question: &str) -> Result<AnswerResponse> {
        let query_embedding = self.query_processor.process_query(question).await?;

        let pdf_best = self.search_partition(&query_embedding, Modality::Pdf).await?;
        let video_best = self
            .search_partition(&query_embedding, Modality::Video)
            .await?;

        // A non-empty partition always yields a candidate, so two empty
        // sides mean the whole index is empty: "not ready" rather than a
        // low-relevance decline.
        if pdf_best.is_none() && video_best.is_none() {
            return Err(SvarError::EmptyIndex("pdf and video".to_string()));
        }

        let best = match best_match(pdf_best, video_best) {
            Some(m) if is_answerable(Some(&m), self.relevance_threshold) => m,
            Some(m) => {
                info!(
                    "Best match {} scored {:.3}, below threshold {:.3}",
                    m.chunk.document_id, m.score, self.relevance_threshold
                );
                return Ok(AnswerResponse::NoAnswer {
                    message: NO_ANSWER_MESSAGE.to_string(),
                });
            }
            None => {
                return Ok(AnswerResponse::NoAnswer {
                    message: NO_ANSWER_MESSAGE.to_string(),
                });
            }
        };

        debug!(
            "Answering from {} (score {:.3})",
            best.chunk.document_id, best.score
        );

        let answer = self.generator.generate(question, &best.chunk.text).await?;
        Ok(build_response(answer, &best))
    }

    /// Best candidate from one partition, treating an empty partition as
    /// having no candidates. Only when both partitions turn out empty does
    /// the caller report `EmptyIndex`.
    async fn search_partition(
        &self,
        query_embedding: &[f32],
        modality: Modality,
    ) -> Result<Option<SearchResult>> {
        match self
            .store
            .search(query_embedding, modality, self.max_results)
            .await
        {
            Ok(results) => Ok(results.into_iter().next()),
            Err(SvarError::EmptyIndex(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
