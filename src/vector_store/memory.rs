//! In-memory chunk store implementation.
//!
//! Useful for testing and small datasets.

use super::{
    cosine_similarity, rank_results, Chunk, ChunkStore, IndexedSources, Modality, SearchResult,
    SourceRef,
};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

#[derive(Default)]
struct Inner {
    chunks: HashMap<(Modality, String), Chunk>,
    manifest: HashSet<(Modality, String)>,
}

/// In-memory chunk store.
pub struct MemoryChunkStore {
    inner: RwLock<Inner>,
}

impl MemoryChunkStore {
    /// Create a new in-memory chunk store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn commit_source(&self, source: &SourceRef, chunks: &[Chunk]) -> Result<usize> {
        let mut inner = self.inner.write().unwrap();
        let modality = source.modality();

        inner
            .chunks
            .retain(|(m, _), c| *m != modality || c.source_key() != source.key());
        for chunk in chunks {
            inner
                .chunks
                .insert((modality, chunk.document_id.clone()), chunk.clone());
        }
        inner.manifest.insert((modality, source.key().to_string()));

        Ok(chunks.len())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        modality: Modality,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let inner = self.inner.read().unwrap();

        let mut results: Vec<SearchResult> = inner
            .chunks
            .iter()
            .filter(|((m, _), _)| *m == modality)
            .map(|(_, chunk)| {
                let score = cosine_similarity(query_embedding, &chunk.embedding);
                SearchResult {
                    chunk: chunk.clone(),
                    score,
                }
            })
            .collect();

        if results.is_empty() {
            return Err(SvarError::EmptyIndex(modality.as_str().to_string()));
        }

        rank_results(&mut results);
        results.truncate(limit);

        Ok(results)
    }

    async fn delete_source(&self, source: &SourceRef) -> Result<usize> {
        let mut inner = self.inner.write().unwrap();
        let modality = source.modality();

        let initial_len = inner.chunks.len();
        inner
            .chunks
            .retain(|(m, _), c| *m != modality || c.source_key() != source.key());
        inner.manifest.remove(&(modality, source.key().to_string()));

        Ok(initial_len - inner.chunks.len())
    }

    async fn list_indexed(&self) -> Result<IndexedSources> {
        let inner = self.inner.read().unwrap();

        let mut indexed = IndexedSources::default();
        for (modality, source_key) in &inner.manifest {
            match modality {
                Modality::Pdf => indexed.pdfs.insert(source_key.clone()),
                Modality::Video => indexed.videos.insert(source_key.clone()),
            };
        }

        Ok(indexed)
    }

    async fn is_indexed(&self, source: &SourceRef) -> Result<bool> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .manifest
            .contains(&(source.modality(), source.key().to_string())))
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.chunks.clear();
        inner.manifest.clear();
        Ok(())
    }

    async fn chunk_count(&self, modality: Modality) -> Result<usize> {
        let inner = self.inner.read().unwrap();
        Ok(inner.chunks.keys().filter(|(m, _)| *m == modality).count())
    }

    async fn sample_texts(&self, modality: Modality, limit: usize) -> Result<Vec<String>> {
        let inner = self.inner.read().unwrap();

        let mut entries: Vec<(&String, &Chunk)> = inner
            .chunks
            .iter()
            .filter(|((m, _), _)| *m == modality)
            .map(|((_, id), chunk)| (id, chunk))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        Ok(entries
            .into_iter()
            .take(limit)
            .map(|(_, chunk)| chunk.text.clone())
            .collect())
    }
}
