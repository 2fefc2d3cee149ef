//! Dual-modality chunk store abstraction for Svar.
//!
//! Provides a trait-based interface for chunk store backends, partitioned
//! by content modality (PDF pages vs. video transcripts), plus the ranking
//! rules shared by every backend.

mod memory;
mod sqlite;

pub use memory::MemoryChunkStore;
pub use sqlite::SqliteChunkStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Content modality partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Pdf,
    Video,
}

impl Modality {
    /// Stable string form used in storage and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Pdf => "pdf",
            Modality::Video => "video",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modality-specific citation location of a chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "modality", rename_all = "lowercase")]
pub enum Locator {
    Pdf {
        /// Source PDF filename.
        pdf_filename: String,
        /// Page number (1-based).
        page_number: u32,
        /// Paragraph index within the page (0-based).
        paragraph_index: u32,
        /// Document or section title.
        title: String,
    },
    Video {
        /// Source video ID.
        video_id: String,
        /// Segment start time in seconds.
        start_timestamp: f64,
        /// Segment end time in seconds.
        end_timestamp: f64,
        /// Index of the first transcript token in this segment.
        start_token_id: i64,
        /// Index of the last transcript token in this segment.
        end_token_id: i64,
    },
}

impl Locator {
    /// Modality this locator belongs to.
    pub fn modality(&self) -> Modality {
        match self {
            Locator::Pdf { .. } => Modality::Pdf,
            Locator::Video { .. } => Modality::Video,
        }
    }

    /// Manifest key of the source this locator points into.
    pub fn source_key(&self) -> &str {
        match self {
            Locator::Pdf { pdf_filename, .. } => pdf_filename,
            Locator::Video { video_id, .. } => video_id,
        }
    }
}

/// A unit of indexed content with its embedding and citation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier, unique per chunk within its modality.
    pub document_id: String,
    /// Text snippet used for citations and generation context.
    pub text: String,
    /// Embedding vector. Dimensionality is constant across the store.
    pub embedding: Vec<f32>,
    /// Citation location within the source.
    pub locator: Locator,
    /// When this chunk was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Chunk {
    /// Create a chunk with a deterministic document ID derived from the
    /// locator. Deterministic IDs keep equal-score tie-breaking stable
    /// across rebuilds.
    pub fn new(text: String, embedding: Vec<f32>, locator: Locator) -> Self {
        let document_id = match &locator {
            Locator::Pdf {
                pdf_filename,
                page_number,
                paragraph_index,
                ..
            } => format!("pdf:{}:{}:{}", pdf_filename, page_number, paragraph_index),
            Locator::Video {
                video_id,
                start_token_id,
                ..
            } => format!("video:{}:{}", video_id, start_token_id),
        };

        Self {
            document_id,
            text,
            embedding,
            locator,
            indexed_at: Utc::now(),
        }
    }

    /// Modality of this chunk.
    pub fn modality(&self) -> Modality {
        self.locator.modality()
    }

    /// Manifest key of the source this chunk came from.
    pub fn source_key(&self) -> &str {
        self.locator.source_key()
    }
}

/// A chunk paired with its similarity score against a query.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Cosine similarity in [-1, 1], higher is more relevant.
    pub score: f32,
}

/// Reference to an indexable source: a PDF filename or a video ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceRef {
    Pdf(String),
    Video(String),
}

impl SourceRef {
    pub fn modality(&self) -> Modality {
        match self {
            SourceRef::Pdf(_) => Modality::Pdf,
            SourceRef::Video(_) => Modality::Video,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            SourceRef::Pdf(k) | SourceRef::Video(k) => k,
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.modality(), self.key())
    }
}

/// Sources recorded in the index manifest, per modality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexedSources {
    /// Indexed PDF filenames.
    pub pdfs: BTreeSet<String>,
    /// Indexed video IDs.
    pub videos: BTreeSet<String>,
}

impl IndexedSources {
    /// True when no source has been indexed in either modality.
    pub fn is_empty(&self) -> bool {
        self.pdfs.is_empty() && self.videos.is_empty()
    }
}

/// Trait for chunk store implementations.
///
/// The manifest carried by the store is the sole authority for
/// "already indexed" decisions; implementations must commit a source's
/// chunks and manifest entry atomically.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Atomically replace all chunks for a source and record it in the
    /// manifest. Either everything commits or nothing does.
    async fn commit_source(&self, source: &SourceRef, chunks: &[Chunk]) -> Result<usize>;

    /// Search one modality partition for the closest chunks, best first.
    ///
    /// Fails with `EmptyIndex` when the partition holds no chunks.
    async fn search(
        &self,
        query_embedding: &[f32],
        modality: Modality,
        limit: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Remove a source's chunks and manifest entry.
    async fn delete_source(&self, source: &SourceRef) -> Result<usize>;

    /// Read the manifest.
    async fn list_indexed(&self) -> Result<IndexedSources>;

    /// Check the manifest for a single source.
    async fn is_indexed(&self, source: &SourceRef) -> Result<bool>;

    /// Discard all chunks and the entire manifest.
    async fn clear(&self) -> Result<()>;

    /// Number of chunks in one modality partition.
    async fn chunk_count(&self, modality: Modality) -> Result<usize>;

    /// A few chunk texts from one partition, for summary generation.
    async fn sample_texts(&self, modality: Modality, limit: usize) -> Result<Vec<String>>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Order results by descending score; equal scores break ties by
/// lexicographically smaller document ID so ranking is deterministic.
pub fn rank_results(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.document_id.cmp(&b.chunk.document_id))
    });
}

/// Merge the best candidate from each modality into a single winner.
///
/// On an exact score tie the PDF candidate wins. The preference is
/// arbitrary but fixed so repeated queries return the same answer type.
pub fn best_match(
    pdf: Option<SearchResult>,
    video: Option<SearchResult>,
) -> Option<SearchResult> {
    match (pdf, video) {
        (Some(p), Some(v)) => {
            if v.score > p.score {
                Some(v)
            } else {
                Some(p)
            }
        }
        (Some(p), None) => Some(p),
        (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}
