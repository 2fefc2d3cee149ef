//! Query validation and embedding.
//!
//! The query text is embedded as-is: the embedding model sees the full
//! natural-language question, which is what the content chunks were
//! embedded from. [`preprocess_text`] is a keyword-cleaning utility kept
//! for callers that want stripped query terms (e.g. for display or
//! keyword search); it is deliberately not applied before embedding.

use crate::embedding::Embedder;
use crate::error::{Result, SvarError};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// English stop words removed by [`preprocess_text`].
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "being", "below", "between", "both", "but", "by", "can",
    "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from", "further",
    "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if",
    "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who",
    "whom", "why", "will", "with", "you", "your", "yours",
];

/// Processes user questions into query embeddings.
pub struct QueryProcessor {
    embedder: Arc<dyn Embedder>,
}

impl QueryProcessor {
    /// Create a new query processor.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Validate and embed a user query.
    ///
    /// Fails with `InvalidInput` for empty or whitespace-only queries.
    /// Embedding-service failures propagate unchanged; retry policy
    /// belongs to the caller.
    #[instrument(skip(self, query))]
    pub async fn process_query(&self, query: &str) -> Result<Vec<f32>> {
        if query.trim().is_empty() {
            return Err(SvarError::InvalidInput(
                "Query cannot be empty".to_string(),
            ));
        }

        info!("Processing query: {:.100}", query);

        let embedding = self.embedder.embed(query).await?;
        debug!("Generated query embedding of dimension {}", embedding.len());
        Ok(embedding)
    }
}

/// Normalize and clean query text.
///
/// Removes punctuation and English stop words and collapses whitespace.
/// Example: "What is OpenStax?" -> "OpenStax".
pub fn preprocess_text(text: &str) -> String {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(&word.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}
