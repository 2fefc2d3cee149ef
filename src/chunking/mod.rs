//! Source segment extraction abstraction.
//!
//! Raw PDF and video parsing happen outside this crate; what the index
//! consumes are pre-extracted segments with their citation coordinates.
//! This module defines the segment shapes and the `SourceChunker` seam,
//! plus a JSON-file-backed implementation.

mod json;

pub use json::JsonChunker;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An extracted PDF paragraph with its citation coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfSegment {
    /// Paragraph text.
    pub text: String,
    /// Page number (1-based).
    pub page_number: u32,
    /// Paragraph index within the page (0-based).
    pub paragraph_index: u32,
    /// Document or section title.
    pub title: String,
}

/// An extracted video transcript segment with its span coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSegment {
    /// Transcript text of the segment.
    pub text: String,
    /// Start time in seconds.
    pub start_timestamp: f64,
    /// End time in seconds.
    pub end_timestamp: f64,
    /// Index of the first token in the transcript token sequence.
    pub start_token_id: i64,
    /// Index of the last token in the transcript token sequence.
    pub end_token_id: i64,
}

/// Trait for source segment providers.
///
/// A source that cannot be read or parsed fails with `SourceUnavailable`;
/// the build treats that as a skippable per-source failure.
#[async_trait]
pub trait SourceChunker: Send + Sync {
    /// Extract the segments of a PDF source.
    async fn chunk_pdf(&self, pdf_filename: &str) -> Result<Vec<PdfSegment>>;

    /// Extract the segments of a video transcript.
    async fn chunk_video(&self, video_id: &str) -> Result<Vec<VideoSegment>>;

    /// List the PDF sources available for indexing.
    fn list_pdf_sources(&self) -> Result<Vec<String>>;

    /// List the video sources available for indexing.
    fn list_video_sources(&self) -> Result<Vec<String>>;
}
