//! Confidence-gated answer decision engine.
//!
//! Three terminal outcomes per query: a PDF-grounded answer, a
//! video-grounded answer, or a decline. The decision is made by
//! thresholding the best cross-modal match; the citation payload is a
//! tagged union carrying only the matched modality's locator fields.

mod engine;

pub use engine::AnswerEngine;

use crate::vector_store::{Locator, SearchResult};
use serde::Serialize;

/// Advisory message returned when nothing retrieved clears the threshold.
pub const NO_ANSWER_MESSAGE: &str =
    "I couldn't find relevant information in the knowledge base to answer this question.";

/// Citation for an answer grounded in a PDF paragraph.
#[derive(Debug, Clone, Serialize)]
pub struct PdfCitation {
    pub pdf_filename: String,
    pub page_number: u32,
    pub paragraph_index: u32,
    pub title: String,
    pub snippet: String,
    pub score: f32,
    pub document_id: String,
}

/// Citation for an answer grounded in a video transcript segment.
#[derive(Debug, Clone, Serialize)]
pub struct VideoCitation {
    pub video_id: String,
    pub start_timestamp: f64,
    pub end_timestamp: f64,
    pub start_token_id: i64,
    pub end_token_id: i64,
    pub transcript_snippet: String,
    pub score: f32,
    pub document_id: String,
}

/// Structured answer returned to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "answer_type", rename_all = "snake_case")]
pub enum AnswerResponse {
    Pdf {
        answer: String,
        source: PdfCitation,
    },
    Video {
        answer: String,
        source: VideoCitation,
    },
    NoAnswer {
        message: String,
    },
}

impl AnswerResponse {
    /// The answer type tag as a string.
    pub fn answer_type(&self) -> &'static str {
        match self {
            AnswerResponse::Pdf { .. } => "pdf",
            AnswerResponse::Video { .. } => "video",
            AnswerResponse::NoAnswer { .. } => "no_answer",
        }
    }
}

/// Whether a match clears the relevance threshold.
///
/// The bound is inclusive: a score exactly at the threshold is answerable.
pub fn is_answerable(best: Option<&SearchResult>, relevance_threshold: f32) -> bool {
    best.is_some_and(|m| m.score >= relevance_threshold)
}

/// Build the citation payload for a winning match.
pub(crate) fn build_response(answer: String, best: &SearchResult) -> AnswerResponse {
    match &best.chunk.locator {
        Locator::Pdf {
            pdf_filename,
            page_number,
            paragraph_index,
            title,
        } => AnswerResponse::Pdf {
            answer,
            source: PdfCitation {
                pdf_filename: pdf_filename.clone(),
                page_number: *page_number,
                paragraph_index: *paragraph_index,
                title: title.clone(),
                snippet: best.chunk.text.clone(),
                score: best.score,
                document_id: best.chunk.document_id.clone(),
            },
        },
        Locator::Video {
            video_id,
            start_timestamp,
            end_timestamp,
            start_token_id,
            end_token_id,
        } => AnswerResponse::Video {
            answer,
            source: VideoCitation {
                video_id: video_id.clone(),
                start_timestamp: *start_timestamp,
                end_timestamp: *end_timestamp,
                start_token_id: *start_token_id,
                end_token_id: *end_token_id,
                transcript_snippet: best.chunk.text.clone(),
                score: best.score,
                document_id: best.chunk.document_id.clone(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::Chunk;

    fn pdf_match(score: f32) -> SearchResult {
        SearchResult {
            chunk: Chunk::new(
                "snippet".to_string(),
                vec![1.0],
                Locator::Pdf {
                    pdf_filename: "a.pdf".to_string(),
                    page_number: 1,
                    paragraph_index: 0,
                    title: "T".to_string(),
                },
            ),
            score,
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let at = pdf_match(0.75);
        assert!(is_answerable(Some(&at), 0.75));

        let below = pdf_match(0.75 - 1e-4);
        assert!(!is_answerable(Some(&below), 0.75));

        assert!(!is_answerable(None, 0.75));
    }

    #[test]
    fn test_response_serializes_with_tag() {
        let response = build_response("An answer.".to_string(), &pdf_match(0.92));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["answer_type"], "pdf");
        assert_eq!(json["source"]["pdf_filename"], "a.pdf");
        assert_eq!(json["source"]["page_number"], 1);
        assert_eq!(json["source"]["document_id"], "pdf:a.pdf:1:0");
    }
}
