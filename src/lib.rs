//! Svar - Question Answering over Indexed Content
//!
//! A local-first CLI tool for retrieving answers from a dual-modality
//! knowledge base of PDF documents and video transcripts.
//!
//! The name "Svar" comes from the Norwegian/Scandinavian word for "answer."
//!
//! # Overview
//!
//! Svar allows you to:
//! - Index pre-extracted PDF paragraphs and video transcript segments
//! - Ask questions and get a grounded answer with a precise citation
//!   (page/paragraph for PDFs, timestamp/token span for videos)
//! - Decline to answer when nothing retrieved is relevant enough
//! - Keep the index up to date incrementally without re-processing sources
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `chunking` - Source segment extraction abstraction
//! - `embedding` - Embedding generation
//! - `generation` - LLM answer generation
//! - `vector_store` - Dual-modality chunk store and similarity search
//! - `query` - Query validation and embedding
//! - `answer` - Confidence-gated answer decision engine
//! - `summary` - Knowledge summary generation and caching
//! - `orchestrator` - Index lifecycle coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use svar::config::Settings;
//! use svar::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let report = orchestrator.build_index(false).await?;
//!     println!("Indexed {} sources", report.indexed.len());
//!
//!     Ok(())
//! }
//! ```

pub mod answer;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod openai;
pub mod orchestrator;
pub mod query;
pub mod summary;
pub mod vector_store;

pub use error::{Result, SvarError};
