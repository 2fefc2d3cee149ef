//! CLI module for Svar.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Svar - Dual-Modality Knowledge Base Q&A
///
/// A local-first CLI tool for indexing PDF and video transcript content and
/// answering questions with source citations. The name "Svar" comes from the
/// Norwegian/Scandinavian word for "answer."
#[derive(Parser, Debug)]
#[command(name = "svar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index extracted PDF and video sources from the configured directories
    Build {
        /// Discard the existing index and re-process every source
        #[arg(short, long)]
        force: bool,
    },

    /// Ask a question and get a cited answer from the knowledge base
    Ask {
        /// The question to ask
        question: String,

        /// Print the full structured response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search for relevant chunks without generating an answer
    Search {
        /// Search query
        query: String,

        /// Maximum number of results per modality
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Restrict the search to one modality (pdf or video)
        #[arg(short, long)]
        modality: Option<String>,
    },

    /// Show index status and configuration
    Status,

    /// Show the knowledge base summary
    Summary,
}
