//! Configuration module for Svar.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts, SummaryPrompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, GenerationSettings, OpenAiSettings, RetrievalSettings,
    Settings, SourceSettings, VectorStoreSettings,
};
