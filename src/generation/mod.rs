//! Answer generation from a retrieved passage.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for grounded answer generation.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a prose answer to `question` using only `context`.
    async fn generate(&self, question: &str, context: &str) -> Result<String>;
}
