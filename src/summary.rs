//! Knowledge summary generation and caching.
//!
//! After a build, an LLM produces a short overview of the indexed
//! content, key topics, and suggested questions. The result is cached as
//! a JSON file and loaded lazily; no summary existing yet is a valid
//! state, and a failed LLM call falls back to a generic summary rather
//! than failing the build.

use crate::config::{OpenAiSettings, Prompts};
use crate::error::{Result, SvarError};
use crate::openai::create_client;
use crate::vector_store::IndexedSources;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// Cached summary of the indexed knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeSummary {
    /// Brief overview of the main topics covered.
    pub overview: String,
    /// Key topics/subjects in the index.
    pub topics: Vec<String>,
    /// Example questions users can ask.
    pub suggested_questions: Vec<String>,
}

/// Generates and caches knowledge summaries.
pub struct KnowledgeSummaryGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    prompts: Prompts,
    summary_path: PathBuf,
}

impl KnowledgeSummaryGenerator {
    /// Create a new summary generator writing to `summary_path`.
    pub fn new(api: &OpenAiSettings, model: &str, summary_path: PathBuf) -> Self {
        Self {
            client: create_client(api),
            model: model.to_string(),
            prompts: Prompts::default(),
            summary_path,
        }
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Generate a summary from the indexed sources and sample chunk
    /// texts, persist it, and return it. An LLM failure yields the
    /// fallback summary instead of an error.
    #[instrument(skip_all)]
    pub async fn generate(
        &self,
        indexed: &IndexedSources,
        pdf_samples: &[String],
        video_samples: &[String],
    ) -> Result<KnowledgeSummary> {
        info!("Generating knowledge summary");

        let context = build_context(indexed, pdf_samples, video_samples);

        let summary = match self.generate_with_llm(&context).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Failed to generate summary with LLM: {}", e);
                fallback_summary()
            }
        };

        self.save(&summary)?;
        Ok(summary)
    }

    async fn generate_with_llm(&self, context: &str) -> Result<KnowledgeSummary> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        let user_prompt = Prompts::render(&self.prompts.summary.user, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.summary.system.clone())
                .build()
                .map_err(|e| SvarError::Summary(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| SvarError::Summary(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .max_tokens(1000u32)
            .build()
            .map_err(|e| SvarError::Summary(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SvarError::OpenAI(format!("Summary API error: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| SvarError::Summary("Empty response from LLM".to_string()))?;

        let summary: KnowledgeSummary = serde_json::from_str(strip_code_fences(content))
            .map_err(|e| SvarError::Summary(format!("Invalid summary JSON: {}", e)))?;

        if summary.overview.is_empty() || summary.suggested_questions.is_empty() {
            return Err(SvarError::Summary("Invalid summary structure".to_string()));
        }

        Ok(summary)
    }

    /// Persist a summary to the cache file.
    pub fn save(&self, summary: &KnowledgeSummary) -> Result<()> {
        if let Some(parent) = self.summary_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(summary)?;
        std::fs::write(&self.summary_path, json)?;
        info!("Summary saved to {:?}", self.summary_path);
        Ok(())
    }

    /// Load the cached summary, if one exists.
    ///
    /// Returns `None` both when no summary has been generated yet and
    /// when the cache file cannot be parsed.
    pub fn load(&self) -> Option<KnowledgeSummary> {
        if !self.summary_path.exists() {
            return None;
        }

        match std::fs::read_to_string(&self.summary_path)
            .map_err(SvarError::from)
            .and_then(|content| serde_json::from_str(&content).map_err(SvarError::from))
        {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("Failed to load summary: {}", e);
                None
            }
        }
    }
}

/// Build the bounded context string fed to the summary prompt.
fn build_context(
    indexed: &IndexedSources,
    pdf_samples: &[String],
    video_samples: &[String],
) -> String {
    const MAX_SOURCES: usize = 10;
    const MAX_SAMPLES: usize = 5;
    const SAMPLE_CHARS: usize = 200;

    let mut parts: Vec<String> = Vec::new();

    if !indexed.pdfs.is_empty() {
        parts.push(format!("PDF Documents ({}):", indexed.pdfs.len()));
        for pdf in indexed.pdfs.iter().take(MAX_SOURCES) {
            parts.push(format!("  - {}", pdf));
        }
        if indexed.pdfs.len() > MAX_SOURCES {
            parts.push(format!("  ... and {} more", indexed.pdfs.len() - MAX_SOURCES));
        }
    }

    if !indexed.videos.is_empty() {
        parts.push(format!("\nVideo Transcripts ({}):", indexed.videos.len()));
        for vid in indexed.videos.iter().take(MAX_SOURCES) {
            parts.push(format!("  - {}", vid));
        }
        if indexed.videos.len() > MAX_SOURCES {
            parts.push(format!(
                "  ... and {} more",
                indexed.videos.len() - MAX_SOURCES
            ));
        }
    }

    if !pdf_samples.is_empty() {
        parts.push("\nSample PDF Content:".to_string());
        for chunk in pdf_samples.iter().take(MAX_SAMPLES) {
            let preview: String = chunk.chars().take(SAMPLE_CHARS).collect();
            parts.push(format!("  - {}...", preview));
        }
    }

    if !video_samples.is_empty() {
        parts.push("\nSample Video Content:".to_string());
        for chunk in video_samples.iter().take(MAX_SAMPLES) {
            let preview: String = chunk.chars().take(SAMPLE_CHARS).collect();
            parts.push(format!("  - {}...", preview));
        }
    }

    parts.join("\n")
}

/// Generic summary used when the LLM call fails.
fn fallback_summary() -> KnowledgeSummary {
    KnowledgeSummary {
        overview: "This knowledge base contains various documents and videos on multiple topics."
            .to_string(),
        topics: vec!["General Knowledge".to_string()],
        suggested_questions: vec![
            "What topics are covered in this knowledge base?".to_string(),
            "Can you summarize the main content?".to_string(),
            "What information is available?".to_string(),
        ],
    }
}

/// Strip a markdown code fence wrapper from an LLM reply, if present.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        rest.split("```").next().unwrap_or(rest).trim()
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest.split("```").next().unwrap_or(rest).trim()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiSettings;

    fn generator(path: PathBuf) -> KnowledgeSummaryGenerator {
        KnowledgeSummaryGenerator::new(&OpenAiSettings::default(), "gpt-4o-mini", path)
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let gen = generator(dir.path().join("data").join("knowledge_summary.json"));

        let summary = KnowledgeSummary {
            overview: "Physics and chemistry content.".to_string(),
            topics: vec!["Mechanics".to_string(), "Thermodynamics".to_string()],
            suggested_questions: vec!["What is Newton's first law?".to_string()],
        };

        gen.save(&summary).unwrap();
        assert_eq!(gen.load(), Some(summary));
    }

    #[test]
    fn test_load_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let gen = generator(dir.path().join("knowledge_summary.json"));
        assert!(gen.load().is_none());
    }

    #[test]
    fn test_load_corrupt_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge_summary.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(generator(path).load().is_none());
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_build_context_limits() {
        let mut indexed = IndexedSources::default();
        for i in 0..15 {
            indexed.pdfs.insert(format!("book{:02}.pdf", i));
        }
        indexed.videos.insert("vid1".to_string());

        let long_sample = "x".repeat(500);
        let context = build_context(&indexed, &[long_sample], &[]);

        assert!(context.contains("PDF Documents (15):"));
        assert!(context.contains("... and 5 more"));
        assert!(context.contains("Video Transcripts (1):"));
        // Samples are truncated to 200 chars plus ellipsis.
        assert!(context.contains(&format!("  - {}...", "x".repeat(200))));
        assert!(!context.contains(&"x".repeat(201)));
    }

    #[test]
    fn test_fallback_shape() {
        let summary = fallback_summary();
        assert!(!summary.overview.is_empty());
        assert!(!summary.suggested_questions.is_empty());
    }
}
