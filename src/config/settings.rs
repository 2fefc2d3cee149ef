//! Configuration settings for Svar.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub openai: OpenAiSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub retrieval: RetrievalSettings,
    pub sources: SourceSettings,
    pub vector_store: VectorStoreSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.svar".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// OpenAI API settings.
///
/// Passed explicitly to the embedding and generation clients at
/// construction time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// API key. Falls back to the OPENAI_API_KEY environment variable
    /// when unset.
    pub api_key: Option<String>,
    /// Override for the API base URL (e.g. a proxy or compatible server).
    pub api_base: Option<String>,
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions. Constant across the whole chunk store.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// LLM model for answer and summary generation.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
        }
    }
}

/// Retrieval and answer decision settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Minimum similarity score for a match to be answerable (inclusive).
    pub relevance_threshold: f32,
    /// Maximum number of candidates returned per modality search.
    pub max_results: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.75,
            max_results: 5,
        }
    }
}

/// Source content directories.
///
/// Each directory holds pre-extracted segment files, one JSON file per
/// source (see `chunking::JsonChunker` for the expected layout).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Directory of extracted PDF paragraph files.
    pub pdf_dir: String,
    /// Directory of extracted video transcript files.
    pub video_dir: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            pdf_dir: "~/.svar/sources/pdfs".to_string(),
            video_dir: "~/.svar/sources/videos".to_string(),
        }
    }
}

/// Chunk store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Chunk store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.svar/index.db".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SvarError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("svar")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Get the expanded PDF source directory.
    pub fn pdf_dir(&self) -> PathBuf {
        Self::expand_path(&self.sources.pdf_dir)
    }

    /// Get the expanded video source directory.
    pub fn video_dir(&self) -> PathBuf {
        Self::expand_path(&self.sources.video_dir)
    }

    /// Path of the cached knowledge summary JSON file.
    pub fn summary_path(&self) -> PathBuf {
        self.data_dir().join("knowledge_summary.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.embedding.dimensions, 1536);
        assert!((settings.retrieval.relevance_threshold - 0.75).abs() < f32::EPSILON);
        assert_eq!(settings.vector_store.provider, "sqlite");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [retrieval]
            relevance_threshold = 0.6
            "#,
        )
        .unwrap();

        assert!((settings.retrieval.relevance_threshold - 0.6).abs() < f32::EPSILON);
        assert_eq!(settings.retrieval.max_results, 5);
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
    }
}
