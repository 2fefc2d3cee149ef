//! JSON extraction-file chunker.
//!
//! Reads pre-extracted segment files from the configured source
//! directories. The extraction file for PDF source `physics.pdf` is
//! `<pdf_dir>/physics.pdf.json` holding a JSON array of [`PdfSegment`];
//! the file for video `lecture01` is `<video_dir>/lecture01.json` holding
//! an array of [`VideoSegment`].

use super::{PdfSegment, SourceChunker, VideoSegment};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Chunker backed by JSON extraction files on disk.
pub struct JsonChunker {
    pdf_dir: PathBuf,
    video_dir: PathBuf,
}

impl JsonChunker {
    /// Create a chunker reading from the given source directories.
    pub fn new(pdf_dir: PathBuf, video_dir: PathBuf) -> Self {
        Self { pdf_dir, video_dir }
    }

    async fn read_segments<T: serde::de::DeserializeOwned>(
        path: &Path,
        source: &str,
    ) -> Result<Vec<T>> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            SvarError::SourceUnavailable(format!("{}: {}", source, e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| SvarError::SourceUnavailable(format!("{}: invalid extraction file: {}", source, e)))
    }

    fn list_json_sources(dir: &Path, strip_suffix: &str) -> Result<Vec<String>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut sources = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(stripped) = name.strip_suffix(strip_suffix) {
                sources.push(stripped.to_string());
            }
        }
        sources.sort();
        Ok(sources)
    }
}

#[async_trait]
impl SourceChunker for JsonChunker {
    #[instrument(skip(self))]
    async fn chunk_pdf(&self, pdf_filename: &str) -> Result<Vec<PdfSegment>> {
        let path = self.pdf_dir.join(format!("{}.json", pdf_filename));
        let segments: Vec<PdfSegment> = Self::read_segments(&path, pdf_filename).await?;
        debug!("Read {} segments from {}", segments.len(), pdf_filename);
        Ok(segments)
    }

    #[instrument(skip(self))]
    async fn chunk_video(&self, video_id: &str) -> Result<Vec<VideoSegment>> {
        let path = self.video_dir.join(format!("{}.json", video_id));
        let segments: Vec<VideoSegment> = Self::read_segments(&path, video_id).await?;
        debug!("Read {} segments from {}", segments.len(), video_id);
        Ok(segments)
    }

    fn list_pdf_sources(&self) -> Result<Vec<String>> {
        Self::list_json_sources(&self.pdf_dir, ".json")
    }

    fn list_video_sources(&self) -> Result<Vec<String>> {
        Self::list_json_sources(&self.video_dir, ".json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_pdf_segments() {
        let dir = tempfile::tempdir().unwrap();
        let pdf_dir = dir.path().join("pdfs");
        std::fs::create_dir_all(&pdf_dir).unwrap();
        std::fs::write(
            pdf_dir.join("physics.pdf.json"),
            r#"[{"text": "Newton's first law.", "page_number": 12, "paragraph_index": 3, "title": "Laws of Motion"}]"#,
        )
        .unwrap();

        let chunker = JsonChunker::new(pdf_dir, dir.path().join("videos"));
        let segments = chunker.chunk_pdf("physics.pdf").await.unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].page_number, 12);
        assert_eq!(segments[0].paragraph_index, 3);
        assert_eq!(segments[0].title, "Laws of Motion");
    }

    #[tokio::test]
    async fn test_missing_source_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let chunker = JsonChunker::new(dir.path().to_path_buf(), dir.path().to_path_buf());

        let err = chunker.chunk_pdf("missing.pdf").await.unwrap_err();
        assert!(matches!(err, SvarError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_corrupt_source_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vid1.json"), "not json at all").unwrap();

        let chunker = JsonChunker::new(dir.path().to_path_buf(), dir.path().to_path_buf());
        let err = chunker.chunk_video("vid1").await.unwrap_err();
        assert!(matches!(err, SvarError::SourceUnavailable(_)));
    }

    #[test]
    fn test_lists_sources_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf.json"), "[]").unwrap();
        std::fs::write(dir.path().join("a.pdf.json"), "[]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let chunker = JsonChunker::new(dir.path().to_path_buf(), dir.path().join("none"));
        let pdfs = chunker.list_pdf_sources().unwrap();
        assert_eq!(pdfs, vec!["a.pdf", "b.pdf"]);

        // Missing directory lists as empty rather than failing.
        assert!(chunker.list_video_sources().unwrap().is_empty());
    }
}
