//! SQLite-based chunk store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! For production use cases with large datasets, consider using sqlite-vec
//! extension or a dedicated vector database.
//!
//! Chunks and the manifest live in the same database so a source can be
//! committed in a single transaction.

use super::{
    cosine_similarity, rank_results, Chunk, ChunkStore, IndexedSources, Locator, Modality,
    SearchResult, SourceRef,
};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    document_id TEXT NOT NULL,
    modality TEXT NOT NULL,
    source_key TEXT NOT NULL,
    text TEXT NOT NULL,
    embedding BLOB NOT NULL,
    page_number INTEGER,
    paragraph_index INTEGER,
    title TEXT,
    start_timestamp REAL,
    end_timestamp REAL,
    start_token_id INTEGER,
    end_token_id INTEGER,
    indexed_at TEXT NOT NULL,
    PRIMARY KEY (modality, document_id)
);

CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(modality, source_key);

CREATE TABLE IF NOT EXISTS manifest (
    modality TEXT NOT NULL,
    source_key TEXT NOT NULL,
    chunk_count INTEGER NOT NULL,
    indexed_at TEXT NOT NULL,
    PRIMARY KEY (modality, source_key)
);
"#;

/// SQLite-based chunk store.
pub struct SqliteChunkStore {
    conn: Mutex<Connection>,
}

impl SqliteChunkStore {
    /// Create a new SQLite chunk store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite chunk store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite chunk store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SvarError::ChunkStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    /// Reconstruct a chunk from a full row of the chunks table.
    fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<Chunk> {
        let document_id: String = row.get(0)?;
        let modality: String = row.get(1)?;
        let source_key: String = row.get(2)?;
        let text: String = row.get(3)?;
        let embedding_bytes: Vec<u8> = row.get(4)?;
        let indexed_at_str: String = row.get(12)?;

        let locator = if modality == Modality::Pdf.as_str() {
            Locator::Pdf {
                pdf_filename: source_key,
                page_number: row.get(5)?,
                paragraph_index: row.get(6)?,
                title: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            }
        } else {
            Locator::Video {
                video_id: source_key,
                start_timestamp: row.get(8)?,
                end_timestamp: row.get(9)?,
                start_token_id: row.get(10)?,
                end_token_id: row.get(11)?,
            }
        };

        Ok(Chunk {
            document_id,
            text,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            locator,
            indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

const SELECT_CHUNK_COLUMNS: &str = r#"
SELECT document_id, modality, source_key, text, embedding,
       page_number, paragraph_index, title,
       start_timestamp, end_timestamp, start_token_id, end_token_id,
       indexed_at
FROM chunks
"#;

#[async_trait]
impl ChunkStore for SqliteChunkStore {
    #[instrument(skip(self, chunks), fields(source = %source, count = chunks.len()))]
    async fn commit_source(&self, source: &SourceRef, chunks: &[Chunk]) -> Result<usize> {
        let conn = self.lock_conn()?;
        let tx = conn.unchecked_transaction()?;

        let modality = source.modality().as_str();

        // A rebuild must never merge with stale chunks for the same source.
        tx.execute(
            "DELETE FROM chunks WHERE modality = ?1 AND source_key = ?2",
            params![modality, source.key()],
        )?;
        tx.execute(
            "DELETE FROM manifest WHERE modality = ?1 AND source_key = ?2",
            params![modality, source.key()],
        )?;

        for chunk in chunks {
            let embedding_bytes = Self::embedding_to_bytes(&chunk.embedding);

            match &chunk.locator {
                Locator::Pdf {
                    page_number,
                    paragraph_index,
                    title,
                    ..
                } => {
                    tx.execute(
                        r#"
                        INSERT INTO chunks
                        (document_id, modality, source_key, text, embedding,
                         page_number, paragraph_index, title, indexed_at)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                        "#,
                        params![
                            chunk.document_id,
                            modality,
                            source.key(),
                            chunk.text,
                            embedding_bytes,
                            page_number,
                            paragraph_index,
                            title,
                            chunk.indexed_at.to_rfc3339(),
                        ],
                    )?;
                }
                Locator::Video {
                    start_timestamp,
                    end_timestamp,
                    start_token_id,
                    end_token_id,
                    ..
                } => {
                    tx.execute(
                        r#"
                        INSERT INTO chunks
                        (document_id, modality, source_key, text, embedding,
                         start_timestamp, end_timestamp, start_token_id, end_token_id,
                         indexed_at)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                        "#,
                        params![
                            chunk.document_id,
                            modality,
                            source.key(),
                            chunk.text,
                            embedding_bytes,
                            start_timestamp,
                            end_timestamp,
                            start_token_id,
                            end_token_id,
                            chunk.indexed_at.to_rfc3339(),
                        ],
                    )?;
                }
            }
        }

        tx.execute(
            "INSERT INTO manifest (modality, source_key, chunk_count, indexed_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                modality,
                source.key(),
                chunks.len() as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        info!("Committed {} chunks for source {}", chunks.len(), source);
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(
        &self,
        query_embedding: &[f32],
        modality: Modality,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE modality = ?1",
            params![modality.as_str()],
            |row| row.get(0),
        )?;
        if count == 0 {
            return Err(SvarError::EmptyIndex(modality.as_str().to_string()));
        }

        let sql = format!("{} WHERE modality = ?1", SELECT_CHUNK_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let chunks = stmt.query_map(params![modality.as_str()], Self::row_to_chunk)?;

        let mut results: Vec<SearchResult> = chunks
            .filter_map(|c| c.ok())
            .map(|chunk| {
                let score = cosine_similarity(query_embedding, &chunk.embedding);
                SearchResult { chunk, score }
            })
            .collect();

        rank_results(&mut results);
        results.truncate(limit);

        debug!("Found {} {} matches", results.len(), modality);
        Ok(results)
    }

    #[instrument(skip(self), fields(source = %source))]
    async fn delete_source(&self, source: &SourceRef) -> Result<usize> {
        let conn = self.lock_conn()?;
        let tx = conn.unchecked_transaction()?;

        let deleted = tx.execute(
            "DELETE FROM chunks WHERE modality = ?1 AND source_key = ?2",
            params![source.modality().as_str(), source.key()],
        )?;
        tx.execute(
            "DELETE FROM manifest WHERE modality = ?1 AND source_key = ?2",
            params![source.modality().as_str(), source.key()],
        )?;

        tx.commit()?;
        info!("Deleted {} chunks for source {}", deleted, source);
        Ok(deleted)
    }

    async fn list_indexed(&self) -> Result<IndexedSources> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare("SELECT modality, source_key FROM manifest")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut indexed = IndexedSources::default();
        for row in rows {
            let (modality, source_key) = row?;
            if modality == Modality::Pdf.as_str() {
                indexed.pdfs.insert(source_key);
            } else {
                indexed.videos.insert(source_key);
            }
        }

        Ok(indexed)
    }

    async fn is_indexed(&self, source: &SourceRef) -> Result<bool> {
        let conn = self.lock_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM manifest WHERE modality = ?1 AND source_key = ?2",
            params![source.modality().as_str(), source.key()],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute("DELETE FROM chunks", [])?;
        tx.execute("DELETE FROM manifest", [])?;

        tx.commit()?;
        info!("Cleared chunk store and manifest");
        Ok(())
    }

    async fn chunk_count(&self, modality: Modality) -> Result<usize> {
        let conn = self.lock_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE modality = ?1",
            params![modality.as_str()],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    async fn sample_texts(&self, modality: Modality, limit: usize) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            "SELECT text FROM chunks WHERE modality = ?1 ORDER BY document_id LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![modality.as_str(), limit as i64], |row| {
            row.get::<_, String>(0)
        })?;

        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_chunk(file: &str, page: u32, para: u32, embedding: Vec<f32>) -> Chunk {
        Chunk::new(
            format!("{} p{} para{}", file, page, para),
            embedding,
            Locator::Pdf {
                pdf_filename: file.to_string(),
                page_number: page,
                paragraph_index: para,
                title: "Physics".to_string(),
            },
        )
    }

    fn video_chunk(id: &str, start_token: i64, embedding: Vec<f32>) -> Chunk {
        Chunk::new(
            format!("{} tokens from {}", id, start_token),
            embedding,
            Locator::Video {
                video_id: id.to_string(),
                start_timestamp: start_token as f64,
                end_timestamp: start_token as f64 + 10.0,
                start_token_id: start_token,
                end_token_id: start_token + 20,
            },
        )
    }

    #[tokio::test]
    async fn test_commit_and_search() {
        let store = SqliteChunkStore::in_memory().unwrap();

        let source = SourceRef::Pdf("physics.pdf".to_string());
        let chunks = vec![
            pdf_chunk("physics.pdf", 1, 0, vec![1.0, 0.0, 0.0]),
            pdf_chunk("physics.pdf", 2, 1, vec![0.0, 1.0, 0.0]),
        ];

        store.commit_source(&source, &chunks).await.unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], Modality::Pdf, 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.document_id, "pdf:physics.pdf:1:0");
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_search_empty_partition_fails() {
        let store = SqliteChunkStore::in_memory().unwrap();

        // Index only a video; the pdf partition stays empty.
        let source = SourceRef::Video("vid1".to_string());
        let chunks = vec![video_chunk("vid1", 0, vec![1.0, 0.0])];
        store.commit_source(&source, &chunks).await.unwrap();

        let err = store.search(&[1.0, 0.0], Modality::Pdf, 10).await.unwrap_err();
        assert!(matches!(err, SvarError::EmptyIndex(m) if m == "pdf"));

        let results = store.search(&[1.0, 0.0], Modality::Video, 10).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_recommit_replaces_old_chunks() {
        let store = SqliteChunkStore::in_memory().unwrap();
        let source = SourceRef::Pdf("book.pdf".to_string());

        let old = vec![
            pdf_chunk("book.pdf", 1, 0, vec![1.0, 0.0]),
            pdf_chunk("book.pdf", 1, 1, vec![1.0, 0.0]),
            pdf_chunk("book.pdf", 2, 0, vec![1.0, 0.0]),
        ];
        store.commit_source(&source, &old).await.unwrap();
        assert_eq!(store.chunk_count(Modality::Pdf).await.unwrap(), 3);

        let new = vec![pdf_chunk("book.pdf", 1, 0, vec![0.0, 1.0])];
        store.commit_source(&source, &new).await.unwrap();

        // No stale citations survive a recommit.
        assert_eq!(store.chunk_count(Modality::Pdf).await.unwrap(), 1);
        let indexed = store.list_indexed().await.unwrap();
        assert_eq!(indexed.pdfs.len(), 1);
    }

    #[tokio::test]
    async fn test_manifest_roundtrip() {
        let store = SqliteChunkStore::in_memory().unwrap();

        let pdf = SourceRef::Pdf("a.pdf".to_string());
        let video = SourceRef::Video("vid1".to_string());

        store
            .commit_source(&pdf, &[pdf_chunk("a.pdf", 1, 0, vec![1.0])])
            .await
            .unwrap();
        store
            .commit_source(&video, &[video_chunk("vid1", 0, vec![1.0])])
            .await
            .unwrap();

        assert!(store.is_indexed(&pdf).await.unwrap());
        assert!(!store.is_indexed(&SourceRef::Pdf("b.pdf".to_string())).await.unwrap());

        let indexed = store.list_indexed().await.unwrap();
        assert!(indexed.pdfs.contains("a.pdf"));
        assert!(indexed.videos.contains("vid1"));

        store.delete_source(&pdf).await.unwrap();
        let indexed = store.list_indexed().await.unwrap();
        assert!(indexed.pdfs.is_empty());
        assert!(indexed.videos.contains("vid1"));
    }

    #[tokio::test]
    async fn test_clear() {
        let store = SqliteChunkStore::in_memory().unwrap();
        let source = SourceRef::Pdf("a.pdf".to_string());
        store
            .commit_source(&source, &[pdf_chunk("a.pdf", 1, 0, vec![1.0])])
            .await
            .unwrap();

        store.clear().await.unwrap();

        assert!(store.list_indexed().await.unwrap().is_empty());
        assert_eq!(store.chunk_count(Modality::Pdf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_video_locator_roundtrip() {
        let store = SqliteChunkStore::in_memory().unwrap();
        let source = SourceRef::Video("lecture01".to_string());
        let chunks = vec![video_chunk("lecture01", 120, vec![0.5, 0.5])];

        store.commit_source(&source, &chunks).await.unwrap();
        let results = store.search(&[0.5, 0.5], Modality::Video, 1).await.unwrap();

        match &results[0].chunk.locator {
            Locator::Video {
                video_id,
                start_timestamp,
                end_timestamp,
                start_token_id,
                end_token_id,
            } => {
                assert_eq!(video_id, "lecture01");
                assert!((start_timestamp - 120.0).abs() < f64::EPSILON);
                assert!((end_timestamp - 130.0).abs() < f64::EPSILON);
                assert_eq!(*start_token_id, 120);
                assert_eq!(*end_token_id, 140);
            }
            Locator::Pdf { .. } => panic!("expected video locator"),
        }
    }
}
