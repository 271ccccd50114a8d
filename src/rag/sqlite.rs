//! SQLite-backed index.
//!
//! The index directory holds a single `index.db`: chunk text plus embeddings
//! stored as little-endian f32 blobs. Search is brute-force cosine similarity.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::store::{ChunkSearchResult, RagStore, StoredChunk};
use crate::core::errors::ApiError;

/// File inside the index directory that marks the index as built.
pub const INDEX_FILE: &str = "index.db";

pub struct SqliteRagStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteRagStore {
    pub fn index_file(index_dir: &Path) -> PathBuf {
        index_dir.join(INDEX_FILE)
    }

    pub fn exists(index_dir: &Path) -> bool {
        Self::index_file(index_dir).is_file()
    }

    /// Creates a fresh index in `index_dir` (created if needed) and records
    /// the embedding model it is built with.
    pub async fn create(index_dir: &Path, embedding_model: &str) -> Result<Self, ApiError> {
        tokio::fs::create_dir_all(index_dir).await.map_err(|e| {
            ApiError::Internal(format!(
                "Cannot create index directory {}: {}",
                index_dir.display(),
                e
            ))
        })?;

        let db_path = Self::index_file(index_dir);
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool, db_path };
        store.init_schema().await?;
        store.set_meta("embedding_model", embedding_model).await?;
        store
            .set_meta("ingested_at", &Utc::now().to_rfc3339())
            .await?;
        Ok(store)
    }

    /// Opens an existing index for querying.
    pub async fn open_read_only(index_dir: &Path) -> Result<Self, ApiError> {
        let db_path = Self::index_file(index_dir);
        if !db_path.is_file() {
            return Err(ApiError::NotFound(format!(
                "Vector store not found at {}. Run the ingest command first.",
                index_dir.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        Ok(Self { pool, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Closes the pool so the file can be moved or removed.
    pub async fn close(self) {
        self.pool.close().await;
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rag_chunks (
                chunk_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                chunk_index INTEGER NOT NULL,
                start_offset INTEGER NOT NULL DEFAULT 0,
                embedding BLOB NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rag_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<(), ApiError> {
        sqlx::query("INSERT OR REPLACE INTO rag_meta (key, value) VALUES (?1, ?2)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(())
    }

    async fn meta(&self, key: &str) -> Result<Option<String>, ApiError> {
        sqlx::query_scalar("SELECT value FROM rag_meta WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)
    }

    /// RFC 3339 timestamp of the ingestion run that built this index.
    pub async fn ingested_at(&self) -> Result<Option<String>, ApiError> {
        self.meta("ingested_at").await
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_chunk(row: &SqliteRow) -> StoredChunk {
        let chunk_index: i64 = row.get("chunk_index");
        let start_offset: i64 = row.get("start_offset");

        StoredChunk {
            chunk_id: row.get("chunk_id"),
            content: row.get("content"),
            source: row.get("source"),
            chunk_index: chunk_index.max(0) as usize,
            start_offset: start_offset.max(0) as usize,
        }
    }
}

#[async_trait]
impl RagStore for SqliteRagStore {
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (chunk, embedding) in &items {
            let blob = Self::serialize_embedding(embedding);

            sqlx::query(
                "INSERT OR REPLACE INTO rag_chunks (chunk_id, content, source, chunk_index, start_offset, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&chunk.chunk_id)
            .bind(&chunk.content)
            .bind(&chunk.source)
            .bind(chunk.chunk_index as i64)
            .bind(chunk.start_offset as i64)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError> {
        let rows = sqlx::query(
            "SELECT chunk_id, content, source, chunk_index, start_offset, embedding
             FROM rag_chunks
             ORDER BY chunk_index",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut scored: Vec<ChunkSearchResult> = Vec::with_capacity(rows.len());
        for row in &rows {
            let embedding_bytes: Vec<u8> = row.get("embedding");
            let stored_emb = Self::deserialize_embedding(&embedding_bytes);
            if stored_emb.len() != query_embedding.len() {
                return Err(ApiError::Upstream(format!(
                    "Query embedding has {} dimensions but the index holds {}-dimensional vectors; \
                     check EMBEDDING_MODEL_NAME or re-run the ingest command",
                    query_embedding.len(),
                    stored_emb.len()
                )));
            }
            scored.push(ChunkSearchResult {
                chunk: Self::row_to_chunk(row),
                score: Self::cosine_similarity(query_embedding, &stored_emb),
            });
        }

        // stable: equal scores keep document order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rag_chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }

    async fn embedding_model(&self) -> Result<Option<String>, ApiError> {
        self.meta("embedding_model").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_chunk(index: usize, content: &str) -> StoredChunk {
        StoredChunk {
            chunk_id: format!("kb.txt#{}", index),
            content: content.to_string(),
            source: "kb.txt".to_string(),
            chunk_index: index,
            start_offset: index * 100,
        }
    }

    async fn seeded(dir: &Path) -> SqliteRagStore {
        let store = SqliteRagStore::create(dir, "mpnet").await.unwrap();
        store
            .insert_batch(vec![
                (make_chunk(0, "referral fee"), vec![1.0, 0.0, 0.0]),
                (make_chunk(1, "account closure"), vec![0.0, 1.0, 0.0]),
                (make_chunk(2, "brokerage slabs"), vec![0.7, 0.7, 0.0]),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_similarity() {
        let tmp = tempfile::tempdir().unwrap();
        let store = seeded(tmp.path()).await;

        let results = store.search(&[1.0, 0.1, 0.0], 10).await.unwrap();
        let ids: Vec<usize> = results.iter().map(|r| r.chunk.chunk_index).collect();
        assert_eq!(ids, vec![0, 2, 1]);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn search_truncates_to_limit_and_tolerates_large_limits() {
        let tmp = tempfile::tempdir().unwrap();
        let store = seeded(tmp.path()).await;

        assert_eq!(store.search(&[0.0, 1.0, 0.0], 1).await.unwrap().len(), 1);
        assert_eq!(store.search(&[0.0, 1.0, 0.0], 50).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn query_dimension_mismatch_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = seeded(tmp.path()).await;

        let err = store.search(&[1.0, 0.0], 4).await.unwrap_err();
        match err {
            ApiError::Upstream(msg) => {
                assert!(msg.contains("2 dimensions"));
                assert!(msg.contains("3-dimensional"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn read_only_reopen_sees_chunks_and_meta() {
        let tmp = tempfile::tempdir().unwrap();
        let store = seeded(tmp.path()).await;
        store.close().await;

        let reopened = SqliteRagStore::open_read_only(tmp.path()).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 3);
        assert_eq!(
            reopened.embedding_model().await.unwrap().as_deref(),
            Some("mpnet")
        );
        assert!(reopened.ingested_at().await.unwrap().is_some());

        let results = reopened.search(&[0.0, 1.0, 0.0], 1).await.unwrap();
        assert_eq!(results[0].chunk.content, "account closure");
        assert_eq!(results[0].chunk.start_offset, 100);
    }

    #[tokio::test]
    async fn opening_missing_index_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");

        let err = SqliteRagStore::open_read_only(&missing).await.err().unwrap();
        match err {
            ApiError::NotFound(msg) => assert!(msg.contains("Run the ingest command first")),
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(!missing.exists(), "opening must not create the index");
    }

    #[test]
    fn embedding_blob_roundtrip() {
        let vector = vec![0.25_f32, -1.5, 3.0];
        let bytes = SqliteRagStore::serialize_embedding(&vector);
        assert_eq!(bytes.len(), 12);
        assert_eq!(SqliteRagStore::deserialize_embedding(&bytes), vector);
    }

    #[test]
    fn cosine_similarity_handles_degenerate_vectors() {
        assert_eq!(SqliteRagStore::cosine_similarity(&[], &[]), 0.0);
        assert_eq!(SqliteRagStore::cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(SqliteRagStore::cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        let same = SqliteRagStore::cosine_similarity(&[3.0, 4.0], &[3.0, 4.0]);
        assert!((same - 1.0).abs() < 1e-6);
    }
}
