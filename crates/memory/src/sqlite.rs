//! SQLite vector store.
//!
//! A single `chunks` table holds text, metadata, and the embedding as a
//! little-endian f32 BLOB. Search loads the candidate rows (optionally
//! filtered by document in SQL) and ranks them by cosine similarity in Rust.

use crate::vector::{self, EmbeddedChunk};
use async_trait::async_trait;
use chrono::Utc;
use jarvis_core::error::StoreError;
use jarvis_core::store::{
    ChunkMetadata, SearchHit, StoredChunk, VectorStore, active_filter, ensure_aligned,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// A persistent vector store on SQLite.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a store at `path`.
    ///
    /// Accepts a file path or a SQLite URL. `sqlite::memory:` gives an
    /// ephemeral database bound to a single connection.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let in_memory = path.contains(":memory:");
        let options = if path.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(path)
                .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
        } else {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Storage(format!("Cannot create {}: {e}", parent.display()))
                })?;
            }
            SqliteConnectOptions::new().filename(path)
        };

        let mut options = options
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Each in-memory connection is its own database.
        let max_connections = if in_memory { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite vector store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                iid          INTEGER PRIMARY KEY AUTOINCREMENT,
                id           TEXT UNIQUE NOT NULL,
                doc_id       TEXT NOT NULL,
                filename     TEXT,
                chunk_index  INTEGER NOT NULL,
                content      TEXT NOT NULL,
                created_at   TEXT NOT NULL,
                embedding    BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("chunks table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_doc_id ON chunks(doc_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("doc_id index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_metadata(row: &sqlx::sqlite::SqliteRow) -> Result<ChunkMetadata, StoreError> {
        let doc_id: String = row
            .try_get("doc_id")
            .map_err(|e| StoreError::QueryFailed(format!("doc_id column: {e}")))?;
        let filename: Option<String> = row
            .try_get("filename")
            .map_err(|e| StoreError::QueryFailed(format!("filename column: {e}")))?;
        let chunk_index: i64 = row
            .try_get("chunk_index")
            .map_err(|e| StoreError::QueryFailed(format!("chunk_index column: {e}")))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;

        let timestamp = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(ChunkMetadata {
            doc_id,
            filename,
            chunk_index: usize::try_from(chunk_index).unwrap_or_default(),
            timestamp,
        })
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> Result<EmbeddedChunk, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let text: String = row
            .try_get("content")
            .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
        let blob: Vec<u8> = row
            .try_get("embedding")
            .map_err(|e| StoreError::QueryFailed(format!("embedding column: {e}")))?;

        Ok(EmbeddedChunk {
            id,
            text,
            embedding: vector::blob_to_embedding(&blob),
            metadata: Self::row_to_metadata(row)?,
        })
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(
        &self,
        chunks: &[String],
        embeddings: &[Vec<f32>],
        metadata: &[ChunkMetadata],
    ) -> Result<Vec<String>, StoreError> {
        ensure_aligned(chunks, embeddings, metadata)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("BEGIN failed: {e}")))?;

        let mut ids = Vec::with_capacity(chunks.len());
        for ((text, embedding), meta) in chunks.iter().zip(embeddings).zip(metadata) {
            let id = meta.chunk_id();
            sqlx::query(
                r#"
                INSERT INTO chunks (id, doc_id, filename, chunk_index, content, created_at, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&id)
            .bind(&meta.doc_id)
            .bind(&meta.filename)
            .bind(meta.chunk_index as i64)
            .bind(text)
            .bind(meta.timestamp.to_rfc3339())
            .bind(vector::embedding_to_blob(embedding))
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("INSERT failed: {e}")))?;
            ids.push(id);
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("COMMIT failed: {e}")))?;

        debug!(count = ids.len(), "Stored chunks");
        Ok(ids)
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        doc_ids: Option<&[String]>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let filter = active_filter(doc_ids);

        let rows = match filter {
            Some(ids) => {
                let placeholders = (1..=ids.len())
                    .map(|i| format!("?{i}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "SELECT * FROM chunks WHERE doc_id IN ({placeholders}) ORDER BY iid"
                );
                let mut query = sqlx::query(&sql);
                for id in ids {
                    query = query.bind(id);
                }
                query.fetch_all(&self.pool).await
            }
            None => {
                sqlx::query("SELECT * FROM chunks ORDER BY iid")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| StoreError::QueryFailed(format!("Vector scan: {e}")))?;

        let chunks = rows
            .iter()
            .map(Self::row_to_chunk)
            .collect::<Result<Vec<_>, _>>()?;

        // SQL already applied the filter.
        Ok(vector::rank(&chunks, query_embedding, top_k, None))
    }

    async fn peek(&self, limit: usize) -> Result<Vec<StoredChunk>, StoreError> {
        let rows = sqlx::query("SELECT * FROM chunks ORDER BY iid LIMIT ?1")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Peek: {e}")))?;

        rows.iter()
            .map(|row| {
                let chunk = Self::row_to_chunk(row)?;
                Ok(StoredChunk {
                    id: chunk.id,
                    text: chunk.text,
                    metadata: chunk.metadata,
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Count: {e}")))?;
        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| StoreError::QueryFailed(format!("Count column: {e}")))?;
        Ok(count as usize)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM chunks")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("Clear: {e}")))?;
        info!("Vector store cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    fn meta(doc_id: &str, index: usize, filename: Option<&str>) -> ChunkMetadata {
        ChunkMetadata {
            doc_id: doc_id.into(),
            filename: filename.map(String::from),
            chunk_index: index,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_count() {
        let store = test_store().await;
        let ids = store
            .insert(
                &["Alpha content.".into(), "Beta content.".into()],
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
                &[meta("doc_a", 0, Some("a.txt")), meta("doc_a", 1, Some("a.txt"))],
            )
            .await
            .unwrap();
        assert_eq!(ids, vec!["doc_a_chunk_0", "doc_a_chunk_1"]);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn mismatched_lengths_rejected() {
        let store = test_store().await;
        let err = store
            .insert(&["x".into()], &[], &[meta("d", 0, None)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::LengthMismatch { .. }));
    }

    #[tokio::test]
    async fn search_roundtrips_embeddings_and_metadata() {
        let store = test_store().await;
        store
            .insert(
                &["Alpha content.".into(), "Beta content.".into()],
                &[vec![1.0, 0.0], vec![0.0, 1.0]],
                &[meta("doc_a", 0, Some("a.txt")), meta("doc_a", 1, None)],
            )
            .await
            .unwrap();

        let hits = store.search(&[0.9, 0.1], 1, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "Alpha content.");
        assert_eq!(hits[0].metadata.source_name(), "a.txt");

        let hits = store.search(&[0.0, 1.0], 1, None).await.unwrap();
        assert_eq!(hits[0].metadata.source_name(), "Unknown");
        assert_eq!(hits[0].metadata.chunk_index, 1);
    }

    #[tokio::test]
    async fn search_filters_by_document() {
        let store = test_store().await;
        store
            .insert(
                &["first".into(), "second".into(), "third".into()],
                &[vec![1.0, 0.0], vec![0.9, 0.1], vec![0.0, 1.0]],
                &[
                    meta("doc_a", 0, Some("a.txt")),
                    meta("doc_b", 0, Some("b.txt")),
                    meta("doc_c", 0, Some("c.txt")),
                ],
            )
            .await
            .unwrap();

        let filter = vec!["doc_b".to_string(), "doc_c".to_string()];
        let hits = store
            .search(&[1.0, 0.0], 5, Some(filter.as_slice()))
            .await
            .unwrap();
        let docs: Vec<_> = hits.iter().map(|h| h.metadata.doc_id.as_str()).collect();
        assert_eq!(docs, vec!["doc_b", "doc_c"]);

        let missing = vec!["doc_z".to_string()];
        assert!(store
            .search(&[1.0, 0.0], 5, Some(missing.as_slice()))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn duplicate_chunk_id_is_rejected() {
        let store = test_store().await;
        store
            .insert(&["x".into()], &[vec![1.0]], &[meta("d", 0, None)])
            .await
            .unwrap();
        let err = store
            .insert(&["y".into()], &[vec![1.0]], &[meta("d", 0, None)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn peek_and_clear() {
        let store = test_store().await;
        store
            .insert(
                &["one".into(), "two".into()],
                &[vec![1.0], vec![1.0]],
                &[meta("d", 0, None), meta("d", 1, None)],
            )
            .await
            .unwrap();
        let sample = store.peek(1).await.unwrap();
        assert_eq!(sample.len(), 1);
        assert_eq!(sample[0].text, "one");

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteStore::new(path).await.unwrap();
            store
                .insert(&["kept".into()], &[vec![0.5, 0.5]], &[meta("d", 0, Some("k.txt"))])
                .await
                .unwrap();
        }

        let reopened = SqliteStore::new(path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        let hits = reopened.search(&[0.5, 0.5], 1, None).await.unwrap();
        assert_eq!(hits[0].text, "kept");
    }
}
