//! Storage and caching for Jarvis.
//!
//! - Vector stores: [`InMemoryStore`], [`SqliteStore`]
//! - Caches: [`EmbeddingCache`] (LRU), [`ResponseCache`] (insertion-order)
//! - [`SessionStore`] for per-conversation turns and document ids

pub mod embedding_cache;
pub mod in_memory;
pub mod response_cache;
pub mod sessions;
pub mod sqlite;
pub mod vector;

use std::sync::Arc;

use jarvis_config::StoreConfig;
use jarvis_core::error::StoreError;
use jarvis_core::store::VectorStore;

pub use embedding_cache::EmbeddingCache;
pub use in_memory::InMemoryStore;
pub use response_cache::{CacheKey, ResponseCache};
pub use sessions::SessionStore;
pub use sqlite::SqliteStore;
pub use vector::cosine_similarity;

/// Open the vector store selected by `store.backend`.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn VectorStore>, StoreError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        "sqlite" => {
            let path = config.path.to_string_lossy();
            Ok(Arc::new(SqliteStore::new(&path).await?))
        }
        other => Err(StoreError::Storage(format!("unknown store backend '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_configured_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StoreConfig {
            backend: "memory".into(),
            path: dir.path().join("kb.db"),
        };
        assert_eq!(open_store(&config).await.unwrap().name(), "memory");

        config.backend = "sqlite".into();
        assert_eq!(open_store(&config).await.unwrap().name(), "sqlite");
        assert!(config.path.exists());

        config.backend = "chroma".into();
        assert!(open_store(&config).await.is_err());
    }
}
