//! Knowledge store implementations for llmgate.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::sync::Arc;

use llmgate_config::KnowledgeConfig;
use llmgate_core::error::KnowledgeError;
use llmgate_core::knowledge::KnowledgeStore;

pub use in_memory::InMemoryKnowledgeStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteKnowledgeStore;

/// Build the store selected by configuration.
pub async fn open_store(
    config: &KnowledgeConfig,
) -> Result<Arc<dyn KnowledgeStore>, KnowledgeError> {
    match config.backend.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory knowledge store — entries are lost on exit");
            Ok(Arc::new(InMemoryKnowledgeStore::new()))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(SqliteKnowledgeStore::open(&config.path).await?)),
        other => Err(KnowledgeError::Storage(format!(
            "Knowledge backend '{other}' is not available in this build"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmgate_core::knowledge::NewKnowledge;

    #[tokio::test]
    async fn open_memory_store() {
        let config = KnowledgeConfig {
            backend: "memory".into(),
            ..KnowledgeConfig::default()
        };
        let store = open_store(&config).await.unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn open_sqlite_store_at_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = KnowledgeConfig {
            backend: "sqlite".into(),
            path: dir.path().join("kb.db"),
        };
        let store = open_store(&config).await.unwrap();
        assert_eq!(store.name(), "sqlite");
        store.save(NewKnowledge::new("a", "b", "c")).await.unwrap();
        assert_eq!(store.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_backend_is_storage_error() {
        let config = KnowledgeConfig {
            backend: "redis".into(),
            ..KnowledgeConfig::default()
        };
        assert!(matches!(
            open_store(&config).await,
            Err(KnowledgeError::Storage(_))
        ));
    }
}
