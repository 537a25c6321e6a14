//! Knowledge store trait — persisted facts injected into prompts.
//!
//! Entries are append-only: they are saved, listed, fetched and deleted,
//! but never edited. There is deliberately no update operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::KnowledgeError;

/// A single stored knowledge entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Store-assigned, monotonically increasing id
    pub id: i64,

    /// Category label (non-empty, shared by many entries)
    pub category: String,

    pub title: String,

    pub content: String,

    /// When the entry was saved
    pub created_at: DateTime<Utc>,
}

/// The fields a caller provides when saving an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewKnowledge {
    pub category: String,
    pub title: String,
    pub content: String,
}

impl NewKnowledge {
    pub fn new(
        category: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}

/// The core KnowledgeStore trait.
///
/// Implementations: SQLite (persistent), in-memory (tests and ephemeral runs).
/// Every operation is a single read or a single write, so callers never
/// need to hold a lock across calls.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "memory").
    fn name(&self) -> &str;

    /// Append an entry and return its assigned id.
    async fn save(&self, entry: NewKnowledge) -> std::result::Result<i64, KnowledgeError>;

    /// All entries (or those of one category), newest first.
    async fn list(
        &self,
        category: Option<&str>,
    ) -> std::result::Result<Vec<KnowledgeEntry>, KnowledgeError>;

    /// Fetch one entry by id.
    async fn get(&self, id: i64) -> std::result::Result<KnowledgeEntry, KnowledgeError>;

    /// Permanently remove one entry by id.
    async fn delete(&self, id: i64) -> std::result::Result<(), KnowledgeError>;

    /// Distinct categories in lexicographic order.
    async fn categories(&self) -> std::result::Result<Vec<String>, KnowledgeError>;
}
