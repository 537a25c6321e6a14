//! In-memory backend — useful for testing and ephemeral runs.

use async_trait::async_trait;
use chrono::Utc;
use llmgate_core::error::KnowledgeError;
use llmgate_core::knowledge::{KnowledgeEntry, KnowledgeStore, NewKnowledge};
use tokio::sync::RwLock;

/// A knowledge store that keeps entries in a Vec.
/// Same ordering and id semantics as the SQLite store, no persistence.
pub struct InMemoryKnowledgeStore {
    inner: RwLock<Inner>,
}

struct Inner {
    entries: Vec<KnowledgeEntry>,
    next_id: i64,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: Vec::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryKnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, entry: NewKnowledge) -> Result<i64, KnowledgeError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push(KnowledgeEntry {
            id,
            category: entry.category,
            title: entry.title,
            content: entry.content,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list(&self, category: Option<&str>) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<KnowledgeEntry> = inner
            .entries
            .iter()
            .filter(|e| category.is_none_or(|c| e.category == c))
            .cloned()
            .collect();
        entries.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(entries)
    }

    async fn get(&self, id: i64) -> Result<KnowledgeEntry, KnowledgeError> {
        let inner = self.inner.read().await;
        inner
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(KnowledgeError::NotFound(id))
    }

    async fn delete(&self, id: i64) -> Result<(), KnowledgeError> {
        let mut inner = self.inner.write().await;
        let len_before = inner.entries.len();
        inner.entries.retain(|e| e.id != id);
        if inner.entries.len() == len_before {
            return Err(KnowledgeError::NotFound(id));
        }
        Ok(())
    }

    async fn categories(&self) -> Result<Vec<String>, KnowledgeError> {
        let inner = self.inner.read().await;
        let mut categories: Vec<String> =
            inner.entries.iter().map(|e| e.category.clone()).collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }
}
