//! SQLite knowledge backend.
//!
//! Uses a single table, `knowledge`, with an autoincrement id and a
//! secondary index on `category`. Rows are only ever inserted or deleted.
//! `created_at` is written as RFC 3339 UTC text with fixed microsecond
//! precision so that lexical order is chronological order. Rows written by
//! other tools with SQLite's `CURRENT_TIMESTAMP` format (`YYYY-MM-DD HH:MM:SS`,
//! UTC) are read as well.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use llmgate_core::error::KnowledgeError;
use llmgate_core::knowledge::{KnowledgeEntry, KnowledgeStore, NewKnowledge};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// A persistent knowledge store backed by SQLite.
pub struct SqliteKnowledgeStore {
    pool: SqlitePool,
}

impl SqliteKnowledgeStore {
    /// Create a store from a SQLite URL or file name.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database (useful for tests).
    pub async fn new(url: &str) -> Result<Self, KnowledgeError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| KnowledgeError::Storage(format!("Invalid SQLite path: {e}")))?;
        let store = Self::connect(options).await?;
        info!("SQLite knowledge store initialized at {url}");
        Ok(store)
    }

    /// Open (or create) the database file at `path`, creating parent directories.
    pub async fn open(path: &Path) -> Result<Self, KnowledgeError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                KnowledgeError::Storage(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let store = Self::connect(SqliteConnectOptions::new().filename(path)).await?;
        info!("SQLite knowledge store initialized at {}", path.display());
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, KnowledgeError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, KnowledgeError> {
        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| KnowledgeError::Storage(format!("Failed to open SQLite: {e}")))?;

        Self::from_pool(pool).await
    }

    /// Run schema migrations — creates the table and the category index.
    async fn run_migrations(&self) -> Result<(), KnowledgeError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS knowledge (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                category    TEXT NOT NULL,
                title       TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL
                            DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| KnowledgeError::Storage(format!("knowledge table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_knowledge_category ON knowledge(category)")
            .execute(&self.pool)
            .await
            .map_err(|e| KnowledgeError::Storage(format!("category index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `KnowledgeEntry` from a SQLite row.
    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<KnowledgeEntry, KnowledgeError> {
        let column =
            |name: &str, e: sqlx::Error| KnowledgeError::Storage(format!("{name} column: {e}"));

        let id: i64 = row.try_get("id").map_err(|e| column("id", e))?;
        let category: String = row.try_get("category").map_err(|e| column("category", e))?;
        let title: String = row.try_get("title").map_err(|e| column("title", e))?;
        let content: String = row.try_get("content").map_err(|e| column("content", e))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| column("created_at", e))?;

        let created_at = parse_timestamp(&created_at_str).map_err(|e| {
            KnowledgeError::Storage(format!("entry {id} has invalid created_at: {e}"))
        })?;

        Ok(KnowledgeEntry {
            id,
            category,
            title,
            content,
            created_at,
        })
    }
}

/// Parse RFC 3339, falling back to SQLite's `CURRENT_TIMESTAMP` layout in UTC.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(rfc_err) => NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(|_| rfc_err),
    }
}

#[async_trait]
impl KnowledgeStore for SqliteKnowledgeStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn save(&self, entry: NewKnowledge) -> Result<i64, KnowledgeError> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let result = sqlx::query(
            "INSERT INTO knowledge (category, title, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&entry.category)
        .bind(&entry.title)
        .bind(&entry.content)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| KnowledgeError::Storage(format!("INSERT failed: {e}")))?;

        let id = result.last_insert_rowid();
        debug!(id, category = %entry.category, "Saved knowledge entry");
        Ok(id)
    }

    async fn list(&self, category: Option<&str>) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        let rows = match category {
            Some(category) => {
                sqlx::query(
                    "SELECT id, category, title, content, created_at FROM knowledge \
                     WHERE category = ?1 ORDER BY created_at DESC, id DESC",
                )
                .bind(category)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, category, title, content, created_at FROM knowledge \
                     ORDER BY created_at DESC, id DESC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| KnowledgeError::Storage(format!("SELECT failed: {e}")))?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn get(&self, id: i64) -> Result<KnowledgeEntry, KnowledgeError> {
        let row = sqlx::query(
            "SELECT id, category, title, content, created_at FROM knowledge WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| KnowledgeError::Storage(format!("GET failed: {e}")))?;

        match row {
            Some(r) => Self::row_to_entry(&r),
            None => Err(KnowledgeError::NotFound(id)),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), KnowledgeError> {
        let result = sqlx::query("DELETE FROM knowledge WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| KnowledgeError::Storage(format!("DELETE failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(KnowledgeError::NotFound(id));
        }
        debug!(id, "Deleted knowledge entry");
        Ok(())
    }

    async fn categories(&self) -> Result<Vec<String>, KnowledgeError> {
        let rows = sqlx::query("SELECT DISTINCT category FROM knowledge ORDER BY category")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| KnowledgeError::Storage(format!("categories query failed: {e}")))?;

        rows.iter()
            .map(|r| {
                r.try_get::<String, _>("category")
                    .map_err(|e| KnowledgeError::Storage(format!("category column: {e}")))
            })
            .collect()
    }
}
