//! SQLite-backed [`ConversationStore`] implementation.
//!
//! All sessions share one `conversations` table; each handle reads and
//! writes only the rows carrying its own `session_id`. Timestamps are Unix
//! milliseconds, and the autoincrement `id` breaks ties between messages
//! written within the same millisecond.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use codewhisper_core::models::{Message, Role};
use codewhisper_core::store::{
    monotonic_timestamp, ConversationStore, HandleState, StoreError, StoreFactory, StoreResult,
};

use crate::db;
use crate::migrate::ensure_schema;

/// SQLite implementation of the [`ConversationStore`] trait.
///
/// The pool is opened by `initialize` and released by `close`, so a handle
/// only holds database connections while its session is open.
pub struct SqliteStore {
    db_path: PathBuf,
    session_id: String,
    pool: Option<SqlitePool>,
    state: HandleState,
    last_timestamp: Option<DateTime<Utc>>,
}

impl SqliteStore {
    pub fn new(db_path: &Path, session_id: &str) -> Self {
        Self {
            db_path: db_path.to_path_buf(),
            session_id: session_id.to_string(),
            pool: None,
            state: HandleState::Uninitialized,
            last_timestamp: None,
        }
    }

    fn not_initialized(&self) -> StoreError {
        StoreError::NotInitialized {
            session_id: self.session_id.clone(),
        }
    }

    fn open_pool(&self) -> StoreResult<&SqlitePool> {
        self.pool.as_ref().ok_or_else(|| self.not_initialized())
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn state(&self) -> HandleState {
        self.state
    }

    async fn initialize(&mut self) -> StoreResult<()> {
        if self.state == HandleState::Open {
            return Err(StoreError::AlreadyActive {
                session_id: self.session_id.clone(),
            });
        }

        let pool = db::connect(&self.db_path)
            .await
            .with_context(|| format!("Failed to open database: {}", self.db_path.display()))?;
        ensure_schema(&pool).await?;

        self.pool = Some(pool);
        self.state = HandleState::Open;
        Ok(())
    }

    async fn add_message(&mut self, role: Role, content: &str) -> StoreResult<()> {
        match self.state {
            HandleState::Uninitialized => return Err(self.not_initialized()),
            HandleState::Closed => return Ok(()),
            HandleState::Open => {}
        }

        let timestamp = monotonic_timestamp(self.last_timestamp);
        sqlx::query(
            "INSERT INTO conversations (session_id, role, content, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(&self.session_id)
        .bind(role.as_str())
        .bind(content)
        .bind(timestamp.timestamp_millis())
        .execute(self.open_pool()?)
        .await
        .map_err(anyhow::Error::from)?;

        self.last_timestamp = Some(timestamp);
        Ok(())
    }

    async fn history(&self) -> StoreResult<Vec<Message>> {
        match self.state {
            HandleState::Uninitialized => return Err(self.not_initialized()),
            HandleState::Closed => return Ok(Vec::new()),
            HandleState::Open => {}
        }

        let rows = sqlx::query(
            r#"
            SELECT role, content, timestamp
            FROM conversations
            WHERE session_id = ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(&self.session_id)
        .fetch_all(self.open_pool()?)
        .await
        .map_err(anyhow::Error::from)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let role: String = row.get("role");
            let millis: i64 = row.get("timestamp");
            let timestamp = DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| anyhow::anyhow!("Invalid message timestamp: {}", millis))?;
            messages.push(Message {
                role: role.parse()?,
                content: row.get("content"),
                timestamp,
            });
        }

        Ok(messages)
    }

    async fn close(&mut self) -> StoreResult<()> {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
        }
        if self.state == HandleState::Open {
            self.state = HandleState::Closed;
        }
        Ok(())
    }
}

/// Creates [`SqliteStore`] handles on one database file.
pub struct SqliteStoreFactory {
    db_path: PathBuf,
}

impl SqliteStoreFactory {
    pub fn new(db_path: &Path) -> Self {
        Self {
            db_path: db_path.to_path_buf(),
        }
    }
}

impl StoreFactory for SqliteStoreFactory {
    fn create(&self, session_id: &str) -> Box<dyn ConversationStore> {
        Box::new(SqliteStore::new(&self.db_path, session_id))
    }
}
