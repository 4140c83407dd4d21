//! In-memory [`ConversationStore`] implementation for testing.
//!
//! Stores created by the same [`InMemoryStoreFactory`] share one record
//! table behind `std::sync::RwLock`, the way several SQLite handles share
//! one database file, so session isolation is observable in tests.

use std::sync::{Arc, RwLock};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Message, Role};

use super::{
    monotonic_timestamp, ConversationStore, HandleState, StoreError, StoreFactory, StoreResult,
};

struct Record {
    session_id: String,
    message: Message,
}

type Table = Arc<RwLock<Vec<Record>>>;

/// In-memory conversation store.
pub struct InMemoryStore {
    session_id: String,
    table: Table,
    state: HandleState,
    last_timestamp: Option<DateTime<Utc>>,
}

impl InMemoryStore {
    /// A store with its own private table.
    pub fn new(session_id: &str) -> Self {
        Self::with_table(session_id, Table::default())
    }

    fn with_table(session_id: &str, table: Table) -> Self {
        Self {
            session_id: session_id.to_string(),
            table,
            state: HandleState::Uninitialized,
            last_timestamp: None,
        }
    }

    fn not_initialized(&self) -> StoreError {
        StoreError::NotInitialized {
            session_id: self.session_id.clone(),
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend(anyhow!("in-memory conversation table lock poisoned"))
}

#[async_trait]
impl ConversationStore for InMemoryStore {
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
        self.table.write().map_err(|_| poisoned())?.push(Record {
            session_id: self.session_id.clone(),
            message: Message {
                role,
                content: content.to_string(),
                timestamp,
            },
        });
        self.last_timestamp = Some(timestamp);
        Ok(())
    }

    async fn history(&self) -> StoreResult<Vec<Message>> {
        match self.state {
            HandleState::Uninitialized => return Err(self.not_initialized()),
            HandleState::Closed => return Ok(Vec::new()),
            HandleState::Open => {}
        }

        let table = self.table.read().map_err(|_| poisoned())?;
        let mut messages: Vec<Message> = table
            .iter()
            .filter(|r| r.session_id == self.session_id)
            .map(|r| r.message.clone())
            .collect();
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    async fn close(&mut self) -> StoreResult<()> {
        if self.state == HandleState::Open {
            self.state = HandleState::Closed;
        }
        Ok(())
    }
}

/// Hands out [`InMemoryStore`]s that share a single table.
#[derive(Default, Clone)]
pub struct InMemoryStoreFactory {
    table: Table,
}

impl InMemoryStoreFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreFactory for InMemoryStoreFactory {
    fn create(&self, session_id: &str) -> Box<dyn ConversationStore> {
        Box::new(InMemoryStore::with_table(session_id, self.table.clone()))
    }
}
