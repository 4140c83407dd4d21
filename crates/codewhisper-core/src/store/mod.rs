//! Conversation storage abstraction.
//!
//! The [`ConversationStore`] trait is an append-only, session-scoped message
//! log. Each store value is a *handle* bound to one session id and owned by
//! exactly one [`SessionCoordinator`](crate::session::SessionCoordinator);
//! mutating operations take `&mut self` so the borrow checker enforces that
//! ownership.
//!
//! # Handle lifecycle
//!
//! | State | `initialize` | `add_message` | `history` | `close` |
//! |-------|--------------|---------------|-----------|---------|
//! | Uninitialized | → Open | [`StoreError::NotInitialized`] | [`StoreError::NotInitialized`] | no-op |
//! | Open | [`StoreError::AlreadyActive`] | append | ordered records | → Closed |
//! | Closed | → Open (same session id) | no-op | empty | no-op |
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Message, Role};

/// Errors raised by conversation stores.
///
/// Lifecycle violations are always fatal to the call that triggered them;
/// backend failures (I/O, SQL) are wrapped in [`StoreError::Backend`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// `add_message` or `history` was called before `initialize`.
    #[error("Conversation store for session {session_id} is not initialized")]
    NotInitialized { session_id: String },

    /// `initialize` was called on a handle that is already open.
    #[error("Conversation store for session {session_id} is already active; close it before initializing again")]
    AlreadyActive { session_id: String },

    /// The storage backend failed.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Lifecycle state of a store handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Uninitialized,
    Open,
    Closed,
}

/// Append-only, session-scoped message log.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The session id this handle reads and writes.
    fn session_id(&self) -> &str;

    /// Current lifecycle state of the handle.
    fn state(&self) -> HandleState;

    /// Open the handle, creating backing storage if absent.
    async fn initialize(&mut self) -> StoreResult<()>;

    /// Append a message stamped with a store-assigned timestamp.
    ///
    /// Silently ignored once the handle is closed.
    async fn add_message(&mut self, role: Role, content: &str) -> StoreResult<()>;

    /// All messages for this session, oldest first.
    ///
    /// Equal timestamps are returned in insertion order. Empty once closed.
    async fn history(&self) -> StoreResult<Vec<Message>>;

    /// Release the handle. Idempotent.
    async fn close(&mut self) -> StoreResult<()>;
}

/// Creates fresh, uninitialized store handles bound to a session id.
pub trait StoreFactory: Send + Sync {
    fn create(&self, session_id: &str) -> Box<dyn ConversationStore>;
}

/// Current time at millisecond precision, never earlier than `last`.
///
/// Stores keep the timestamp of their previous append and pass it here so
/// that timestamps stay non-decreasing even if the wall clock steps back.
pub fn monotonic_timestamp(last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    let now = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);
    match last {
        Some(prev) if prev > now => prev,
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_monotonic_timestamp_never_goes_back() {
        let future = Utc::now() + Duration::hours(1);
        assert_eq!(monotonic_timestamp(Some(future)), future);
    }

    #[test]
    fn test_monotonic_timestamp_is_millisecond_precision() {
        let ts = monotonic_timestamp(None);
        assert_eq!(ts.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn test_error_messages_name_the_session() {
        let err = StoreError::AlreadyActive {
            session_id: "abc".to_string(),
        };
        assert!(err.to_string().contains("abc"));
    }
}
