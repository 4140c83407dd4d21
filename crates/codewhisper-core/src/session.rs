//! Session lifecycle on top of a [`ConversationStore`].
//!
//! ```text
//!  Uninitialized ──initialize()──▶ Active ──close()──▶ Closed
//!                                    ▲                   │
//!                                    └───initialize()────┘
//!                                      (new store, new id)
//! ```
//!
//! Every `initialize()` from a non-active state allocates a fresh session id
//! and a fresh store handle, then seeds it with the system priming message.
//! History never carries over from a closed session. While Closed, appends
//! are ignored and history reads are empty.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{ChatMessage, Message, Role};
use crate::store::{ConversationStore, StoreError, StoreFactory, StoreResult};

/// Priming message seeded into every new session.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a programming assistant that helps with coding questions and maintains conversation context.";

/// Lifecycle state of a [`SessionCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Active,
    Closed,
}

/// Owns the store for the current session and enforces its lifecycle.
pub struct SessionCoordinator {
    factory: Arc<dyn StoreFactory>,
    system_prompt: String,
    store: Option<Box<dyn ConversationStore>>,
    state: SessionState,
}

impl SessionCoordinator {
    pub fn new(factory: Arc<dyn StoreFactory>) -> Self {
        Self::with_system_prompt(factory, DEFAULT_SYSTEM_PROMPT)
    }

    pub fn with_system_prompt(factory: Arc<dyn StoreFactory>, system_prompt: &str) -> Self {
        Self {
            factory,
            system_prompt: system_prompt.to_string(),
            store: None,
            state: SessionState::Uninitialized,
        }
    }

    /// Start a new session and seed the system priming message.
    ///
    /// Fails with [`StoreError::AlreadyActive`] if a session is already
    /// active.
    pub async fn initialize(&mut self) -> StoreResult<()> {
        if self.state == SessionState::Active {
            return Err(StoreError::AlreadyActive {
                session_id: self.session_id().unwrap_or_default().to_string(),
            });
        }

        let session_id = Uuid::new_v4().to_string();
        let mut store = self.factory.create(&session_id);
        let seeded = match store.initialize().await {
            Ok(()) => store.add_message(Role::System, &self.system_prompt).await,
            Err(e) => Err(e),
        };
        // The new id is reported even if the store failed to open.
        self.store = Some(store);
        seeded?;

        self.state = SessionState::Active;
        info!(session_id = %session_id, "session started");
        Ok(())
    }

    pub async fn add_system_message(&mut self, content: &str) -> StoreResult<()> {
        self.append(Role::System, content).await
    }

    pub async fn add_user_message(&mut self, content: &str) -> StoreResult<()> {
        self.append(Role::User, content).await
    }

    pub async fn add_assistant_message(&mut self, content: &str) -> StoreResult<()> {
        self.append(Role::Assistant, content).await
    }

    async fn append(&mut self, role: Role, content: &str) -> StoreResult<()> {
        match self.state {
            SessionState::Closed => {
                debug!(role = %role, "session closed, message dropped");
                Ok(())
            }
            _ => self.active_store_mut()?.add_message(role, content).await,
        }
    }

    /// Full ordered history of the current session.
    pub async fn history(&self) -> StoreResult<Vec<Message>> {
        match self.state {
            SessionState::Closed => Ok(Vec::new()),
            _ => self.active_store()?.history().await,
        }
    }

    /// History in the `{role, content}` shape expected by the model call.
    pub async fn chat_history(&self) -> StoreResult<Vec<ChatMessage>> {
        Ok(self
            .history()
            .await?
            .into_iter()
            .map(ChatMessage::from)
            .collect())
    }

    /// Close the current session. Idempotent.
    pub async fn close(&mut self) -> StoreResult<()> {
        if self.state != SessionState::Active {
            return Ok(());
        }
        if let Some(store) = self.store.as_mut() {
            store.close().await?;
        }
        self.state = SessionState::Closed;
        info!(session_id = %self.session_id().unwrap_or_default(), "session closed");
        Ok(())
    }

    /// Id of the most recently created session, `None` before the first
    /// `initialize()`.
    pub fn session_id(&self) -> Option<&str> {
        self.store.as_ref().map(|s| s.session_id())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    fn not_initialized(&self) -> StoreError {
        StoreError::NotInitialized {
            session_id: self.session_id().unwrap_or_default().to_string(),
        }
    }

    fn active_store(&self) -> StoreResult<&dyn ConversationStore> {
        match self.store.as_deref() {
            Some(store) if self.state == SessionState::Active => Ok(store),
            _ => Err(self.not_initialized()),
        }
    }

    fn active_store_mut(&mut self) -> StoreResult<&mut Box<dyn ConversationStore>> {
        if self.state != SessionState::Active {
            return Err(self.not_initialized());
        }
        let err = self.not_initialized();
        self.store.as_mut().ok_or(err)
    }
}
