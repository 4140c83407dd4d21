//! # codewhisper core
//!
//! I/O-free logic shared by the `codewhisper` CLI: data models, keyword
//! extraction, relevance scoring, ranking, the conversation store
//! abstraction, and the session lifecycle.
//!
//! This crate contains no tokio, sqlx, or filesystem access. Callers read
//! files and open databases; everything here works on values already in
//! memory or on the [`store::ConversationStore`] trait.

pub mod keywords;
pub mod models;
pub mod rank;
pub mod score;
pub mod session;
pub mod store;
