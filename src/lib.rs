//! # codewhisper
//!
//! A command-line coding assistant that keeps conversation history on disk
//! and finds the source files relevant to a question on its own.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌─────────────┐
//! │ Scanner  │──▶│  Keywords   │──▶│ Score+Rank  │──┐
//! │ walkdir  │   │ + scoring   │   │  top N      │  │ context
//! └──────────┘   └─────────────┘   └─────────────┘  ▼
//!                ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//!                │   SQLite    │◀──│   Session   │──▶│  Model   │
//!                │conversations│   │ coordinator │   │ (HTTP)   │
//!                └─────────────┘   └─────────────┘   └──────────┘
//! ```
//!
//! The pure pieces (keyword extraction, scoring, ranking, the store trait and
//! the session coordinator) live in the `codewhisper-core` crate. This crate
//! adds the filesystem, SQLite, HTTP, and CLI layers.
//!
//! ## Quick Start
//!
//! ```bash
//! codewhisper init
//! codewhisper discover "how does login work" --path ./src
//! codewhisper ask -P "explain the login flow" -A --path ./src
//! codewhisper chat -F src/main.rs
//! codewhisper history <session-id>
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite conversation store |
//! | [`scanner`] | Code file enumeration |
//! | [`discover`] | Relevance discovery pipeline |
//! | [`context`] | Rendering files into context messages |
//! | [`client`] | Model-call collaborator |
//! | [`commands`] | Interactive input classification |
//! | [`chat`] | Interactive mode |
//! | [`ask`] | Single-prompt mode |
//! | [`history`] | Reading stored sessions |

pub mod ask;
pub mod chat;
pub mod client;
pub mod commands;
pub mod config;
pub mod context;
pub mod db;
pub mod discover;
pub mod history;
pub mod migrate;
pub mod scanner;
pub mod sqlite_store;
