//! Core data models shared by discovery and conversation storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => anyhow::bail!("Unknown message role: '{}'", other),
        }
    }
}

/// A persisted conversation message.
///
/// Messages are immutable once written. Within a session they are ordered
/// by `timestamp`, which never decreases in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// The `{role, content}` shape sent to the model provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl From<Message> for ChatMessage {
    fn from(msg: Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content,
        }
    }
}

/// A file found by the directory scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Path usable for reading (scan root joined with `relative`).
    pub path: PathBuf,
    /// Path relative to the scan root.
    pub relative: PathBuf,
    /// Lowercased extension without the leading dot.
    pub extension: String,
}

/// A candidate file with its relevance score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredFile {
    pub path: PathBuf,
    pub relative: PathBuf,
    pub score: u64,
}

impl ScoredFile {
    pub fn new(candidate: &CandidateFile, score: u64) -> Self {
        Self {
            path: candidate.path.clone(),
            relative: candidate.relative.clone(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip_through_str() {
        for role in [Role::System, Role::User, Role::Assistant] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_rejects_unknown() {
        assert!("tool".parse::<Role>().is_err());
        assert!("User".parse::<Role>().is_err());
    }

    #[test]
    fn test_chat_message_wire_shape() {
        let msg = ChatMessage {
            role: Role::Assistant,
            content: "hi".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }
}
