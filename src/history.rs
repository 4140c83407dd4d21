//! Reading a stored conversation back by session id.

use anyhow::Result;
use chrono::SecondsFormat;
use codewhisper_core::models::Message;
use codewhisper_core::store::ConversationStore;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// All messages recorded for `session_id`, oldest first.
pub async fn read_history(config: &Config, session_id: &str) -> Result<Vec<Message>> {
    let mut store = SqliteStore::new(&config.db.path, session_id);
    store.initialize().await?;
    let messages = store.history().await;
    store.close().await?;
    Ok(messages?)
}

/// Render one message as `[timestamp] role: content`.
pub fn format_message(message: &Message) -> String {
    format!(
        "[{}] {}: {}",
        message.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        message.role,
        message.content
    )
}

pub async fn run_history(config: &Config, session_id: &str) -> Result<()> {
    let messages = read_history(config, session_id).await?;
    if messages.is_empty() {
        println!("No messages.");
        return Ok(());
    }
    for message in &messages {
        println!("{}", format_message(message));
    }
    Ok(())
}
