//! Model-call collaborator.
//!
//! [`ChatModel`] is the seam between a session and the remote language
//! model: it receives the ordered `{role, content}` history and a model id
//! and returns the assistant's reply text or a [`RemoteCallError`].
//!
//! [`OpenRouterClient`] implements it against any OpenAI-compatible chat
//! completions endpoint (OpenRouter by default). The API key is passed in
//! through [`ModelConfig`]; this module never reads the environment.
//!
//! No retries are attempted. A failed call is reported to the user and the
//! conversation carries on.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use codewhisper_core::models::ChatMessage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ModelConfig;

/// Failure of a single model call.
#[derive(Error, Debug)]
pub enum RemoteCallError {
    /// There was nothing to send.
    #[error("No messages to send to the model")]
    EmptyConversation,

    /// The provider returned `{"error": {"message": ...}}`.
    #[error("API error: {0}")]
    Api(String),

    /// The provider answered without any content.
    #[error("The model returned an empty reply")]
    EmptyReply,

    /// Non-success status without a recognizable error body.
    #[error("Unexpected API response ({status}): {body}")]
    Unexpected { status: u16, body: String },

    /// Network or decoding failure.
    #[error("Request to the model API failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Sends a conversation to a language model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> std::result::Result<String, RemoteCallError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat completions client for OpenRouter and compatible APIs.
pub struct OpenRouterClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl OpenRouterClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_key` is not set or the HTTP client cannot
    /// be built.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let api_key = match config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key.to_string(),
            _ => bail!("No API key configured. Set OPENROUTER_API_KEY or pass --api-key."),
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.url.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl ChatModel for OpenRouterClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> std::result::Result<String, RemoteCallError> {
        if messages.is_empty() {
            return Err(RemoteCallError::EmptyConversation);
        }

        debug!(model, count = messages.len(), "sending conversation to model");

        let response = self
            .http
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&CompletionRequest { model, messages })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_completion(status.as_u16(), &body)
    }
}

/// Interpret a chat completions response body.
fn parse_completion(status: u16, body: &str) -> std::result::Result<String, RemoteCallError> {
    let success = (200..300).contains(&status);
    let parsed: CompletionResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) if success => return Err(RemoteCallError::EmptyReply),
        Err(_) => {
            return Err(RemoteCallError::Unexpected {
                status,
                body: body.to_string(),
            })
        }
    };

    if let Some(error) = parsed.error {
        return Err(RemoteCallError::Api(error.message));
    }

    match parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
    {
        Some(content) if !content.is_empty() => Ok(content),
        _ if success => Err(RemoteCallError::EmptyReply),
        _ => Err(RemoteCallError::Unexpected {
            status,
            body: body.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Use a mutex."}}]}"#;
        assert_eq!(parse_completion(200, body).unwrap(), "Use a mutex.");
    }

    #[test]
    fn test_parse_api_error() {
        let body = r#"{"error":{"message":"Rate limit exceeded","code":429}}"#;
        match parse_completion(429, body) {
            Err(RemoteCallError::Api(msg)) => assert_eq!(msg, "Rate limit exceeded"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_in_success_body() {
        let body = r#"{"error":{"message":"model not found"}}"#;
        assert!(matches!(
            parse_completion(200, body),
            Err(RemoteCallError::Api(_))
        ));
    }

    #[test]
    fn test_parse_empty_content() {
        let body = r#"{"choices":[{"message":{"content":""}}]}"#;
        assert!(matches!(
            parse_completion(200, body),
            Err(RemoteCallError::EmptyReply)
        ));
        assert!(matches!(
            parse_completion(200, r#"{"choices":[]}"#),
            Err(RemoteCallError::EmptyReply)
        ));
    }

    #[test]
    fn test_parse_non_json_failure() {
        match parse_completion(502, "Bad Gateway") {
            Err(RemoteCallError::Unexpected { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "Bad Gateway");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = ModelConfig::default();
        assert!(OpenRouterClient::new(&config).is_err());

        let config = ModelConfig {
            api_key: Some("sk-test".to_string()),
            ..ModelConfig::default()
        };
        assert!(OpenRouterClient::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_empty_conversation_is_not_sent() {
        let config = ModelConfig {
            api_key: Some("sk-test".to_string()),
            url: "http://127.0.0.1:9/unused".to_string(),
            ..ModelConfig::default()
        };
        let client = OpenRouterClient::new(&config).unwrap();
        assert!(matches!(
            client.complete(&[], "any").await,
            Err(RemoteCallError::EmptyConversation)
        ));
    }

    #[test]
    fn test_request_wire_shape() {
        let messages = vec![ChatMessage {
            role: codewhisper_core::models::Role::User,
            content: "hi".to_string(),
        }];
        let json = serde_json::to_value(CompletionRequest {
            model: "m",
            messages: &messages,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]})
        );
    }
}
