//! Chat widget backed by a remote bot.
//!
//! Transcripts are held in memory, keyed by a random chat ID stored in the
//! visitor's session. Each transcript is bounded and carries a generation: a
//! reply that arrives after the transcript was cleared is dropped.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use crate::config::ChatConfig;
use crate::models::{ChatMessage, ChatRole, ChatTranscript, session_keys};

/// Text appended when the bot cannot be reached.
pub const FAILURE_MESSAGE: &str = "Sorry, the assistant is unavailable right now.";

/// Idle transcripts are dropped after this long.
const TRANSCRIPT_IDLE: Duration = Duration::from_secs(60 * 60);

/// Errors from the chat bot.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat endpoint is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat bot returned {0}")]
    Status(u16),

    #[error("chat bot reply had no text")]
    EmptyReply,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

type SharedTranscript = Arc<Mutex<ChatTranscript>>;

#[derive(Clone)]
pub struct ChatService {
    inner: Arc<ChatServiceInner>,
}

struct ChatServiceInner {
    client: reqwest::Client,
    endpoint: Option<String>,
    history_limit: usize,
    transcripts: Cache<String, SharedTranscript>,
}

impl ChatService {
    #[must_use]
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            inner: Arc::new(ChatServiceInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint.clone(),
                history_limit: config.history_limit.max(1),
                transcripts: Cache::builder()
                    .max_capacity(10_000)
                    .time_to_idle(TRANSCRIPT_IDLE)
                    .build(),
            }),
        }
    }

    async fn shared(&self, chat_id: &str) -> SharedTranscript {
        self.inner
            .transcripts
            .get_with(chat_id.to_string(), async { SharedTranscript::default() })
            .await
    }

    /// A copy of the current transcript.
    pub async fn transcript(&self, chat_id: &str) -> ChatTranscript {
        let shared = self.shared(chat_id).await;
        let transcript = shared.lock().unwrap_or_else(PoisonError::into_inner);
        transcript.clone()
    }

    /// Post a message and append the bot's reply.
    ///
    /// Blank input is ignored. A failed call appends an error line instead of
    /// a reply.
    #[instrument(skip(self, text))]
    pub async fn send(&self, chat_id: &str, text: &str) -> ChatTranscript {
        let text = text.trim();
        if text.is_empty() {
            return self.transcript(chat_id).await;
        }

        let shared = self.shared(chat_id).await;
        let limit = self.inner.history_limit;
        let generation = {
            let mut transcript = shared.lock().unwrap_or_else(PoisonError::into_inner);
            transcript.push(
                ChatMessage {
                    role: ChatRole::User,
                    text: text.to_string(),
                },
                limit,
            );
            transcript.generation()
        };

        let reply = match self.ask(text).await {
            Ok(reply) => ChatMessage {
                role: ChatRole::Bot,
                text: reply,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Chat request failed");
                ChatMessage {
                    role: ChatRole::Error,
                    text: FAILURE_MESSAGE.to_string(),
                }
            }
        };

        let mut transcript = shared.lock().unwrap_or_else(PoisonError::into_inner);
        if !transcript.push_if_current(generation, reply, limit) {
            tracing::debug!("Transcript cleared while waiting, reply dropped");
        }
        transcript.clone()
    }

    /// Empty the transcript.
    pub async fn clear(&self, chat_id: &str) -> ChatTranscript {
        let shared = self.shared(chat_id).await;
        let mut transcript = shared.lock().unwrap_or_else(PoisonError::into_inner);
        transcript.reset();
        transcript.clone()
    }

    /// Ask the bot and return its reply text.
    async fn ask(&self, message: &str) -> Result<String, ChatError> {
        let endpoint = self
            .inner
            .endpoint
            .as_deref()
            .ok_or(ChatError::NotConfigured)?;

        let response = self
            .inner
            .client
            .post(endpoint)
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        reply_text(&body).ok_or(ChatError::EmptyReply)
    }
}

/// Find the reply text in a bot response.
///
/// The text is usually under `body`, sometimes under `reply` or `message`,
/// and `body` may itself be an object or a JSON-encoded string.
fn reply_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(inner @ Value::Object(_)) => reply_text(&inner),
            _ => Some(text.clone()).filter(|t| !t.trim().is_empty()),
        },
        Value::Object(map) => ["body", "reply", "message"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(reply_text),
        _ => None,
    }
}

/// The visitor's chat ID, created on first use.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn chat_id(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(id) = session.get::<String>(session_keys::CHAT_ID).await? {
        return Ok(id);
    }
    let id = uuid::Uuid::new_v4().to_string();
    session.insert(session_keys::CHAT_ID, &id).await?;
    Ok(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{Json, Router, routing::post};
    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;
    use crate::test_support::spawn;

    fn service(endpoint: Option<String>, history_limit: usize) -> ChatService {
        ChatService::new(&ChatConfig {
            endpoint,
            history_limit,
        })
    }

    async fn echo_bot() -> String {
        let app = Router::new().route(
            "/chat",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "statusCode": 200, "body": format!("echo: {}", body["message"].as_str().unwrap()) }))
            }),
        );
        format!("{}/chat", spawn(app).await)
    }

    fn texts(transcript: &ChatTranscript) -> Vec<(ChatRole, String)> {
        transcript
            .messages()
            .map(|m| (m.role, m.text.clone()))
            .collect()
    }

    #[test]
    fn test_reply_text_shapes() {
        assert_eq!(reply_text(&json!({ "body": "hi" })).as_deref(), Some("hi"));
        assert_eq!(reply_text(&json!({ "reply": "hi" })).as_deref(), Some("hi"));
        assert_eq!(
            reply_text(&json!({ "body": "{\"message\":\"nested\"}" })).as_deref(),
            Some("nested")
        );
        assert_eq!(reply_text(&json!({ "body": "" })), None);
        assert_eq!(reply_text(&json!([1, 2])), None);
    }

    #[tokio::test]
    async fn test_send_appends_reply() {
        let chat = service(Some(echo_bot().await), 50);

        let transcript = chat.send("c1", "  hello ").await;
        assert_eq!(
            texts(&transcript),
            [
                (ChatRole::User, "hello".to_string()),
                (ChatRole::Bot, "echo: hello".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let chat = service(Some(echo_bot().await), 50);
        assert!(chat.send("c1", "   ").await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_appends_error_line() {
        let chat = service(None, 50);

        let transcript = chat.send("c1", "hello").await;
        assert_eq!(
            texts(&transcript).last().unwrap(),
            &(ChatRole::Error, FAILURE_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let chat = service(Some(echo_bot().await), 3);
        for i in 0..3 {
            chat.send("c1", &format!("m{i}")).await;
        }

        let transcript = chat.transcript("c1").await;
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.messages().last().unwrap().text, "echo: m2");
    }

    #[tokio::test]
    async fn test_transcripts_are_per_chat() {
        let chat = service(Some(echo_bot().await), 50);
        chat.send("c1", "hello").await;
        assert!(chat.transcript("c2").await.is_empty());
    }

    #[tokio::test]
    async fn test_reply_after_clear_is_dropped() {
        let received = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let app = Router::new().route(
            "/chat",
            post({
                let received = received.clone();
                let release = release.clone();
                move || async move {
                    received.notify_one();
                    release.notified().await;
                    Json(json!({ "body": "late reply" }))
                }
            }),
        );
        let endpoint = format!("{}/chat", spawn(app).await);
        let chat = service(Some(endpoint), 50);

        let pending = tokio::spawn({
            let chat = chat.clone();
            async move { chat.send("c1", "hello").await }
        });

        received.notified().await;
        chat.clear("c1").await;
        release.notify_one();

        assert!(pending.await.unwrap().is_empty());
        assert!(chat.transcript("c1").await.is_empty());
    }

    #[tokio::test]
    async fn test_chat_id_is_stable_per_session() {
        let session = Session::new(None, Arc::new(tower_sessions::MemoryStore::default()), None);
        let first = chat_id(&session).await.unwrap();
        assert_eq!(chat_id(&session).await.unwrap(), first);
    }
}
