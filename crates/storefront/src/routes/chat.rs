//! Chat widget handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::CurrentSession;
use crate::models::{ChatRole, ChatTranscript};
use crate::routes::Page;
use crate::services::chat::chat_id;
use crate::state::AppState;

/// A rendered chat line.
#[derive(Clone, Debug)]
pub struct ChatLineView {
    /// CSS modifier: `user`, `bot` or `error`.
    pub role: &'static str,
    pub text: String,
}

/// Chat page template.
#[derive(Template, WebTemplate)]
#[template(path = "chat.html")]
pub struct ChatTemplate {
    pub page: Page,
    pub lines: Vec<ChatLineView>,
}

/// Chat message form data.
#[derive(Debug, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub message: String,
}

fn lines(transcript: &ChatTranscript) -> Vec<ChatLineView> {
    transcript
        .messages()
        .map(|m| ChatLineView {
            role: match m.role {
                ChatRole::User => "user",
                ChatRole::Bot => "bot",
                ChatRole::Error => "error",
            },
            text: m.text.clone(),
        })
        .collect()
}

/// Display the chat transcript.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CurrentSession(ctx): CurrentSession,
) -> Result<Response, AppError> {
    let id = chat_id(&session).await?;
    let transcript = state.chat().transcript(&id).await;

    Ok(ChatTemplate {
        page: Page::new(&ctx, None),
        lines: lines(&transcript),
    }
    .into_response())
}

/// Send a message and go back to the transcript.
#[instrument(skip_all)]
pub async fn send(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<MessageForm>,
) -> Result<Redirect, AppError> {
    let id = chat_id(&session).await?;
    state.chat().send(&id, &form.message).await;
    Ok(Redirect::to("/chat"))
}

/// Clear the transcript.
#[instrument(skip_all)]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Redirect, AppError> {
    let id = chat_id(&session).await?;
    state.chat().clear(&id).await;
    Ok(Redirect::to("/chat"))
}
