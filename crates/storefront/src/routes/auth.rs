//! Hosted-UI login, callback and logout handlers.
//!
//! - Login: stores a pending login (state + principal) and redirects to the
//!   provider's authorize endpoint
//! - Callback: checks the state, exchanges the code, decodes the ID token and
//!   establishes the session
//! - Logout: clears the session and redirects to the provider's logout
//!
//! Failures are logged and reported with a generic alert on the landing page.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use bento_core::PrincipalType;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::CurrentSession;
use crate::models::{Alert, PendingLogin, SessionContext, session_keys};
use crate::services::identity::{IdentityError, decode_id_token, generate_state};
use crate::state::AppState;

/// Length of the OAuth `state` value.
const STATE_LENGTH: usize = 32;

/// Query parameters from the provider's callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

fn landing_with(alert: Alert) -> Response {
    Redirect::to(&alert.redirect_to("/")).into_response()
}

/// Start a login against one of the two user pools.
///
/// # Route
///
/// `GET /auth/login/{principal}` where principal is `consumer` or `store`
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Path(principal): Path<String>,
) -> Response {
    let Ok(principal) = principal.parse::<PrincipalType>() else {
        return landing_with(Alert::LoginFailed);
    };

    let oauth_state = generate_state(STATE_LENGTH);
    let url = match state.identity().authorization_url(principal, &oauth_state) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %e, principal = %principal, "Cannot start login");
            return landing_with(e.alert());
        }
    };

    let pending = PendingLogin {
        state: oauth_state,
        principal,
    };
    if let Err(e) = session.insert(session_keys::OAUTH_PENDING, &pending).await {
        tracing::error!(error = %e, "Failed to store pending login in session");
        return landing_with(Alert::LoginFailed);
    }

    Redirect::to(&url).into_response()
}

/// Handle the consumer pool's callback.
///
/// # Route
///
/// `GET /auth/callback`
pub async fn consumer_callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    callback(&state, &session, query, PrincipalType::Consumer).await
}

/// Handle the store pool's callback.
///
/// # Route
///
/// `GET /auth/callback/store`
pub async fn store_callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    callback(&state, &session, query, PrincipalType::Store).await
}

async fn callback(
    state: &AppState,
    session: &Session,
    query: CallbackQuery,
    principal: PrincipalType,
) -> Response {
    match complete_login(state, session, query, principal).await {
        Ok(ctx) => {
            tracing::info!(principal = %principal, "Visitor logged in");
            if let Some(claims) = ctx.claims() {
                set_sentry_user(claims.sub.as_str(), claims.email.as_deref());
            }
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, principal = %principal, "Login failed");
            if e.is_token_error() {
                SessionContext::clear(session).await;
            }
            landing_with(e.alert())
        }
    }
}

async fn complete_login(
    state: &AppState,
    session: &Session,
    query: CallbackQuery,
    principal: PrincipalType,
) -> Result<SessionContext, IdentityError> {
    // One-time use, whatever the outcome.
    let pending = session
        .remove::<PendingLogin>(session_keys::OAUTH_PENDING)
        .await
        .ok()
        .flatten();

    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        return Err(IdentityError::Denied(format!("{error}: {description}")));
    }

    let code = query.code.ok_or(IdentityError::MissingCode)?;

    let state_matches = pending.is_some_and(|p| {
        p.principal == principal && query.state.as_deref() == Some(p.state.as_str())
    });
    if !state_matches {
        return Err(IdentityError::StateMismatch);
    }

    let tokens = state.identity().exchange_code(principal, &code).await?;
    let claims = decode_id_token(&tokens.id_token, principal)?;

    Ok(SessionContext::establish(session, &tokens, claims).await?)
}

/// Log out.
///
/// The session is cleared first; the redirect then goes to the provider's
/// logout for the pool the visitor logged in through.
///
/// # Route
///
/// `POST /auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    CurrentSession(ctx): CurrentSession,
) -> Response {
    let principal = ctx.principal().unwrap_or_default();

    SessionContext::clear(&session).await;
    clear_sentry_user();
    tracing::info!(principal = %principal, "Visitor logged out");

    match state.identity().logout_url(principal) {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot redirect to provider logout");
            landing_with(Alert::LoggedOut)
        }
    }
}
