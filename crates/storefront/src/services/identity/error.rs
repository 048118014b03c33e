//! Identity provider error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::models::Alert;

/// Errors that can occur while logging a visitor in or out.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The user pool is not fully configured.
    #[error("identity provider not configured: {0}")]
    Config(#[from] ConfigError),

    /// HTTP request to the identity provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint rejected the authorization code.
    #[error("token exchange failed ({status}): {body}")]
    TokenExchange { status: u16, body: String },

    /// The ID token is not a three-part JWT.
    #[error("malformed ID token: {0}")]
    MalformedToken(&'static str),

    /// The ID token payload is not valid base64url.
    #[error("ID token payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The ID token payload is not the expected JSON.
    #[error("ID token claims could not be parsed: {0}")]
    Claims(#[from] serde_json::Error),

    /// The provider redirected back with an error.
    #[error("login denied: {0}")]
    Denied(String),

    /// The callback carried no authorization code.
    #[error("callback is missing the authorization code")]
    MissingCode,

    /// The callback's state does not match the pending login.
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// The established login could not be written to the session.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl IdentityError {
    /// Banner shown for this failure.
    #[must_use]
    pub const fn alert(&self) -> Alert {
        match self {
            Self::Config(_) => Alert::IdentityNotConfigured,
            _ => Alert::LoginFailed,
        }
    }

    /// Whether the ID token itself could not be decoded.
    #[must_use]
    pub const fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken(_) | Self::Base64(_) | Self::Claims(_)
        )
    }
}
