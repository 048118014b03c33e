//! Session-related types.
//!
//! The visitor's identity lives in the tower-sessions session as three opaque
//! tokens plus a JSON-encoded claims blob. [`SessionContext`] is the only
//! place that reads or writes those keys.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use bento_core::{PrincipalType, SubjectId};

use super::IdentityClaims;

/// Session keys.
pub mod keys {
    /// Raw ID token from the identity provider.
    pub const ID_TOKEN: &str = "id_token";

    /// OAuth access token.
    pub const ACCESS_TOKEN: &str = "access_token";

    /// OAuth refresh token.
    pub const REFRESH_TOKEN: &str = "refresh_token";

    /// JSON-encoded [`IdentityClaims`](crate::models::IdentityClaims).
    pub const USER: &str = "user";

    /// Pending OAuth login (CSRF state and principal type).
    pub const OAUTH_PENDING: &str = "oauth_pending";

    /// The console's locally edited copy of the selected bento.
    pub const CONSOLE_DRAFT: &str = "console_draft";

    /// Key of the visitor's chat transcript in the chat service.
    pub const CHAT_ID: &str = "chat_id";
}

/// Tokens returned by the identity provider's token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// An OAuth login that has been started but not completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    /// CSRF state echoed back by the identity provider.
    pub state: String,
    /// Which user pool the login was started against.
    pub principal: PrincipalType,
}

/// Credential attached to authenticated backend calls.
///
/// The backend authorizes on the subject claim, not on the raw token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerCredential(String);

impl BearerCredential {
    /// Credential for a subject.
    #[must_use]
    pub fn from_subject(sub: &SubjectId) -> Self {
        Self(sub.as_str().to_owned())
    }

    /// The value placed after `Bearer ` in the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The visitor's identity for the current request.
///
/// Built with [`SessionContext::load`] and torn down with
/// [`SessionContext::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    claims: Option<IdentityClaims>,
}

impl SessionContext {
    /// An unauthenticated context.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { claims: None }
    }

    /// A context for already-loaded claims.
    #[must_use]
    pub const fn from_claims(claims: IdentityClaims) -> Self {
        Self {
            claims: Some(claims),
        }
    }

    /// Load the context from the session, or default to anonymous.
    ///
    /// A claims blob that cannot be parsed wipes every session key, so a
    /// corrupted login never half-survives.
    pub async fn load(session: &Session) -> Self {
        let blob = match session.get::<String>(keys::USER).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return Self::anonymous(),
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable identity claims in session");
                Self::clear(session).await;
                return Self::anonymous();
            }
        };

        match serde_json::from_str::<IdentityClaims>(&blob) {
            Ok(claims) => Self {
                claims: Some(claims),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Malformed identity claims in session, clearing");
                Self::clear(session).await;
                Self::anonymous()
            }
        }
    }

    /// Persist a completed login.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn establish(
        session: &Session,
        tokens: &SessionTokens,
        claims: IdentityClaims,
    ) -> Result<Self, tower_sessions::session::Error> {
        // New identity, new session id.
        session.cycle_id().await?;

        session.insert(keys::ID_TOKEN, &tokens.id_token).await?;
        session
            .insert(keys::ACCESS_TOKEN, &tokens.access_token)
            .await?;
        if let Some(refresh_token) = &tokens.refresh_token {
            session.insert(keys::REFRESH_TOKEN, refresh_token).await?;
        }

        let blob = serde_json::to_string(&claims)?;
        session.insert(keys::USER, blob).await?;

        Ok(Self {
            claims: Some(claims),
        })
    }

    /// Remove every persisted session value.
    pub async fn clear(session: &Session) {
        if let Err(e) = session.flush().await {
            tracing::warn!(error = %e, "Failed to flush session");
        }
    }

    /// Whether a visitor is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.claims.is_some()
    }

    /// The logged-in visitor's claims.
    #[must_use]
    pub const fn claims(&self) -> Option<&IdentityClaims> {
        self.claims.as_ref()
    }

    /// The logged-in visitor's principal type.
    #[must_use]
    pub fn principal(&self) -> Option<PrincipalType> {
        self.claims.as_ref().map(|c| c.principal)
    }

    /// Name shown in the navigation bar.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.claims.as_ref().map(IdentityClaims::display_name)
    }

    /// Whether the visitor is a logged-in consumer.
    #[must_use]
    pub fn is_consumer(&self) -> bool {
        self.principal() == Some(PrincipalType::Consumer)
    }

    /// Credential for authenticated backend calls.
    #[must_use]
    pub fn credential(&self) -> Option<BearerCredential> {
        self.claims
            .as_ref()
            .map(|c| BearerCredential::from_subject(&c.sub))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn store_claims() -> IdentityClaims {
        IdentityClaims {
            sub: SubjectId::parse("store-sub-1").unwrap(),
            principal: PrincipalType::Store,
            username: Some("happy-bento".to_string()),
            name: None,
            email: Some("owner@bento.test".to_string()),
        }
    }

    fn tokens() -> SessionTokens {
        SessionTokens {
            id_token: "id.jwt".to_string(),
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
        }
    }

    #[tokio::test]
    async fn test_empty_session_is_anonymous() {
        let session = session();
        let ctx = SessionContext::load(&session).await;
        assert!(!ctx.is_authenticated());
        assert!(ctx.credential().is_none());
    }

    #[tokio::test]
    async fn test_establish_then_load() {
        let session = session();
        SessionContext::establish(&session, &tokens(), store_claims())
            .await
            .unwrap();

        let ctx = SessionContext::load(&session).await;
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.principal(), Some(PrincipalType::Store));
        assert_eq!(ctx.display_name(), Some("happy-bento"));
        assert_eq!(ctx.credential().unwrap().as_str(), "store-sub-1");

        let access: Option<String> = session.get(keys::ACCESS_TOKEN).await.unwrap();
        assert_eq!(access.as_deref(), Some("access"));
    }

    #[tokio::test]
    async fn test_malformed_claims_clear_session() {
        let session = session();
        session.insert(keys::ID_TOKEN, "id.jwt").await.unwrap();
        session.insert(keys::ACCESS_TOKEN, "access").await.unwrap();
        session.insert(keys::USER, "{not json").await.unwrap();

        let ctx = SessionContext::load(&session).await;
        assert!(!ctx.is_authenticated());

        let id_token: Option<String> = session.get(keys::ID_TOKEN).await.unwrap();
        let user: Option<String> = session.get(keys::USER).await.unwrap();
        assert!(id_token.is_none());
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_claims_without_subject_are_malformed() {
        let session = session();
        session
            .insert(keys::USER, r#"{"type":"store","email":"x@y.z"}"#)
            .await
            .unwrap();

        let ctx = SessionContext::load(&session).await;
        assert_eq!(ctx, SessionContext::anonymous());
        let user: Option<String> = session.get(keys::USER).await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_non_string_blob_clears_session() {
        let session = session();
        session.insert(keys::USER, 42_u32).await.unwrap();
        session.insert(keys::REFRESH_TOKEN, "refresh").await.unwrap();

        let ctx = SessionContext::load(&session).await;
        assert!(!ctx.is_authenticated());
        let refresh: Option<String> = session.get(keys::REFRESH_TOKEN).await.unwrap();
        assert!(refresh.is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let session = session();
        SessionContext::establish(&session, &tokens(), store_claims())
            .await
            .unwrap();

        SessionContext::clear(&session).await;

        assert!(!SessionContext::load(&session).await.is_authenticated());
        let id_token: Option<String> = session.get(keys::ID_TOKEN).await.unwrap();
        assert!(id_token.is_none());
    }
}
