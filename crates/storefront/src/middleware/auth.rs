//! Session extractors.
//!
//! Both extractors read the tower-sessions [`Session`] placed in request
//! extensions by the session layer and build a [`SessionContext`] from it.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use bento_core::{PrincipalType, StoreId};

use crate::models::{BearerCredential, IdentityClaims, SessionContext};

/// The visitor's session context, anonymous when nobody is logged in.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentSession(ctx): CurrentSession) -> impl IntoResponse {
///     ctx.display_name().unwrap_or("guest").to_string()
/// }
/// ```
pub struct CurrentSession(pub SessionContext);

/// Rejection when the session layer is missing or the visitor lacks access.
pub enum AuthRejection {
    /// Send the visitor to a login.
    RedirectToLogin(PrincipalType),
    /// No session layer in front of the handler.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(principal) => {
                Redirect::to(&format!("/auth/login/{principal}")).into_response()
            }
            Self::MissingSession => {
                tracing::error!("Session layer missing from router");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::MissingSession)?;

        Ok(Self(SessionContext::load(session).await))
    }
}

/// A logged-in store owner.
///
/// Anyone else is redirected to the store login.
pub struct RequireStore {
    pub claims: IdentityClaims,
    pub store_id: StoreId,
    pub credential: BearerCredential,
}

impl<S> FromRequestParts<S> for RequireStore
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentSession(ctx) = CurrentSession::from_request_parts(parts, state).await?;
        let claims = ctx
            .claims()
            .cloned()
            .ok_or(AuthRejection::RedirectToLogin(PrincipalType::Store))?;
        let (Some(store_id), Some(credential)) = (claims.store_id(), ctx.credential()) else {
            tracing::debug!(principal = %claims.principal, "Console requires a store account");
            return Err(AuthRejection::RedirectToLogin(PrincipalType::Store));
        };

        Ok(Self {
            claims,
            store_id,
            credential,
        })
    }
}
