//! Identity provider (OAuth 2.0 / OpenID Connect) client.
//!
//! Two user pools share one client: consumers and store owners. Every
//! operation takes the principal type and picks that pool's settings.
//!
//! # OAuth Flow
//!
//! 1. Build the hosted-UI URL with `authorization_url()` and redirect to it
//! 2. The provider redirects back with an authorization code
//! 3. Exchange the code with `exchange_code()`
//! 4. Decode the ID token with `decode_id_token()` and persist the session
//! 5. On logout, clear the session and redirect to `logout_url()`
//!
//! # Example
//!
//! ```rust,ignore
//! let client = IdentityClient::new(&config.identity);
//!
//! let url = client.authorization_url(PrincipalType::Store, &state)?;
//! // ... callback ...
//! let tokens = client.exchange_code(PrincipalType::Store, &code).await?;
//! let claims = decode_id_token(&tokens.id_token, PrincipalType::Store)?;
//! ```

mod error;

pub use error::IdentityError;

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;

use bento_core::PrincipalType;

use crate::config::{ConfigError, IdentityConfig};
use crate::models::{IdentityClaims, SessionTokens};

/// OAuth scopes requested from the provider.
const SCOPE: &str = "openid email";

/// Raw response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
    access_token: String,
    refresh_token: Option<String>,
}

/// Client for the hosted identity provider.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    config: IdentityConfig,
}

impl IdentityClient {
    /// Create a new identity provider client.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            inner: Arc::new(IdentityClientInner {
                client: reqwest::Client::new(),
                config: config.clone(),
            }),
        }
    }

    /// Build the authorization URL for a login.
    ///
    /// # Arguments
    ///
    /// * `principal` - Which user pool to log in to
    /// * `state` - Random value stored in the session to prevent CSRF
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Config` if the pool's domain, client ID or
    /// redirect URI is missing.
    pub fn authorization_url(
        &self,
        principal: PrincipalType,
        state: &str,
    ) -> Result<String, IdentityError> {
        let pool = self.inner.config.pool(principal).require()?;

        Ok(format!(
            "{}/oauth2/authorize?\
            response_type=code&\
            client_id={}&\
            redirect_uri={}&\
            scope={}&\
            state={}",
            pool.domain,
            urlencoding::encode(pool.client_id),
            urlencoding::encode(pool.redirect_uri),
            urlencoding::encode(SCOPE),
            urlencoding::encode(state),
        ))
    }

    /// Build the provider's logout URL.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Config` if the pool is not configured or no
    /// logout landing URI is set.
    pub fn logout_url(&self, principal: PrincipalType) -> Result<String, IdentityError> {
        let pool = self.inner.config.pool(principal).require()?;
        let logout_uri = self
            .inner
            .config
            .logout_uri
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("COGNITO_LOGOUT_URI".to_string()))?;

        Ok(format!(
            "{}/logout?client_id={}&logout_uri={}",
            pool.domain,
            urlencoding::encode(pool.client_id),
            urlencoding::encode(logout_uri),
        ))
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool is not configured, the request fails, or
    /// the token endpoint rejects the code.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(
        &self,
        principal: PrincipalType,
        code: &str,
    ) -> Result<SessionTokens, IdentityError> {
        let pool = self.inner.config.pool(principal).require()?;
        let url = format!("{}/oauth2/token", pool.domain);

        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("client_id", pool.client_id),
            ("code", code),
            ("redirect_uri", pool.redirect_uri),
        ];
        if let Some(secret) = pool.client_secret {
            params.push(("client_secret", secret.expose_secret()));
        }

        let response = self.inner.client.post(&url).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::TokenExchange {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let token: TokenResponse = response.json().await?;

        Ok(SessionTokens {
            id_token: token.id_token,
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        })
    }
}

/// Decode an ID token's claims and tag them with the principal type.
///
/// The signature is not verified.
///
/// # Errors
///
/// Returns an error if the token is not a JWT or its payload is not a
/// claims object with a subject.
pub fn decode_id_token(
    id_token: &str,
    principal: PrincipalType,
) -> Result<IdentityClaims, IdentityError> {
    let mut parts = id_token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(IdentityError::MalformedToken("expected three dot-separated parts"));
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let mut claims: IdentityClaims = serde_json::from_slice(&bytes)?;
    claims.principal = principal;
    Ok(claims)
}

/// Generate a random alphanumeric string for OAuth state.
#[must_use]
pub fn generate_state(length: usize) -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
