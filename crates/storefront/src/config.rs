//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `BENTO_API_BASE_URL` - Base URL of the catalog/store/favorites API
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `COGNITO_DOMAIN` - Consumer user pool hosted-UI domain
//! - `COGNITO_APP_CLIENT_ID` - Consumer app client ID
//! - `COGNITO_APP_CLIENT_SECRET` - Consumer app client secret (confidential clients only)
//! - `COGNITO_REDIRECT_URI` - Consumer OAuth callback URL
//! - `STORE_COGNITO_DOMAIN` - Store-owner user pool hosted-UI domain
//! - `STORE_COGNITO_APP_CLIENT_ID` - Store-owner app client ID
//! - `STORE_COGNITO_APP_CLIENT_SECRET` - Store-owner app client secret
//! - `STORE_COGNITO_REDIRECT_URI` - Store-owner OAuth callback URL
//! - `COGNITO_LOGOUT_URI` - Where the identity provider sends users after logout
//! - `BENTO_IMAGE_PLACEHOLDER_URL` - Image shown when a bento image cannot be resolved
//! - `BENTO_STORE_CACHE_TTL_SECS` - Store directory cache lifetime (default: 60)
//! - `CHAT_API_URL` - Chat bot endpoint
//! - `CHAT_HISTORY_LIMIT` - Maximum chat messages kept per session (default: 50)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! Identity provider settings are optional at startup. A missing
//! value is reported to the visitor when they try to log in or out.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use bento_core::PrincipalType;
use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Image used when a bento has no resolvable image.
pub const DEFAULT_IMAGE_PLACEHOLDER_URL: &str = "/static/images/bento-placeholder.svg";

const DEFAULT_CHAT_HISTORY_LIMIT: usize = 50;
const DEFAULT_STORE_CACHE_TTL_SECS: u64 = 60;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading or use.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Catalog backend configuration
    pub api: BackendConfig,
    /// Identity provider configuration for both user pools
    pub identity: IdentityConfig,
    /// Chat bot configuration
    pub chat: ChatConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Catalog/store/favorites backend configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Image URL used when resolution fails
    pub image_placeholder_url: String,
    /// Store directory cache lifetime in seconds
    pub store_cache_ttl_secs: u64,
}

/// Settings for one identity provider user pool.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone, Default)]
pub struct IdentityPoolConfig {
    /// Prefix of the environment variables this pool was read from
    pub env_prefix: &'static str,
    /// Hosted-UI domain, e.g. `https://bento.auth.ap-southeast-2.amazoncognito.com`
    pub domain: Option<String>,
    /// OAuth client ID
    pub client_id: Option<String>,
    /// OAuth client secret, only for confidential app clients
    pub client_secret: Option<SecretString>,
    /// Registered callback URL
    pub redirect_uri: Option<String>,
}

impl std::fmt::Debug for IdentityPoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityPoolConfig")
            .field("env_prefix", &self.env_prefix)
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// A pool whose required settings are all present.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings<'a> {
    pub domain: &'a str,
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
    pub client_secret: Option<&'a SecretString>,
}

impl IdentityPoolConfig {
    /// Borrow the pool's settings, failing on the first one that is missing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` naming the absent variable.
    pub fn require(&self) -> Result<PoolSettings<'_>, ConfigError> {
        let missing = |suffix: &str| ConfigError::MissingEnvVar(format!("{}_{suffix}", self.env_prefix));

        let domain = self.domain.as_deref().ok_or_else(|| missing("DOMAIN"))?;
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| missing("APP_CLIENT_ID"))?;
        let redirect_uri = self
            .redirect_uri
            .as_deref()
            .ok_or_else(|| missing("REDIRECT_URI"))?;

        Ok(PoolSettings {
            domain: domain.trim_end_matches('/'),
            client_id,
            redirect_uri,
            client_secret: self.client_secret.as_ref(),
        })
    }
}

/// Identity provider configuration.
#[derive(Debug, Clone, Default)]
pub struct IdentityConfig {
    /// Consumer user pool
    pub consumer: IdentityPoolConfig,
    /// Store-owner user pool
    pub store: IdentityPoolConfig,
    /// Post-logout landing URL registered with the identity provider
    pub logout_uri: Option<String>,
}

impl IdentityConfig {
    /// Get the pool settings for a principal type.
    #[must_use]
    pub const fn pool(&self, principal: PrincipalType) -> &IdentityPoolConfig {
        match principal {
            PrincipalType::Consumer => &self.consumer,
            PrincipalType::Store => &self.store,
        }
    }
}

/// Chat bot configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Bot endpoint; chat replies with an error message when unset
    pub endpoint: Option<String>,
    /// Maximum messages kept in a session's scrollback
    pub history_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            history_limit: DEFAULT_CHAT_HISTORY_LIMIT,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if a configured client secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = trim_url(get_required_env("STOREFRONT_BASE_URL")?);

        let api = BackendConfig::from_env()?;
        let identity = IdentityConfig::from_env()?;
        let chat = ChatConfig {
            endpoint: get_optional_env("CHAT_API_URL"),
            history_limit: parse_env_or_default(
                "CHAT_HISTORY_LIMIT",
                &DEFAULT_CHAT_HISTORY_LIMIT.to_string(),
            )?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            api,
            identity,
            chat,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: trim_url(get_required_env("BENTO_API_BASE_URL")?),
            image_placeholder_url: get_env_or_default(
                "BENTO_IMAGE_PLACEHOLDER_URL",
                DEFAULT_IMAGE_PLACEHOLDER_URL,
            ),
            store_cache_ttl_secs: parse_env_or_default(
                "BENTO_STORE_CACHE_TTL_SECS",
                &DEFAULT_STORE_CACHE_TTL_SECS.to_string(),
            )?,
        })
    }
}

impl IdentityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            consumer: IdentityPoolConfig::from_env("COGNITO")?,
            store: IdentityPoolConfig::from_env("STORE_COGNITO")?,
            logout_uri: get_optional_env("COGNITO_LOGOUT_URI"),
        })
    }
}

impl IdentityPoolConfig {
    fn from_env(prefix: &'static str) -> Result<Self, ConfigError> {
        let secret_key = format!("{prefix}_APP_CLIENT_SECRET");
        let client_secret = match get_optional_env(&secret_key) {
            Some(value) => {
                validate_secret_strength(&value, &secret_key)?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        Ok(Self {
            env_prefix: prefix,
            domain: get_optional_env(&format!("{prefix}_DOMAIN")),
            client_id: get_optional_env(&format!("{prefix}_APP_CLIENT_ID")),
            client_secret,
            redirect_uri: get_optional_env(&format!("{prefix}_REDIRECT_URI")),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to a default.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the secret issued by the identity provider."
            ),
        ));
    }

    Ok(())
}
