//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with in-memory store)
//! 5. Security headers (CSP, frame options, etc.)
//! 6. Rate limiting on `/auth` and `/chat` (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{AuthRejection, CurrentSession, RequireStore};
pub use rate_limit::{auth_rate_limiter, chat_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::{SecurityHeaders, security_headers_middleware};
pub use session::create_session_layer;
