//! Bento storefront library.
//!
//! Server-rendered web client for a bento ordering service: a store
//! directory, per-store bento grids with consumer favorites, a console where
//! store owners manage their profile and bentos, and a chat widget. All data
//! lives behind a remote HTTP API; visitors log in through a hosted OIDC UI.
//!
//! The router is built by [`app`] so that it can be exercised in tests
//! without binding a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;

use axum::{Router, middleware::from_fn, middleware::from_fn_with_state};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{
    RequestId, SecurityHeaders, auth_rate_limiter, chat_rate_limiter, create_session_layer,
    request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Build the full application router.
///
/// `rate_limit` enables the per-IP limiters on `/auth` and `/chat`; they key
/// on the peer address, so the server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app(state: AppState, rate_limit: bool) -> Router {
    let mut auth = routes::auth_routes();
    let mut chat = routes::chat_routes();
    if rate_limit {
        if let Some(limiter) = auth_rate_limiter() {
            auth = auth.layer(limiter);
        }
        if let Some(limiter) = chat_rate_limiter() {
            chat = chat.layer(limiter);
        }
    }

    let security_headers = SecurityHeaders::new(&state.config().identity);
    let session_layer = create_session_layer(state.config());

    Router::new()
        .merge(routes::page_routes())
        .nest("/auth", auth)
        .nest("/chat", chat)
        .nest_service(
            "/static",
            ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        )
        .layer(from_fn_with_state(
            security_headers,
            security_headers_middleware,
        ))
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestId>()
                        .map_or("", |id| id.0.as_str());
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
