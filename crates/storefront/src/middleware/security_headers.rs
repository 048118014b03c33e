//! Security headers middleware.
//!
//! Adds restrictive headers to every response. The CSP is built once at
//! startup because `form-action` must name the identity provider domains: the
//! logout form is answered with a redirect to the provider.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::config::IdentityConfig;

/// Precomputed header values.
#[derive(Clone)]
pub struct SecurityHeaders {
    csp: Arc<HeaderValue>,
}

impl SecurityHeaders {
    /// Build the header set for the configured identity provider domains.
    #[must_use]
    pub fn new(identity: &IdentityConfig) -> Self {
        let mut form_action = vec!["'self'".to_string()];
        for domain in [&identity.consumer.domain, &identity.store.domain]
            .into_iter()
            .flatten()
        {
            let domain = domain.trim_end_matches('/').to_string();
            if !form_action.contains(&domain) {
                form_action.push(domain);
            }
        }

        let csp = format!(
            "default-src 'none'; \
             script-src 'self'; \
             style-src 'self'; \
             img-src 'self' https: data:; \
             connect-src 'self'; \
             frame-src 'none'; \
             object-src 'none'; \
             base-uri 'self'; \
             form-action {}; \
             frame-ancestors 'none'",
            form_action.join(" ")
        );

        let csp = HeaderValue::from_str(&csp).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Identity domain not valid in CSP, using self only");
            HeaderValue::from_static(
                "default-src 'none'; script-src 'self'; style-src 'self'; \
                 img-src 'self' https: data:; form-action 'self'; frame-ancestors 'none'",
            )
        });

        Self { csp: Arc::new(csp) }
    }
}

/// Add security headers to all responses.
///
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: no-referrer`
/// - `Content-Security-Policy` (see [`SecurityHeaders::new`])
/// - `Permissions-Policy` denying camera, microphone, geolocation and payment
/// - `Cache-Control: no-store` on everything but static assets
/// - `Cross-Origin-Opener-Policy: same-origin`
pub async fn security_headers_middleware(
    State(security): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let is_static = request.uri().path().starts_with("/static/");
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CONTENT_SECURITY_POLICY, (*security.csp).clone());
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("camera=(), microphone=(), geolocation=(), payment=()"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    // Pages carry per-visitor state.
    if !is_static {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    response
}
