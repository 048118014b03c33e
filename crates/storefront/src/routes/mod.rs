//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                               - Store directory
//! GET  /health                         - Health check
//! GET  /stores/{store_id}              - Bento grid for a store
//! POST /favorites/{item_id}            - Set or unset a favorite (consumers)
//!
//! # Auth
//! GET  /auth/login/{principal}         - Redirect to the hosted UI (consumer|store)
//! GET  /auth/callback                  - Consumer code exchange
//! GET  /auth/callback/store            - Store owner code exchange
//! POST /auth/logout                    - Clear the session, redirect to provider logout
//!
//! # Console (store owners)
//! GET  /console                        - Console, `?selected={item_id}` opens a draft
//! POST /console/store                  - Save store profile
//! POST /console/items                  - Create bento (multipart)
//! POST /console/items/{id}             - Save the selected draft (multipart)
//! GET  /console/items/{id}/delete      - Delete confirmation page
//! POST /console/items/{id}/delete      - Delete, requires `confirm=yes`
//!
//! # Chat
//! GET  /chat                           - Chat widget
//! POST /chat/messages                  - Send a message
//! POST /chat/clear                     - Clear the transcript
//! ```

pub mod auth;
pub mod chat;
pub mod console;
pub mod favorites;
pub mod home;
pub mod stores;

use axum::{
    Router,
    routing::{get, post},
};

use crate::models::{Alert, SessionContext};
use crate::state::AppState;

// =============================================================================
// Shared view data
// =============================================================================

/// Navigation bar state.
#[derive(Clone, Debug, Default)]
pub struct NavView {
    /// Logged-in visitor's name, `None` when anonymous.
    pub display_name: Option<String>,
    pub is_store: bool,
}

/// Data every page template receives.
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub nav: NavView,
    pub alert: Option<Alert>,
}

impl Page {
    #[must_use]
    pub fn new(ctx: &SessionContext, alert: Option<Alert>) -> Self {
        Self {
            nav: NavView {
                display_name: ctx.display_name().map(String::from),
                is_store: ctx.principal().is_some_and(|p| p.is_store()),
            },
            alert,
        }
    }
}

/// Accept only local absolute paths as redirect targets.
#[must_use]
pub fn safe_return_path(path: Option<&str>) -> String {
    match path {
        Some(p) if p.starts_with('/') && !p.starts_with("//") && !p.contains('\\') => {
            p.to_string()
        }
        _ => "/".to_string(),
    }
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login/{principal}", get(auth::login))
        .route("/callback", get(auth::consumer_callback))
        .route("/callback/store", get(auth::store_callback))
        .route("/logout", post(auth::logout))
}

/// Create the console routes router.
pub fn console_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(console::show))
        .route("/store", post(console::save_store))
        .route("/items", post(console::create_item))
        .route("/items/{id}", post(console::save_item))
        .route(
            "/items/{id}/delete",
            get(console::confirm_delete).post(console::delete_item),
        )
}

/// Create the chat routes router.
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(chat::show))
        .route("/messages", post(chat::send))
        .route("/clear", post(chat::clear))
}

/// Create the page routes that need no rate limiting.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(home::health))
        .route("/stores/{store_id}", get(stores::show))
        .route("/favorites/{item_id}", post(favorites::set))
        .nest("/console", console_routes())
}
