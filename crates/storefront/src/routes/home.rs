//! Store directory and health check.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use crate::filters;
use crate::middleware::CurrentSession;
use crate::models::{AlertQuery, StoreProfile};
use crate::routes::Page;
use crate::services::Catalog;
use crate::state::AppState;

/// Store directory template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: Page,
    pub stores: Vec<StoreProfile>,
}

/// Display the store directory.
///
/// A failed fetch renders the empty state.
#[instrument(skip(state, ctx))]
pub async fn home(
    State(state): State<AppState>,
    CurrentSession(ctx): CurrentSession,
    Query(query): Query<AlertQuery>,
) -> impl IntoResponse {
    let stores = match state.catalog().sync(None, None).await {
        Catalog::Stores(stores) => stores,
        Catalog::Items(_) => Vec::new(),
    };

    HomeTemplate {
        page: Page::new(&ctx, query.alert()),
        stores,
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
pub async fn health() -> &'static str {
    "ok"
}
