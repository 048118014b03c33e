//! Store page: a store's bentos as cards.

use std::collections::HashSet;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use bento_core::{ItemId, StoreId};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CurrentSession;
use crate::models::{AlertQuery, SessionContext, StoreProfile};
use crate::routes::Page;
use crate::services::DisplayBento;
use crate::state::AppState;

/// Card display data for templates.
#[derive(Clone, Debug)]
pub struct BentoCardView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub quantity: u32,
    pub available: bool,
    pub favorite: bool,
}

impl BentoCardView {
    fn new(bento: DisplayBento, favorites: &HashSet<ItemId>) -> Self {
        Self {
            favorite: favorites.contains(&bento.id),
            available: bento.is_available(),
            quantity: bento.quantity.count(),
            id: bento.id.into_inner(),
            name: bento.name,
            description: bento.description,
            image_url: bento.image_url,
        }
    }
}

/// Store page template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/show.html")]
pub struct StoreTemplate {
    pub page: Page,
    pub store: StoreProfile,
    pub cards: Vec<BentoCardView>,
    /// Whether cards show a favorite toggle (everyone but store accounts).
    pub show_favorites: bool,
    pub return_to: String,
}

async fn favorite_flags(
    state: &AppState,
    ctx: &SessionContext,
    bentos: &[DisplayBento],
) -> HashSet<ItemId> {
    let (Some(claims), Some(credential)) = (ctx.claims(), ctx.credential()) else {
        return HashSet::new();
    };
    if !ctx.is_consumer() {
        return HashSet::new();
    }

    let ids: Vec<ItemId> = bentos.iter().map(|b| b.id.clone()).collect();
    state
        .favorites()
        .flags(&credential, &claims.sub, &ids)
        .await
}

/// Display a store's bentos.
///
/// # Errors
///
/// Returns `AppError::NotFound` for a blank store ID.
#[instrument(skip(state, ctx, query))]
pub async fn show(
    State(state): State<AppState>,
    CurrentSession(ctx): CurrentSession,
    Path(store_id): Path<String>,
    Query(query): Query<AlertQuery>,
) -> Result<impl IntoResponse> {
    let store_id =
        StoreId::parse(&store_id).map_err(|_| AppError::NotFound("store".to_string()))?;

    let credential = ctx.credential();
    let store = state.catalog().store_profile(&store_id).await;
    let bentos = state.catalog().items(&store_id, credential.as_ref()).await;
    let favorites = favorite_flags(&state, &ctx, &bentos).await;

    Ok(StoreTemplate {
        page: Page::new(&ctx, query.alert()),
        return_to: format!("/stores/{}", urlencoding::encode(store_id.as_str())),
        store,
        cards: bentos
            .into_iter()
            .map(|bento| BentoCardView::new(bento, &favorites))
            .collect(),
        show_favorites: !ctx.principal().is_some_and(|p| p.is_store()),
    })
}
