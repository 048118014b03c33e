//! Favorite toggle.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;

use bento_core::ItemId;

use crate::error::add_breadcrumb;
use crate::middleware::CurrentSession;
use crate::models::Alert;
use crate::routes::safe_return_path;
use crate::state::AppState;

/// Favorite form data.
#[derive(Debug, Deserialize)]
pub struct FavoriteForm {
    /// Desired state, `true` to favorite.
    pub favorite: String,
    /// Page to go back to.
    pub return_to: Option<String>,
}

/// Set or unset a favorite, then go back to the card's page.
///
/// Anonymous visitors are asked to log in; store accounts cannot favorite.
pub async fn set(
    State(state): State<AppState>,
    CurrentSession(ctx): CurrentSession,
    Path(item_id): Path<String>,
    Form(form): Form<FavoriteForm>,
) -> impl IntoResponse {
    let return_to = safe_return_path(form.return_to.as_deref());

    let (Some(claims), Some(credential)) = (ctx.claims(), ctx.credential()) else {
        return Redirect::to(&Alert::LoginRequired.redirect_to(&return_to));
    };
    if !ctx.is_consumer() {
        return Redirect::to(&Alert::ConsumerOnly.redirect_to(&return_to));
    }
    let Ok(item_id) = ItemId::parse(&item_id) else {
        return Redirect::to(&Alert::InvalidInput.redirect_to(&return_to));
    };

    let favorite = form.favorite == "true";
    match state
        .favorites()
        .set(&credential, &claims.sub, &item_id, favorite)
        .await
    {
        Ok(()) => {
            add_breadcrumb(
                "favorites",
                if favorite { "Favorited" } else { "Unfavorited" },
                &[("item_id", item_id.as_str())],
            );
            Redirect::to(&return_to)
        }
        Err(e) => {
            tracing::warn!(error = %e, item_id = %item_id, "Favorite write failed");
            Redirect::to(&Alert::FavoriteFailed.redirect_to(&return_to))
        }
    }
}
