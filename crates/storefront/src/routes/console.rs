//! Store owner console route handlers.
//!
//! Successful writes render the console straight from the re-synced catalog
//! the console service returns. Failed writes redirect back with an alert and
//! leave the displayed state to the next sync.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bento_core::ItemId;

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::RequireStore;
use crate::models::{Alert, BentoDraft, ImageUpload, SessionContext, StoreProfile};
use crate::routes::Page;
use crate::services::console::{current_draft, discard_draft, select_draft};
use crate::services::{BentoInput, Confirmation, ConsoleError, DisplayBento};
use crate::state::AppState;

/// Console row display data.
#[derive(Clone, Debug)]
pub struct ConsoleItemView {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub quantity: u32,
    pub available: bool,
    pub selected: bool,
}

/// Console page template.
#[derive(Template, WebTemplate)]
#[template(path = "console/index.html")]
pub struct ConsoleTemplate {
    pub page: Page,
    pub store: StoreProfile,
    pub items: Vec<ConsoleItemView>,
    pub draft: Option<BentoDraft>,
}

/// Delete confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "console/confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub page: Page,
    pub item_id: String,
    pub name: String,
}

/// Console query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ConsoleQuery {
    pub selected: Option<String>,
    pub alert: Option<String>,
}

/// Store profile form data.
#[derive(Debug, Deserialize)]
pub struct StoreForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub description: String,
}

/// Delete confirmation form data.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub confirm: Option<String>,
}

/// A parsed bento form: text fields plus an optional new image.
#[derive(Debug, Default)]
struct ItemForm {
    fields: HashMap<String, String>,
    image: Option<ImageUpload>,
}

impl ItemForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ConsoleError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| ConsoleError::Invalid("form"))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                let content_type = field.content_type().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ConsoleError::Invalid("image"))?;
                form.image = ImageUpload::from_bytes(&bytes, content_type.as_deref());
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|_| ConsoleError::Invalid("form"))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    fn field(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }

    fn input(&self) -> Result<BentoInput, ConsoleError> {
        BentoInput::parse(
            self.field("name"),
            self.field("description"),
            self.field("quantity"),
        )
    }
}

fn console_redirect(alert: Alert) -> Response {
    Redirect::to(&alert.redirect_to("/console")).into_response()
}

fn render(
    ctx: &SessionContext,
    store: StoreProfile,
    bentos: Vec<DisplayBento>,
    draft: Option<BentoDraft>,
    alert: Option<Alert>,
) -> ConsoleTemplate {
    let selected = draft.as_ref().map(|d| d.item_id.clone());
    ConsoleTemplate {
        page: Page::new(ctx, alert),
        store,
        items: bentos
            .into_iter()
            .map(|bento| ConsoleItemView {
                selected: selected.as_ref() == Some(&bento.id),
                available: bento.is_available(),
                quantity: bento.quantity.count(),
                id: bento.id.into_inner(),
                name: bento.name,
                image_url: bento.image_url,
            })
            .collect(),
        draft,
    }
}

fn context(store: &RequireStore) -> SessionContext {
    SessionContext::from_claims(store.claims.clone())
}

/// Display the console.
///
/// `?selected=` copies that bento into the session draft, replacing any
/// previous draft.
#[instrument(skip_all, fields(store_id = %auth.store_id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    auth: RequireStore,
    Query(query): Query<ConsoleQuery>,
) -> Response {
    let store = state.catalog().store_profile(&auth.store_id).await;
    let bentos = state
        .catalog()
        .items(&auth.store_id, Some(&auth.credential))
        .await;

    let draft = match query.selected.as_deref().map(ItemId::parse) {
        Some(Ok(selected)) => match bentos.iter().find(|b| b.id == selected) {
            Some(bento) => match select_draft(&session, bento).await {
                Ok(draft) => Some(draft),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to store console draft");
                    None
                }
            },
            None => {
                discard_draft(&session).await;
                None
            }
        },
        Some(Err(_)) => None,
        None => current_draft(&session)
            .await
            .filter(|draft| bentos.iter().any(|b| b.id == draft.item_id)),
    };

    let alert = query.alert.as_deref().and_then(Alert::from_code);
    render(&context(&auth), store, bentos, draft, alert).into_response()
}

/// Save the store profile.
#[instrument(skip_all, fields(store_id = %auth.store_id))]
pub async fn save_store(
    State(state): State<AppState>,
    session: Session,
    auth: RequireStore,
    Form(form): Form<StoreForm>,
) -> Response {
    let profile = StoreProfile {
        id: auth.store_id.clone(),
        name: form.name.trim().to_string(),
        address: form.address.trim().to_string(),
        phone: form.phone.trim().to_string(),
        description: form.description.trim().to_string(),
    };

    match state.console().save_store(&auth.credential, &profile).await {
        Ok(store) => {
            add_breadcrumb("console", "Saved store profile", &[]);
            let bentos = state
                .catalog()
                .items(&auth.store_id, Some(&auth.credential))
                .await;
            let draft = current_draft(&session).await;
            render(&context(&auth), store, bentos, draft, Some(Alert::Saved)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Store profile save failed");
            console_redirect(e.alert(Alert::SaveFailed))
        }
    }
}

/// Create a bento.
#[instrument(skip_all, fields(store_id = %auth.store_id))]
pub async fn create_item(
    State(state): State<AppState>,
    auth: RequireStore,
    multipart: Multipart,
) -> Response {
    let result = async {
        let form = ItemForm::read(multipart).await?;
        let input = form.input()?;
        let item_id = match form.field("item_id").trim() {
            "" => None,
            raw => Some(ItemId::parse(raw).map_err(|_| ConsoleError::Invalid("item id"))?),
        };
        state
            .console()
            .create_item(&auth.credential, &auth.store_id, item_id, &input, form.image)
            .await
    }
    .await;

    match result {
        Ok(bentos) => {
            add_breadcrumb("console", "Created bento", &[]);
            let store = state.catalog().store_profile(&auth.store_id).await;
            render(&context(&auth), store, bentos, None, Some(Alert::Saved)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Bento create failed");
            console_redirect(e.alert(Alert::SaveFailed))
        }
    }
}

/// Save the selected bento's draft.
#[instrument(skip_all, fields(store_id = %auth.store_id, item_id = %id))]
pub async fn save_item(
    State(state): State<AppState>,
    session: Session,
    auth: RequireStore,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let result = async {
        let item_id = ItemId::parse(&id).map_err(|_| ConsoleError::Invalid("item id"))?;
        let form = ItemForm::read(multipart).await?;
        let input = form.input()?;
        state
            .console()
            .save_draft(
                &session,
                &auth.credential,
                &auth.store_id,
                &item_id,
                &input,
                form.image,
            )
            .await
    }
    .await;

    match result {
        Ok(bentos) => {
            add_breadcrumb("console", "Updated bento", &[("item_id", id.as_str())]);
            let store = state.catalog().store_profile(&auth.store_id).await;
            render(&context(&auth), store, bentos, None, Some(Alert::Saved)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Bento save failed");
            if matches!(e, ConsoleError::Invalid(_)) {
                // Validation failures keep the draft for another try.
                let path = format!("/console?selected={}", urlencoding::encode(&id));
                return Redirect::to(&Alert::InvalidInput.redirect_to(&path)).into_response();
            }
            console_redirect(e.alert(Alert::SaveFailed))
        }
    }
}

/// Ask for confirmation before deleting.
#[instrument(skip_all, fields(store_id = %auth.store_id, item_id = %id))]
pub async fn confirm_delete(
    State(state): State<AppState>,
    auth: RequireStore,
    Path(id): Path<String>,
) -> Response {
    let bentos = state
        .catalog()
        .items(&auth.store_id, Some(&auth.credential))
        .await;

    let Some(bento) = ItemId::parse(&id)
        .ok()
        .and_then(|item_id| bentos.into_iter().find(|b| b.id == item_id))
    else {
        return console_redirect(Alert::InvalidInput);
    };

    ConfirmDeleteTemplate {
        page: Page::new(&context(&auth), None),
        item_id: bento.id.into_inner(),
        name: bento.name,
    }
    .into_response()
}

/// Delete a bento; anything but `confirm=yes` cancels.
#[instrument(skip_all, fields(store_id = %auth.store_id, item_id = %id))]
pub async fn delete_item(
    State(state): State<AppState>,
    session: Session,
    auth: RequireStore,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    let Ok(item_id) = ItemId::parse(&id) else {
        return console_redirect(Alert::InvalidInput);
    };
    let confirmation = Confirmation::from_form(form.confirm.as_deref());

    match state
        .console()
        .delete_item(&auth.credential, &auth.store_id, &item_id, confirmation)
        .await
    {
        Ok(Some(bentos)) => {
            add_breadcrumb("console", "Deleted bento", &[("item_id", item_id.as_str())]);
            let draft = match current_draft(&session).await {
                Some(draft) if draft.item_id == item_id => {
                    discard_draft(&session).await;
                    None
                }
                other => other,
            };
            let store = state.catalog().store_profile(&auth.store_id).await;
            render(&context(&auth), store, bentos, draft, Some(Alert::Deleted)).into_response()
        }
        Ok(None) => Redirect::to("/console").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Bento delete failed");
            console_redirect(e.alert(Alert::DeleteFailed))
        }
    }
}
