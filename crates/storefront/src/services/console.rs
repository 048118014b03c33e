//! Store owner console.
//!
//! Every write is a single backend request followed by a full re-sync of the
//! store's catalog. Nothing is patched locally: what the console shows after
//! a save is what the backend returns.
//!
//! # Draft
//!
//! Selecting a bento copies it into the session as a [`BentoDraft`]. Saving
//! takes the draft out of the session whether or not the backend accepts it.

use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use bento_core::{ItemId, Quantity, StoreId};

use crate::backend::types::ItemWrite;
use crate::backend::{BackendClient, BackendError};
use crate::models::{
    Alert, BearerCredential, BentoDraft, ImageUpload, StoreProfile, session_keys,
};
use crate::services::catalog::{CatalogSync, DisplayBento};

/// Errors from console operations.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The backend rejected the write.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// A form field failed validation.
    #[error("invalid {0}")]
    Invalid(&'static str),

    /// A save arrived with no matching draft in the session.
    #[error("no bento selected")]
    NoSelection,

    /// The session could not be read or written.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl ConsoleError {
    /// Banner shown for this failure.
    #[must_use]
    pub const fn alert(&self, fallback: Alert) -> Alert {
        match self {
            Self::Invalid(_) => Alert::InvalidInput,
            Self::NoSelection => Alert::NoSelection,
            Self::Backend(_) | Self::Session(_) => fallback,
        }
    }
}

/// Validated bento fields from a console form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BentoInput {
    pub name: String,
    pub description: String,
    pub quantity: Quantity,
}

impl BentoInput {
    /// Validate raw form values.
    ///
    /// # Errors
    ///
    /// Returns `ConsoleError::Invalid` for a blank name or a quantity that is
    /// not a non-negative integer.
    pub fn parse(name: &str, description: &str, quantity: &str) -> Result<Self, ConsoleError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ConsoleError::Invalid("name"));
        }

        let quantity = match quantity.trim() {
            "" => Quantity::ZERO,
            raw => raw
                .parse::<u32>()
                .map(Quantity::new)
                .map_err(|_| ConsoleError::Invalid("quantity"))?,
        };

        Ok(Self {
            name: name.to_string(),
            description: description.trim().to_string(),
            quantity,
        })
    }
}

/// Outcome of the delete confirmation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Cancelled,
}

impl Confirmation {
    /// Only an explicit `yes` confirms.
    #[must_use]
    pub fn from_form(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("yes") => Self::Confirmed,
            _ => Self::Cancelled,
        }
    }
}

fn item_write(
    store_id: &StoreId,
    item_id: &ItemId,
    input: &BentoInput,
    image: Option<ImageUpload>,
) -> ItemWrite {
    let (image, content_type) = match image {
        Some(upload) => (Some(upload.base64), Some(upload.content_type)),
        None => (None, None),
    };
    ItemWrite {
        store_id: store_id.to_string(),
        item_id: item_id.to_string(),
        name: input.name.clone(),
        description: input.description.clone(),
        quantity: input.quantity.count(),
        image,
        content_type,
    }
}

/// Console write operations.
#[derive(Clone)]
pub struct Console {
    backend: BackendClient,
    catalog: CatalogSync,
}

impl Console {
    #[must_use]
    pub const fn new(backend: BackendClient, catalog: CatalogSync) -> Self {
        Self { backend, catalog }
    }

    /// Create a bento, then re-sync.
    ///
    /// A new item ID is generated when none is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    #[instrument(skip(self, credential, input, image), fields(store_id = %store_id))]
    pub async fn create_item(
        &self,
        credential: &BearerCredential,
        store_id: &StoreId,
        item_id: Option<ItemId>,
        input: &BentoInput,
        image: Option<ImageUpload>,
    ) -> Result<Vec<DisplayBento>, ConsoleError> {
        let item_id = match item_id {
            Some(id) => id,
            None => ItemId::parse(&uuid::Uuid::new_v4().to_string())
                .map_err(|_| ConsoleError::Invalid("item id"))?,
        };

        let write = item_write(store_id, &item_id, input, image);
        self.backend.create_item(credential, &write).await?;
        tracing::info!(item_id = %item_id, "Bento created");

        Ok(self.catalog.items(store_id, Some(credential)).await)
    }

    /// Save the session's draft with the submitted fields, then re-sync.
    ///
    /// The draft leaves the session before the write is attempted, so a
    /// failed save discards it.
    ///
    /// # Errors
    ///
    /// Returns `ConsoleError::NoSelection` if the session holds no draft for
    /// `item_id`, or an error if the backend rejects the write.
    #[instrument(skip(self, session, credential, input, image), fields(store_id = %store_id))]
    pub async fn save_draft(
        &self,
        session: &Session,
        credential: &BearerCredential,
        store_id: &StoreId,
        item_id: &ItemId,
        input: &BentoInput,
        image: Option<ImageUpload>,
    ) -> Result<Vec<DisplayBento>, ConsoleError> {
        let draft = take_draft(session, item_id)
            .await?
            .ok_or(ConsoleError::NoSelection)?;

        let write = item_write(store_id, &draft.item_id, input, image);
        self.backend.update_item(credential, &write).await?;
        tracing::info!(item_id = %draft.item_id, "Bento updated");

        Ok(self.catalog.items(store_id, Some(credential)).await)
    }

    /// Delete a bento once confirmed, then re-sync.
    ///
    /// Returns `None` without calling the backend when cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    #[instrument(skip(self, credential), fields(store_id = %store_id))]
    pub async fn delete_item(
        &self,
        credential: &BearerCredential,
        store_id: &StoreId,
        item_id: &ItemId,
        confirmation: Confirmation,
    ) -> Result<Option<Vec<DisplayBento>>, ConsoleError> {
        if confirmation == Confirmation::Cancelled {
            tracing::debug!(item_id = %item_id, "Delete cancelled");
            return Ok(None);
        }

        self.backend
            .delete_item(credential, store_id, item_id)
            .await?;
        tracing::info!(item_id = %item_id, "Bento deleted");

        Ok(Some(self.catalog.items(store_id, Some(credential)).await))
    }

    /// Save the store profile, then re-read it from the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if both the update and set endpoints fail.
    #[instrument(skip(self, credential, profile), fields(store_id = %profile.id))]
    pub async fn save_store(
        &self,
        credential: &BearerCredential,
        profile: &StoreProfile,
    ) -> Result<StoreProfile, ConsoleError> {
        self.backend.save_store(credential, profile).await?;
        tracing::info!("Store profile saved");

        Ok(self.catalog.store_profile(&profile.id).await)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Draft storage
// ─────────────────────────────────────────────────────────────────────────────

/// Copy a bento into the session as the draft, replacing any previous one.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn select_draft(
    session: &Session,
    bento: &DisplayBento,
) -> Result<BentoDraft, tower_sessions::session::Error> {
    let draft = BentoDraft {
        item_id: bento.id.clone(),
        name: bento.name.clone(),
        description: bento.description.clone(),
        quantity: bento.quantity,
        image_url: bento.image_url.clone(),
    };
    session.insert(session_keys::CONSOLE_DRAFT, &draft).await?;
    Ok(draft)
}

/// The current draft, if any.
pub async fn current_draft(session: &Session) -> Option<BentoDraft> {
    match session.get(session_keys::CONSOLE_DRAFT).await {
        Ok(draft) => draft,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable console draft, discarding");
            discard_draft(session).await;
            None
        }
    }
}

/// Remove and return the current draft if it is for `item_id`.
///
/// A draft for another item stays in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn take_draft(
    session: &Session,
    item_id: &ItemId,
) -> Result<Option<BentoDraft>, tower_sessions::session::Error> {
    let draft = session
        .get::<BentoDraft>(session_keys::CONSOLE_DRAFT)
        .await?
        .filter(|draft| &draft.item_id == item_id);
    if draft.is_some() {
        session.remove_value(session_keys::CONSOLE_DRAFT).await?;
    }
    Ok(draft)
}

/// Drop the current draft.
pub async fn discard_draft(session: &Session) {
    if let Err(e) = session
        .remove_value(session_keys::CONSOLE_DRAFT)
        .await
    {
        tracing::warn!(error = %e, "Failed to discard console draft");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::backend::paths;
    use crate::config::BackendConfig;
    use crate::test_support::{FakeBackend, credential, spawn};

    const PLACEHOLDER: &str = "/placeholder.svg";

    async fn console(fake: &FakeBackend) -> (Console, CatalogSync) {
        let base_url = spawn(fake.router()).await;
        let backend = BackendClient::new(&BackendConfig {
            base_url,
            image_placeholder_url: PLACEHOLDER.to_string(),
            store_cache_ttl_secs: 60,
        });
        let catalog = CatalogSync::new(backend.clone(), PLACEHOLDER);
        (Console::new(backend, catalog.clone()), catalog)
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn store() -> StoreId {
        StoreId::parse("s1").unwrap()
    }

    fn input(name: &str, quantity: &str) -> BentoInput {
        BentoInput::parse(name, "", quantity).unwrap()
    }

    fn seeded() -> FakeBackend {
        let fake = FakeBackend::default();
        fake.with(|s| {
            s.items.push(json!({
                "storeId": "s1", "id": "42", "name": "Pork Bento",
                "quantity": 3, "image": "https://img/42.jpg"
            }));
        });
        fake
    }

    #[test]
    fn test_input_validation() {
        assert!(matches!(
            BentoInput::parse("  ", "", "1"),
            Err(ConsoleError::Invalid("name"))
        ));
        assert!(matches!(
            BentoInput::parse("A", "", "-1"),
            Err(ConsoleError::Invalid("quantity"))
        ));
        assert_eq!(input("A", "").quantity, Quantity::ZERO);
        assert_eq!(input(" A ", "7").name, "A");
    }

    #[test]
    fn test_confirmation_requires_yes() {
        assert_eq!(Confirmation::from_form(Some("yes")), Confirmation::Confirmed);
        assert_eq!(Confirmation::from_form(Some("no")), Confirmation::Cancelled);
        assert_eq!(Confirmation::from_form(Some("")), Confirmation::Cancelled);
        assert_eq!(Confirmation::from_form(None), Confirmation::Cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_delete_sends_nothing() {
        let fake = seeded();
        let (console, catalog) = console(&fake).await;
        let item = ItemId::parse("42").unwrap();

        let result = console
            .delete_item(&credential("s1"), &store(), &item, Confirmation::Cancelled)
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(fake.count(paths::DELETE_ITEM), 0);
        assert_eq!(catalog.items(&store(), None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_confirmed_delete_resyncs() {
        let fake = seeded();
        let (console, _) = console(&fake).await;
        let item = ItemId::parse("42").unwrap();

        let items = console
            .delete_item(&credential("s1"), &store(), &item, Confirmation::Confirmed)
            .await
            .unwrap()
            .unwrap();

        assert!(items.is_empty());
        let paths: Vec<_> = fake.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, [paths::DELETE_ITEM, paths::LIST_ITEMS]);
    }

    #[tokio::test]
    async fn test_create_generates_id_and_resyncs() {
        let fake = FakeBackend::default();
        let (console, _) = console(&fake).await;

        let items = console
            .create_item(&credential("s1"), &store(), None, &input("Fish Bento", "2"), None)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Fish Bento");
        let created = &fake.requests()[0];
        assert_eq!(created.authorization.as_deref(), Some("Bearer s1"));
        assert!(uuid::Uuid::parse_str(created.body["itemId"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_save_reflects_backend_not_local_edit() {
        let fake = seeded();
        let (console, catalog) = console(&fake).await;
        let session = session();
        let item = ItemId::parse("42").unwrap();

        let selected = catalog.items(&store(), None).await.remove(0);
        select_draft(&session, &selected).await.unwrap();

        let image = ImageUpload::from_bytes(b"jpeg", Some("image/jpeg"));
        let items = console
            .save_draft(&session, &credential("s1"), &store(), &item, &input("Pork Bento XL", "0"), image)
            .await
            .unwrap();

        // The fake stores uploads as `<id>.jpg` and serves them from its CDN.
        assert_eq!(items[0].name, "Pork Bento XL");
        assert!(!items[0].is_available());
        assert_eq!(items[0].image_url, "https://cdn.test/42.jpg");
        assert!(current_draft(&session).await.is_none());

        let update = &fake.requests()[1];
        assert_eq!(update.path, paths::UPDATE_ITEM);
        assert_eq!(update.body["contentType"], "image/jpeg");
    }

    #[tokio::test]
    async fn test_failed_save_discards_draft() {
        let fake = seeded();
        fake.with(|s| s.fail_writes = true);
        let (console, catalog) = console(&fake).await;
        let session = session();
        let item = ItemId::parse("42").unwrap();

        let selected = catalog.items(&store(), None).await.remove(0);
        select_draft(&session, &selected).await.unwrap();

        let err = console
            .save_draft(&session, &credential("s1"), &store(), &item, &input("Renamed", "1"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ConsoleError::Backend(_)));
        assert_eq!(err.alert(Alert::SaveFailed), Alert::SaveFailed);
        assert!(current_draft(&session).await.is_none());
        assert_eq!(catalog.items(&store(), None).await[0].name, "Pork Bento");
    }

    #[tokio::test]
    async fn test_save_without_draft_is_rejected() {
        let fake = seeded();
        let (console, _) = console(&fake).await;
        let session = session();
        let item = ItemId::parse("42").unwrap();

        let err = console
            .save_draft(&session, &credential("s1"), &store(), &item, &input("A", "1"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ConsoleError::NoSelection));
        assert_eq!(fake.count(paths::UPDATE_ITEM), 0);
    }

    #[tokio::test]
    async fn test_stale_form_keeps_live_draft() {
        let fake = seeded();
        let (console, catalog) = console(&fake).await;
        let session = session();

        let selected = catalog.items(&store(), None).await.remove(0);
        select_draft(&session, &selected).await.unwrap();

        let stale = ItemId::parse("7").unwrap();
        let err = console
            .save_draft(&session, &credential("s1"), &store(), &stale, &input("A", "1"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ConsoleError::NoSelection));
        assert_eq!(fake.count(paths::UPDATE_ITEM), 0);
        assert_eq!(current_draft(&session).await.unwrap().item_id.as_str(), "42");
    }

    #[tokio::test]
    async fn test_selecting_replaces_draft() {
        let session = session();
        let mut bento = DisplayBento {
            id: ItemId::parse("1").unwrap(),
            name: "A".to_string(),
            description: String::new(),
            image_url: PLACEHOLDER.to_string(),
            quantity: Quantity::new(1),
        };
        select_draft(&session, &bento).await.unwrap();
        bento.id = ItemId::parse("2").unwrap();
        select_draft(&session, &bento).await.unwrap();

        assert_eq!(current_draft(&session).await.unwrap().item_id.as_str(), "2");
    }

    #[tokio::test]
    async fn test_save_store_returns_fresh_profile() {
        let fake = FakeBackend::default();
        fake.with(|s| s.fail_store_update = true);
        let (console, catalog) = console(&fake).await;

        // Warm the directory cache before the write.
        assert!(catalog.stores().await.is_empty());

        let mut profile = StoreProfile::blank(store());
        profile.name = "Friendly Time".to_string();
        let saved = console
            .save_store(&credential("s1"), &profile)
            .await
            .unwrap();

        assert_eq!(saved.name, "Friendly Time");
        assert_eq!(fake.count(paths::SET_STORE), 1);
    }
}
