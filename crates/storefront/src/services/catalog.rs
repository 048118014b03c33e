//! Catalog synchronization.
//!
//! Fetches a store's bentos (or the store directory) and turns them into
//! display-ready cards with every image resolved. Reads never fail from the
//! caller's point of view: a failed list is empty and a failed image is the
//! placeholder.

use futures::future::join_all;
use tracing::instrument;

use bento_core::{ItemId, Quantity, StoreId};

use crate::backend::BackendClient;
use crate::models::{BearerCredential, Bento, ImageRef, StoreProfile};

/// A bento ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBento {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub quantity: Quantity,
}

impl DisplayBento {
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.quantity.is_available()
    }
}

/// Result of a synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Catalog {
    /// The store directory, when no store was requested.
    Stores(Vec<StoreProfile>),
    /// A store's bentos.
    Items(Vec<DisplayBento>),
}

/// Read-only view of the backend catalog.
#[derive(Clone)]
pub struct CatalogSync {
    backend: BackendClient,
    placeholder_url: String,
}

impl CatalogSync {
    #[must_use]
    pub fn new(backend: BackendClient, placeholder_url: impl Into<String>) -> Self {
        Self {
            backend,
            placeholder_url: placeholder_url.into(),
        }
    }

    /// Synchronize a store's bentos, or the store directory without a store.
    pub async fn sync(
        &self,
        store_id: Option<&StoreId>,
        credential: Option<&BearerCredential>,
    ) -> Catalog {
        match store_id {
            Some(store_id) => Catalog::Items(self.items(store_id, credential).await),
            None => Catalog::Stores(self.stores().await),
        }
    }

    /// Every store in the directory.
    #[instrument(skip(self))]
    pub async fn stores(&self) -> Vec<StoreProfile> {
        match self.backend.list_stores().await {
            Ok(stores) => stores,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch store directory");
                Vec::new()
            }
        }
    }

    /// A single store's profile, blank when the store has never saved one.
    pub async fn store_profile(&self, store_id: &StoreId) -> StoreProfile {
        self.stores()
            .await
            .into_iter()
            .find(|store| &store.id == store_id)
            .unwrap_or_else(|| StoreProfile::blank(store_id.clone()))
    }

    /// A store's bentos with images resolved.
    ///
    /// Image lookups run concurrently and all complete before the list is
    /// returned.
    #[instrument(skip(self, credential), fields(store_id = %store_id))]
    pub async fn items(
        &self,
        store_id: &StoreId,
        credential: Option<&BearerCredential>,
    ) -> Vec<DisplayBento> {
        let bentos = match self.backend.list_items(store_id, credential).await {
            Ok(bentos) => bentos,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch bentos");
                return Vec::new();
            }
        };

        join_all(
            bentos
                .into_iter()
                .map(|bento| self.to_display(bento, credential)),
        )
        .await
    }

    async fn to_display(&self, bento: Bento, credential: Option<&BearerCredential>) -> DisplayBento {
        let image_url = self.resolve_image(&bento.image, credential).await;
        DisplayBento {
            id: bento.id,
            name: bento.name,
            description: bento.description,
            image_url,
            quantity: bento.quantity,
        }
    }

    /// Turn an image reference into a displayable URL.
    pub async fn resolve_image(
        &self,
        image: &ImageRef,
        credential: Option<&BearerCredential>,
    ) -> String {
        match image {
            ImageRef::Url(url) => url.clone(),
            ImageRef::Missing => self.placeholder_url.clone(),
            ImageRef::File(filename) => {
                match self.backend.resolve_image(filename, credential).await {
                    Ok(url) if !url.trim().is_empty() => url,
                    Ok(_) => self.placeholder_url.clone(),
                    Err(e) => {
                        tracing::warn!(error = %e, filename = %filename, "Image resolution failed");
                        self.placeholder_url.clone()
                    }
                }
            }
        }
    }
}
