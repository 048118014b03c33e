//! Catalog, store and favorites backend client.
//!
//! # Architecture
//!
//! - The backend is source of truth - the storefront keeps no local copy
//! - JSON over HTTP, `POST` for everything except the store directory
//! - Authenticated calls go through [`BackendClient::authenticated`], which
//!   attaches `Authorization: Bearer <subject>`
//! - The public store directory is cached in memory via `moka`; console
//!   writes to a store profile invalidate it
//!
//! # Example
//!
//! ```rust,ignore
//! let client = BackendClient::new(&config.api);
//!
//! let stores = client.list_stores().await?;
//! let bentos = client.list_items(&stores[0].id, None).await?;
//! ```

mod cache;
mod conversions;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use bento_core::{ItemId, StoreId, SubjectId};

use crate::config::BackendConfig;
use crate::models::{BearerCredential, Bento, StoreProfile};

use cache::{CacheKey, CacheValue};
use conversions::{convert_bento, convert_store, extract_list};
use types::{
    FavoriteQuery, FavoriteResponse, FavoriteWrite, ImageUrlRequest, ImageUrlResponse, ItemDelete,
    ItemWrite, ListItemsRequest, StoreWrite, WireBento, WireStore,
};

/// Backend endpoint paths, relative to the configured base URL.
pub mod paths {
    pub const LIST_ITEMS: &str = "/items/list";
    pub const LIST_STORES: &str = "/stores";
    pub const IMAGE_URL: &str = "/images/url";
    pub const CREATE_ITEM: &str = "/items/create";
    pub const UPDATE_ITEM: &str = "/items/update";
    pub const DELETE_ITEM: &str = "/items/delete";
    pub const UPDATE_STORE: &str = "/stores/update";
    pub const SET_STORE: &str = "/stores/set";
    pub const GET_FAVORITE: &str = "/favorites/get";
    pub const SET_FAVORITE: &str = "/favorites/set";
}

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Client for the catalog backend.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(config.store_cache_ttl_secs))
            .build();

        Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.trim_end_matches('/').to_string(),
                cache,
            }),
        }
    }

    /// Build a request, attaching the bearer credential when there is one.
    ///
    /// Every backend call goes through here so the credential is derived in
    /// exactly one place.
    pub fn authenticated(
        &self,
        method: Method,
        path: &str,
        credential: Option<&BearerCredential>,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        let request = self.inner.client.request(method, url);
        match credential {
            Some(credential) => request.bearer_auth(credential.as_str()),
            None => request,
        }
    }

    /// Send a request and parse its JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let text = self.send_raw(request).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Send a request, failing on non-success status, and return the body.
    async fn send_raw(&self, request: reqwest::RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        Ok(text)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        credential: Option<&BearerCredential>,
        body: &B,
    ) -> Result<String, BackendError> {
        let request = self.authenticated(Method::POST, path, credential).json(body);
        self.send_raw(request).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// List a store's bentos.
    ///
    /// Records the backend sends without an ID or name are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    #[instrument(skip(self, credential), fields(store_id = %store_id))]
    pub async fn list_items(
        &self,
        store_id: &StoreId,
        credential: Option<&BearerCredential>,
    ) -> Result<Vec<Bento>, BackendError> {
        let body = ListItemsRequest {
            store_id: store_id.as_str(),
        };
        let text = self.post_json(paths::LIST_ITEMS, credential, &body).await?;
        let value: serde_json::Value = serde_json::from_str(&text)?;

        Ok(extract_list::<WireBento>(value, "items")
            .into_iter()
            .filter_map(convert_bento)
            .collect())
    }

    /// List every store, served from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    #[instrument(skip(self))]
    pub async fn list_stores(&self) -> Result<Vec<StoreProfile>, BackendError> {
        if let Some(CacheValue::Stores(stores)) =
            self.inner.cache.get(&CacheKey::StoreDirectory).await
        {
            tracing::debug!("Store directory cache hit");
            return Ok(stores);
        }

        let request = self.authenticated(Method::GET, paths::LIST_STORES, None);
        let value: serde_json::Value = self.send(request).await?;
        let stores: Vec<StoreProfile> = extract_list::<WireStore>(value, "stores")
            .into_iter()
            .filter_map(convert_store)
            .collect();

        self.inner
            .cache
            .insert(CacheKey::StoreDirectory, CacheValue::Stores(stores.clone()))
            .await;

        Ok(stores)
    }

    /// Resolve an image filename to a displayable URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body has no URL.
    #[instrument(skip(self, credential))]
    pub async fn resolve_image(
        &self,
        filename: &str,
        credential: Option<&BearerCredential>,
    ) -> Result<String, BackendError> {
        let request = self
            .authenticated(Method::POST, paths::IMAGE_URL, credential)
            .json(&ImageUrlRequest { filename });
        let response: ImageUrlResponse = self.send(request).await?;
        Ok(response.into_url())
    }

    /// Whether a user has favorited a bento.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    pub async fn get_favorite(
        &self,
        credential: &BearerCredential,
        user_id: &SubjectId,
        item_id: &ItemId,
    ) -> Result<bool, BackendError> {
        let request = self
            .authenticated(Method::POST, paths::GET_FAVORITE, Some(credential))
            .json(&FavoriteQuery {
                user_id: user_id.as_str(),
                item_id: item_id.as_str(),
            });
        let response: FavoriteResponse = self.send(request).await?;
        Ok(response.favorite)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Set or unset a favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credential))]
    pub async fn set_favorite(
        &self,
        credential: &BearerCredential,
        user_id: &SubjectId,
        item_id: &ItemId,
        favorite: bool,
    ) -> Result<(), BackendError> {
        let body = FavoriteWrite {
            user_id: user_id.as_str(),
            item_id: item_id.as_str(),
            favorite,
        };
        self.post_json(paths::SET_FAVORITE, Some(credential), &body)
            .await?;
        Ok(())
    }

    /// Create a bento.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credential, item), fields(item_id = %item.item_id))]
    pub async fn create_item(
        &self,
        credential: &BearerCredential,
        item: &ItemWrite,
    ) -> Result<(), BackendError> {
        self.post_json(paths::CREATE_ITEM, Some(credential), item)
            .await?;
        Ok(())
    }

    /// Update a bento.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credential, item), fields(item_id = %item.item_id))]
    pub async fn update_item(
        &self,
        credential: &BearerCredential,
        item: &ItemWrite,
    ) -> Result<(), BackendError> {
        self.post_json(paths::UPDATE_ITEM, Some(credential), item)
            .await?;
        Ok(())
    }

    /// Delete a bento.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credential))]
    pub async fn delete_item(
        &self,
        credential: &BearerCredential,
        store_id: &StoreId,
        item_id: &ItemId,
    ) -> Result<(), BackendError> {
        let body = ItemDelete {
            store_id: store_id.as_str(),
            item_id: item_id.as_str(),
        };
        self.post_json(paths::DELETE_ITEM, Some(credential), &body)
            .await?;
        Ok(())
    }

    /// Save a store profile.
    ///
    /// Tries the update endpoint first and falls back to the set endpoint,
    /// which creates the profile when the store has none yet. The store
    /// directory cache is invalidated either way.
    ///
    /// # Errors
    ///
    /// Returns the set endpoint's error if both calls fail.
    #[instrument(skip(self, credential, profile), fields(store_id = %profile.id))]
    pub async fn save_store(
        &self,
        credential: &BearerCredential,
        profile: &StoreProfile,
    ) -> Result<(), BackendError> {
        let body = StoreWrite {
            store_id: profile.id.as_str(),
            name: &profile.name,
            address: &profile.address,
            phone: &profile.phone,
            description: &profile.description,
        };

        let result = match self
            .post_json(paths::UPDATE_STORE, Some(credential), &body)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Store update failed, trying set");
                self.post_json(paths::SET_STORE, Some(credential), &body)
                    .await
                    .map(|_| ())
            }
        };

        self.inner.cache.invalidate(&CacheKey::StoreDirectory).await;
        result
    }
}
