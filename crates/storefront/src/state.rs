//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::BackendClient;
use crate::config::StorefrontConfig;
use crate::services::{CatalogSync, ChatService, Console, Favorites, IdentityClient};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Every outbound client is built once here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    identity: IdentityClient,
    catalog: CatalogSync,
    console: Console,
    favorites: Favorites,
    chat: ChatService,
}

impl AppState {
    /// Create the application state and its clients from configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let backend = BackendClient::new(&config.api);
        let catalog = CatalogSync::new(backend.clone(), config.api.image_placeholder_url.clone());
        let console = Console::new(backend.clone(), catalog.clone());
        let favorites = Favorites::new(backend);
        let identity = IdentityClient::new(&config.identity);
        let chat = ChatService::new(&config.chat);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                identity,
                catalog,
                console,
                favorites,
                chat,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the catalog synchronizer.
    #[must_use]
    pub fn catalog(&self) -> &CatalogSync {
        &self.inner.catalog
    }

    /// Get a reference to the console write service.
    #[must_use]
    pub fn console(&self) -> &Console {
        &self.inner.console
    }

    /// Get a reference to the favorites service.
    #[must_use]
    pub fn favorites(&self) -> &Favorites {
        &self.inner.favorites
    }

    /// Get a reference to the chat service.
    #[must_use]
    pub fn chat(&self) -> &ChatService {
        &self.inner.chat
    }
}
