//! Consumer favorites.
//!
//! A favorite is an existence-only link between a consumer and a bento. Flags
//! are looked up per card on render and written one at a time.

use std::collections::HashSet;

use futures::future::join_all;
use tracing::instrument;

use bento_core::{ItemId, SubjectId};

use crate::backend::{BackendClient, BackendError};
use crate::models::BearerCredential;

#[derive(Clone)]
pub struct Favorites {
    backend: BackendClient,
}

impl Favorites {
    #[must_use]
    pub const fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Which of `items` the user has favorited.
    ///
    /// Lookups run concurrently. A failed lookup counts as not favorited.
    #[instrument(skip(self, credential, items), fields(count = items.len()))]
    pub async fn flags(
        &self,
        credential: &BearerCredential,
        user_id: &SubjectId,
        items: &[ItemId],
    ) -> HashSet<ItemId> {
        let lookups = items.iter().map(|item_id| async move {
            match self.backend.get_favorite(credential, user_id, item_id).await {
                Ok(true) => Some(item_id.clone()),
                Ok(false) => None,
                Err(e) => {
                    tracing::warn!(error = %e, item_id = %item_id, "Favorite lookup failed");
                    None
                }
            }
        });

        join_all(lookups).await.into_iter().flatten().collect()
    }

    /// Set or unset a favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    pub async fn set(
        &self,
        credential: &BearerCredential,
        user_id: &SubjectId,
        item_id: &ItemId,
        favorite: bool,
    ) -> Result<(), BackendError> {
        self.backend
            .set_favorite(credential, user_id, item_id, favorite)
            .await
    }
}
