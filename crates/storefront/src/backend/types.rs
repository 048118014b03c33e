//! Wire types for the catalog backend.
//!
//! Response types are lenient: every field is optional and unknown fields are
//! ignored. Conversions into domain types live in `conversions`.

use serde::{Deserialize, Serialize};
use serde_json::Number;

// ─────────────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────────────

/// An identifier the backend sends either as a string or as a number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(Number),
}

impl WireId {
    pub fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

/// A bento as returned by the backend.
///
/// Older backend revisions send `available` instead of `quantity`, and some
/// endpoints key items by `itemId` rather than `id`. Quantities may arrive
/// negative (oversold) or as floats.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBento {
    pub id: Option<WireId>,
    pub item_id: Option<WireId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub filename: Option<String>,
    pub quantity: Option<Number>,
    pub available: Option<bool>,
}

/// A store profile as returned by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStore {
    pub store_id: Option<WireId>,
    pub id: Option<WireId>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
}

/// Response of the image resolution endpoint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ImageUrlResponse {
    Object {
        #[serde(alias = "imageUrl")]
        url: String,
    },
    Bare(String),
}

impl ImageUrlResponse {
    pub fn into_url(self) -> String {
        match self {
            Self::Object { url } | Self::Bare(url) => url,
        }
    }
}

/// Response of the favorite lookup endpoint.
#[derive(Debug, Deserialize)]
pub struct FavoriteResponse {
    #[serde(alias = "isFavorite", default)]
    pub favorite: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Body of the item listing request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsRequest<'a> {
    pub store_id: &'a str,
}

/// Body of the image resolution request.
#[derive(Debug, Serialize)]
pub struct ImageUrlRequest<'a> {
    pub filename: &'a str,
}

/// Body of the item create/update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemWrite {
    pub store_id: String,
    pub item_id: String,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    /// Base64-encoded image, only when a new image was uploaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Body of the item delete request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDelete<'a> {
    pub store_id: &'a str,
    pub item_id: &'a str,
}

/// Body of the store profile update/set requests.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreWrite<'a> {
    pub store_id: &'a str,
    pub name: &'a str,
    pub address: &'a str,
    pub phone: &'a str,
    pub description: &'a str,
}

/// Body of the favorite lookup request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteQuery<'a> {
    pub user_id: &'a str,
    pub item_id: &'a str,
}

/// Body of the favorite set/unset request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteWrite<'a> {
    pub user_id: &'a str,
    pub item_id: &'a str,
    pub favorite: bool,
}
