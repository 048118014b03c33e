//! Catalog domain types.
//!
//! These are validated domain objects, separate from the backend's wire
//! shapes (see `backend::types`).

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use bento_core::{ItemId, Quantity, StoreId};

/// Where a bento's picture comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageRef {
    /// Directly displayable URL.
    Url(String),
    /// Object name in the image service that must be resolved to a URL.
    File(String),
    /// No image at all.
    Missing,
}

/// A sellable bento belonging to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bento {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub image: ImageRef,
    pub quantity: Quantity,
}

impl Bento {
    /// Whether the bento can currently be ordered.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.quantity.is_available()
    }
}

/// A store's public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreProfile {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub description: String,
}

impl StoreProfile {
    /// A blank profile for a store that has never saved one.
    #[must_use]
    pub fn blank(id: StoreId) -> Self {
        Self {
            id,
            name: String::new(),
            address: String::new(),
            phone: String::new(),
            description: String::new(),
        }
    }
}

/// The console's locally edited copy of the selected bento.
///
/// A session holds at most one draft; selecting another bento replaces it,
/// and saving either commits it or discards it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BentoDraft {
    pub item_id: ItemId,
    pub name: String,
    pub description: String,
    pub quantity: Quantity,
    /// Image shown in the editor before a new upload replaces it.
    pub image_url: String,
}

/// A freshly uploaded image, ready to send to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Base64-encoded file contents.
    pub base64: String,
    /// MIME type reported by the browser.
    pub content_type: String,
}

impl ImageUpload {
    /// Encode an uploaded file, or `None` if nothing was uploaded.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], content_type: Option<&str>) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        Some(Self {
            base64: STANDARD.encode(bytes),
            content_type: content_type
                .filter(|ct| !ct.is_empty())
                .unwrap_or("application/octet-stream")
                .to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_image_upload_encodes_base64() {
        let upload = ImageUpload::from_bytes(b"bento", Some("image/png")).unwrap();
        assert_eq!(upload.base64, "YmVudG8=");
        assert_eq!(upload.content_type, "image/png");
    }

    #[test]
    fn test_empty_upload_is_none() {
        assert!(ImageUpload::from_bytes(b"", Some("image/png")).is_none());
    }

    #[test]
    fn test_missing_content_type_defaults() {
        let upload = ImageUpload::from_bytes(b"x", None).unwrap();
        assert_eq!(upload.content_type, "application/octet-stream");
    }

    #[test]
    fn test_availability_follows_quantity() {
        let mut bento = Bento {
            id: ItemId::parse("1").unwrap(),
            name: "Pork Bento".to_string(),
            description: String::new(),
            image: ImageRef::Missing,
            quantity: Quantity::new(1),
        };
        assert!(bento.is_available());
        bento.quantity = Quantity::ZERO;
        assert!(!bento.is_available());
    }
}
