//! Conversions from backend wire shapes to domain types.

use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

use bento_core::{ItemId, Quantity, StoreId};

use super::types::{WireBento, WireId, WireStore};
use crate::models::{Bento, ImageRef, StoreProfile};

/// Maximum depth of `body`/list-key unwrapping.
const MAX_ENVELOPE_DEPTH: usize = 4;

/// Pull the list out of a response body.
///
/// Accepts a bare array, an object carrying the list under `key`, or a
/// gateway envelope whose `body` holds either of those (possibly as a JSON
/// string). Anything else is an empty list. Elements that do not match `T`
/// are skipped.
pub(super) fn extract_list<T: DeserializeOwned>(value: Value, key: &str) -> Vec<T> {
    let Some(items) = unwrap_envelope(value, key, MAX_ENVELOPE_DEPTH) else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed list element");
                None
            }
        })
        .collect()
}

fn unwrap_envelope(value: Value, key: &str, depth: usize) -> Option<Vec<Value>> {
    if depth == 0 {
        return None;
    }

    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            if let Some(inner) = map.remove(key) {
                return unwrap_envelope(inner, key, depth - 1);
            }
            match map.remove("body")? {
                Value::String(raw) => {
                    let inner = serde_json::from_str(&raw).ok()?;
                    unwrap_envelope(inner, key, depth - 1)
                }
                inner => unwrap_envelope(inner, key, depth - 1),
            }
        }
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn wire_id(value: Option<WireId>) -> Option<String> {
    non_blank(value.map(WireId::into_string))
}

/// Clamp a wire quantity into `0..=u32::MAX`, truncating fractions.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_quantity(number: &Number) -> u32 {
    if let Some(count) = number.as_u64() {
        return u32::try_from(count).unwrap_or(u32::MAX);
    }
    if number.is_i64() {
        return 0;
    }
    // Float-to-int `as` saturates and maps NaN to zero.
    number.as_f64().map_or(0, |count| count.max(0.0) as u32)
}

/// Convert a wire bento, dropping records without an ID or name.
pub(super) fn convert_bento(wire: WireBento) -> Option<Bento> {
    let id = wire_id(wire.id)
        .or_else(|| wire_id(wire.item_id))
        .and_then(|raw| ItemId::parse(&raw).ok())?;
    let name = non_blank(wire.name)?;

    let image = match (non_blank(wire.image), non_blank(wire.filename)) {
        (Some(url), _) => ImageRef::Url(url),
        (None, Some(file)) => ImageRef::File(file),
        (None, None) => ImageRef::Missing,
    };

    let quantity = wire
        .quantity
        .as_ref()
        .map(|number| Quantity::new(clamp_quantity(number)))
        .or_else(|| wire.available.map(Quantity::from_available))
        .unwrap_or(Quantity::ZERO);

    Some(Bento {
        id,
        name,
        description: wire.description.unwrap_or_default(),
        image,
        quantity,
    })
}

/// Convert a wire store, dropping records without an ID.
pub(super) fn convert_store(wire: WireStore) -> Option<StoreProfile> {
    let id = wire_id(wire.store_id)
        .or_else(|| wire_id(wire.id))
        .and_then(|raw| StoreId::parse(&raw).ok())?;

    Some(StoreProfile {
        id,
        name: wire.name.unwrap_or_default(),
        address: wire.address.unwrap_or_default(),
        phone: wire.phone.unwrap_or_default(),
        description: wire.description.unwrap_or_default(),
    })
}
