//! Helpers shared by unit tests.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc
)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Value, json};

use bento_core::SubjectId;

use crate::config::{
    BackendConfig, ChatConfig, DEFAULT_IMAGE_PLACEHOLDER_URL, IdentityConfig, StorefrontConfig,
};
use crate::models::BearerCredential;

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Build an unsigned JWT carrying `claims`.
pub fn fake_id_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    format!("{header}.{payload}.sig")
}

pub fn credential(sub: &str) -> BearerCredential {
    BearerCredential::from_subject(&SubjectId::parse(sub).unwrap())
}

/// Configuration pointing at a fake backend, with no identity provider.
pub fn config(api_base_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        api: BackendConfig {
            base_url: api_base_url.to_string(),
            image_placeholder_url: DEFAULT_IMAGE_PLACEHOLDER_URL.to_string(),
            store_cache_ttl_secs: 60,
        },
        identity: IdentityConfig::default(),
        chat: ChatConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fake catalog backend
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Debug, Default)]
pub struct FakeState {
    /// Items as raw backend JSON, each carrying a `storeId`.
    pub items: Vec<Value>,
    pub stores: Vec<Value>,
    /// Filename to URL; unknown filenames answer 404.
    pub images: HashMap<String, String>,
    /// `(userId, itemId)` pairs.
    pub favorites: HashSet<(String, String)>,
    pub fail_list: bool,
    pub fail_writes: bool,
    pub fail_store_update: bool,
    pub requests: Vec<RecordedRequest>,
}

/// In-memory stand-in for the catalog backend.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn router(&self) -> Router {
        Router::new().fallback(handle).with_state(self.clone())
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.with(|s| s.requests.clone())
    }

    pub fn count(&self, path: &str) -> usize {
        self.with(|s| s.requests.iter().filter(|r| r.path == path).count())
    }
}

fn str_field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn upsert_item(state: &mut FakeState, body: &Value) {
    let store_id = str_field(body, "storeId").to_string();
    let item_id = str_field(body, "itemId").to_string();

    let mut item = json!({
        "storeId": store_id,
        "id": item_id,
        "name": body["name"],
        "description": body["description"],
        "quantity": body["quantity"],
    });

    let existing = state
        .items
        .iter()
        .position(|i| str_field(i, "id") == item_id && str_field(i, "storeId") == store_id);

    if body.get("image").is_some() {
        let filename = format!("{item_id}.jpg");
        state
            .images
            .insert(filename.clone(), format!("https://cdn.test/{filename}"));
        item["filename"] = json!(filename);
    } else if let Some(index) = existing {
        for key in ["image", "filename"] {
            if let Some(value) = state.items[index].get(key) {
                item[key] = value.clone();
            }
        }
    }

    match existing {
        Some(index) => state.items[index] = item,
        None => state.items.push(item),
    }
}

fn upsert_store(state: &mut FakeState, body: &Value) {
    let store = body.clone();
    let store_id = str_field(body, "storeId");
    match state
        .stores
        .iter()
        .position(|s| str_field(s, "storeId") == store_id)
    {
        Some(index) => state.stores[index] = store,
        None => state.stores.push(store),
    }
}

async fn handle(
    State(fake): State<FakeBackend>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let mut state = fake.state.lock().unwrap();
    state.requests.push(RecordedRequest {
        path: uri.path().to_string(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: body.clone(),
    });

    let is_write = matches!(
        uri.path(),
        "/items/create" | "/items/update" | "/items/delete" | "/stores/update" | "/stores/set"
    );
    if is_write && state.fail_writes {
        return (StatusCode::INTERNAL_SERVER_ERROR, "write failed").into_response();
    }

    match uri.path() {
        "/items/list" if state.fail_list => {
            (StatusCode::INTERNAL_SERVER_ERROR, "list failed").into_response()
        }
        "/items/list" => {
            let store_id = str_field(&body, "storeId");
            let items: Vec<Value> = state
                .items
                .iter()
                .filter(|i| str_field(i, "storeId") == store_id)
                .cloned()
                .collect();
            Json(json!({ "items": items })).into_response()
        }
        "/stores" => Json(json!({ "stores": state.stores })).into_response(),
        "/images/url" => match state.images.get(str_field(&body, "filename")) {
            Some(url) => Json(json!({ "url": url })).into_response(),
            None => (StatusCode::NOT_FOUND, "no such image").into_response(),
        },
        "/items/create" | "/items/update" => {
            upsert_item(&mut state, &body);
            Json(json!({ "ok": true })).into_response()
        }
        "/items/delete" => {
            let store_id = str_field(&body, "storeId").to_string();
            let item_id = str_field(&body, "itemId").to_string();
            state
                .items
                .retain(|i| !(str_field(i, "id") == item_id && str_field(i, "storeId") == store_id));
            Json(json!({ "ok": true })).into_response()
        }
        "/stores/update" if state.fail_store_update => {
            (StatusCode::NOT_FOUND, "no profile").into_response()
        }
        "/stores/update" | "/stores/set" => {
            upsert_store(&mut state, &body);
            Json(json!({ "ok": true })).into_response()
        }
        "/favorites/get" => {
            let key = (
                str_field(&body, "userId").to_string(),
                str_field(&body, "itemId").to_string(),
            );
            Json(json!({ "favorite": state.favorites.contains(&key) })).into_response()
        }
        "/favorites/set" => {
            let key = (
                str_field(&body, "userId").to_string(),
                str_field(&body, "itemId").to_string(),
            );
            if body["favorite"].as_bool().unwrap_or(false) {
                state.favorites.insert(key);
            } else {
                state.favorites.remove(&key);
            }
            Json(json!({ "ok": true })).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
