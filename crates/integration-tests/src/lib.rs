//! End-to-end tests for the bento storefront.
//!
//! Each test starts the real storefront router on an ephemeral port, wired to
//! an in-process stand-in for every external service it talks to: the
//! catalog API, the identity provider's token endpoint and the chat bot.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bento-integration-tests
//! ```
//!
//! # Logging in
//!
//! The fake token endpoint treats the authorization code as the subject, so
//! `ctx.login("store", "s1")` produces a store owner session for store `s1`.

#![allow(clippy::missing_panics_doc, clippy::must_use_candidate)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use reqwest::{Client, redirect::Policy};
use serde_json::{Value, json};

use bento_storefront::config::{
    BackendConfig, ChatConfig, DEFAULT_IMAGE_PLACEHOLDER_URL, IdentityConfig, IdentityPoolConfig,
    StorefrontConfig,
};
use bento_storefront::state::AppState;

// ============================================================================
// Fake external services
// ============================================================================

/// State of the fake catalog API, identity provider and chat bot.
#[derive(Debug, Default)]
pub struct ServiceState {
    /// Items as raw API JSON, each with `storeId` and `id`.
    pub items: Vec<Value>,
    /// Store profiles as raw API JSON, each with `storeId`.
    pub stores: Vec<Value>,
    /// Image filename to public URL.
    pub images: HashMap<String, String>,
    /// `(userId, itemId)` pairs.
    pub favorites: HashSet<(String, String)>,
    /// Reject every write with a 500.
    pub fail_writes: bool,
    /// Paths of every call received, in order.
    pub calls: Vec<String>,
    /// Bodies of every write received, in order.
    pub writes: Vec<(String, Value)>,
}

/// Shared handle to the fake services.
#[derive(Debug, Clone, Default)]
pub struct FakeServices {
    state: Arc<Mutex<ServiceState>>,
}

impl FakeServices {
    /// Lock the state for inspection or seeding.
    pub fn state(&self) -> MutexGuard<'_, ServiceState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Add a store profile.
    pub fn add_store(&self, store_id: &str, name: &str) {
        self.state()
            .stores
            .push(json!({ "storeId": store_id, "name": name }));
    }

    /// Add an item with a stored image.
    pub fn add_item(&self, store_id: &str, item_id: &str, name: &str, quantity: u32) {
        let filename = format!("{item_id}.jpg");
        let mut state = self.state();
        state
            .images
            .insert(filename.clone(), format!("https://cdn.bento.test/{filename}"));
        state.items.push(json!({
            "storeId": store_id,
            "id": item_id,
            "name": name,
            "description": format!("{name} of the day"),
            "filename": filename,
            "quantity": quantity,
        }));
    }

    /// Number of calls received on `path`.
    pub fn calls_to(&self, path: &str) -> usize {
        self.state().calls.iter().filter(|p| *p == path).count()
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/items/list", post(list_items))
            .route("/stores", get(list_stores))
            .route("/images/url", post(image_url))
            .route("/items/create", post(create_item))
            .route("/items/update", post(update_item))
            .route("/items/delete", post(delete_item))
            .route("/stores/update", post(update_store))
            .route("/stores/set", post(set_store))
            .route("/favorites/get", post(get_favorite))
            .route("/favorites/set", post(set_favorite))
            .route("/oauth2/token", post(token))
            .route("/bot", post(bot))
            .with_state(self.clone())
    }
}

fn field<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn is_bearer(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer "))
}

/// Record a write and decide whether it may proceed.
fn accept_write(state: &mut ServiceState, path: &str, headers: &HeaderMap, body: &Value) -> Option<Response> {
    state.calls.push(path.to_string());
    state.writes.push((path.to_string(), body.clone()));
    if !is_bearer(headers) {
        return Some(StatusCode::UNAUTHORIZED.into_response());
    }
    if state.fail_writes {
        return Some((StatusCode::INTERNAL_SERVER_ERROR, "write failed").into_response());
    }
    None
}

async fn list_items(State(fake): State<FakeServices>, Json(body): Json<Value>) -> Response {
    let mut state = fake.state();
    state.calls.push("/items/list".to_string());
    let store_id = field(&body, "storeId");
    let items: Vec<&Value> = state
        .items
        .iter()
        .filter(|i| field(i, "storeId") == store_id)
        .collect();
    // API gateway envelope with a JSON-encoded body.
    let encoded = json!({ "items": items }).to_string();
    Json(json!({ "statusCode": 200, "body": encoded })).into_response()
}

async fn list_stores(State(fake): State<FakeServices>) -> Response {
    let mut state = fake.state();
    state.calls.push("/stores".to_string());
    Json(json!(state.stores)).into_response()
}

async fn image_url(State(fake): State<FakeServices>, Json(body): Json<Value>) -> Response {
    let mut state = fake.state();
    state.calls.push("/images/url".to_string());
    match state.images.get(field(&body, "filename")) {
        Some(url) => Json(json!({ "url": url })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_item(
    State(fake): State<FakeServices>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    write_item(&fake, "/items/create", &headers, body)
}

async fn update_item(
    State(fake): State<FakeServices>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    write_item(&fake, "/items/update", &headers, body)
}

fn write_item(fake: &FakeServices, path: &str, headers: &HeaderMap, body: Value) -> Response {
    let mut state = fake.state();
    if let Some(rejection) = accept_write(&mut state, path, headers, &body) {
        return rejection;
    }

    let store_id = field(&body, "storeId").to_string();
    let item_id = field(&body, "itemId").to_string();
    let mut item = json!({
        "storeId": store_id,
        "id": item_id,
        "name": body.get("name"),
        "description": body.get("description"),
        "quantity": body.get("quantity"),
    });

    let existing = state
        .items
        .iter()
        .position(|i| field(i, "id") == item_id && field(i, "storeId") == store_id);

    let previous_file = existing
        .and_then(|index| state.items.get(index))
        .and_then(|i| i.get("filename").cloned());
    if body.get("image").is_some() {
        let filename = format!("{item_id}-upload.jpg");
        state
            .images
            .insert(filename.clone(), format!("https://cdn.bento.test/{filename}"));
        item["filename"] = json!(filename);
    } else if let Some(file) = previous_file {
        item["filename"] = file;
    }

    match existing.and_then(|index| state.items.get_mut(index)) {
        Some(slot) => *slot = item,
        None => state.items.push(item),
    }
    Json(json!({ "ok": true })).into_response()
}

async fn delete_item(
    State(fake): State<FakeServices>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = fake.state();
    if let Some(rejection) = accept_write(&mut state, "/items/delete", &headers, &body) {
        return rejection;
    }
    let store_id = field(&body, "storeId").to_string();
    let item_id = field(&body, "itemId").to_string();
    state
        .items
        .retain(|i| !(field(i, "id") == item_id && field(i, "storeId") == store_id));
    Json(json!({ "ok": true })).into_response()
}

/// Updates only existing profiles; the storefront falls back to `set`.
async fn update_store(
    State(fake): State<FakeServices>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = fake.state();
    if let Some(rejection) = accept_write(&mut state, "/stores/update", &headers, &body) {
        return rejection;
    }
    let store_id = field(&body, "storeId").to_string();
    match state
        .stores
        .iter_mut()
        .find(|s| field(s, "storeId") == store_id)
    {
        Some(store) => {
            *store = body;
            Json(json!({ "ok": true })).into_response()
        }
        None => (StatusCode::NOT_FOUND, "no such store").into_response(),
    }
}

async fn set_store(
    State(fake): State<FakeServices>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = fake.state();
    if let Some(rejection) = accept_write(&mut state, "/stores/set", &headers, &body) {
        return rejection;
    }
    let store_id = field(&body, "storeId").to_string();
    state.stores.retain(|s| field(s, "storeId") != store_id);
    state.stores.push(body);
    Json(json!({ "ok": true })).into_response()
}

async fn get_favorite(State(fake): State<FakeServices>, Json(body): Json<Value>) -> Response {
    let mut state = fake.state();
    state.calls.push("/favorites/get".to_string());
    let key = (
        field(&body, "userId").to_string(),
        field(&body, "itemId").to_string(),
    );
    Json(json!({ "favorite": state.favorites.contains(&key) })).into_response()
}

async fn set_favorite(
    State(fake): State<FakeServices>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = fake.state();
    if let Some(rejection) = accept_write(&mut state, "/favorites/set", &headers, &body) {
        return rejection;
    }
    let key = (
        field(&body, "userId").to_string(),
        field(&body, "itemId").to_string(),
    );
    if body.get("favorite").and_then(Value::as_bool).unwrap_or(false) {
        state.favorites.insert(key);
    } else {
        state.favorites.remove(&key);
    }
    Json(json!({ "ok": true })).into_response()
}

/// Token endpoint: the authorization code is the subject. `denied` fails.
/// Authorization code for which the token endpoint issues an undecodable ID token.
pub const GARBLED_TOKEN_CODE: &str = "garbled";

async fn token(Form(params): Form<HashMap<String, String>>) -> Response {
    let code = params.get("code").map(String::as_str).unwrap_or_default();
    if code.is_empty() || code == "denied" {
        return (StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant"}"#).into_response();
    }
    if code == GARBLED_TOKEN_CODE {
        return Json(json!({ "id_token": "not-a-jwt", "token_type": "Bearer" })).into_response();
    }

    let claims = json!({
        "sub": code,
        "email": format!("{code}@bento.test"),
        "cognito:username": code,
    });
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    Json(json!({
        "id_token": format!("{header}.{payload}.sig"),
        "access_token": format!("access-{code}"),
        "token_type": "Bearer",
    }))
    .into_response()
}

async fn bot(Json(body): Json<Value>) -> Response {
    let message = field(&body, "message");
    Json(json!({ "statusCode": 200, "body": format!("You said: {message}") })).into_response()
}

// ============================================================================
// Test context
// ============================================================================

/// A running storefront plus its fake services.
pub struct TestContext {
    pub base_url: String,
    pub client: Client,
    pub services: FakeServices,
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Test server failed");
    });
    addr
}

fn pool(prefix: &'static str, domain: &str, client_id: &str, redirect_uri: String) -> IdentityPoolConfig {
    IdentityPoolConfig {
        env_prefix: prefix,
        domain: Some(domain.to_string()),
        client_id: Some(client_id.to_string()),
        client_secret: None,
        redirect_uri: Some(redirect_uri),
    }
}

impl TestContext {
    /// Start a storefront against empty fake services.
    pub async fn start() -> Self {
        let services = FakeServices::default();
        let services_url = format!("http://{}", serve(services.router()).await);

        // Bind first so the callback URLs can name the real port.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind storefront listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let base_url = format!("http://{addr}");

        let config = StorefrontConfig {
            host: addr.ip(),
            port: addr.port(),
            base_url: base_url.clone(),
            api: BackendConfig {
                base_url: services_url.clone(),
                image_placeholder_url: DEFAULT_IMAGE_PLACEHOLDER_URL.to_string(),
                store_cache_ttl_secs: 60,
            },
            identity: IdentityConfig {
                consumer: pool(
                    "COGNITO",
                    &services_url,
                    "consumer-client",
                    format!("{base_url}/auth/callback"),
                ),
                store: pool(
                    "STORE_COGNITO",
                    &services_url,
                    "store-client",
                    format!("{base_url}/auth/callback/store"),
                ),
                logout_uri: Some(format!("{base_url}/")),
            },
            chat: ChatConfig {
                endpoint: Some(format!("{services_url}/bot")),
                history_limit: 6,
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };

        let app = bento_storefront::app(AppState::new(config), false);
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Storefront failed");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            client,
            services,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    /// GET a page and return its HTML.
    pub async fn page(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), 200, "GET {path}");
        response.text().await.expect("Body was not text")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("POST failed")
    }

    /// Run the hosted-UI login round trip for `principal` as `sub`.
    ///
    /// Returns the callback response.
    pub async fn login(&self, principal: &str, sub: &str) -> reqwest::Response {
        let response = self.get(&format!("/auth/login/{principal}")).await;
        assert_eq!(response.status(), 303, "login redirect");
        let authorize = reqwest::Url::parse(location(&response)).expect("Bad authorize URL");
        let state = authorize
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .expect("Authorize URL has no state");

        let callback = if principal == "store" {
            "/auth/callback/store"
        } else {
            "/auth/callback"
        };
        self.get(&format!("{callback}?code={sub}&state={state}")).await
    }
}

/// The `Location` header of a redirect.
pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION.as_str())
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Text fields for a bento form.
pub fn bento_form(name: &str, description: &str, quantity: &str) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("name", name.to_string())
        .text("description", description.to_string())
        .text("quantity", quantity.to_string())
}
