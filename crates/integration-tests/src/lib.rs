//! In-process mock of the marketplace REST backend.
//!
//! [`MockBackend`] serves the envelope format the console expects from a
//! random local port. It keeps just enough state to exercise login, token
//! rejection, artwork reads and writes, banner reordering, and order stats,
//! and it counts every request so tests can assert on network traffic.
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = MockBackend::start().await;
//! let console = backend.console();
//! console.login(ADMIN_EMAIL, &password(ADMIN_PASSWORD)).await?;
//! assert_eq!(backend.hits("POST /auth/login"), 1);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::{Method, StatusCode, Uri, header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::Mutex;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use miraki_console::{Console, ConsoleConfig, CredentialStore, QueryConfig};

pub const ADMIN_EMAIL: &str = "admin@miraki-art.com";
pub const ADMIN_PASSWORD: &str = "gallery-admin";
pub const STAFF_EMAIL: &str = "staff@miraki-art.com";
pub const STAFF_PASSWORD: &str = "gallery-staff";

/// Wrap a test password.
#[must_use]
pub fn password(raw: &str) -> SecretString {
    SecretString::from(raw.to_string())
}

// =============================================================================
// Backend State
// =============================================================================

struct Account {
    password: &'static str,
    user: Value,
}

#[derive(Default)]
struct MockState {
    accounts: HashMap<&'static str, Account>,
    tokens: Mutex<HashMap<String, String>>,
    next_token: AtomicU64,
    hits: Mutex<HashMap<String, usize>>,
    fail_logout: AtomicBool,
    reject_reorder: AtomicBool,
    read_delay: Mutex<Duration>,
    artworks: Mutex<Vec<Value>>,
    banners: Mutex<Vec<Value>>,
    reorders: Mutex<Vec<Vec<String>>>,
}

impl MockState {
    fn seeded() -> Self {
        let mut accounts = HashMap::new();
        accounts.insert(
            ADMIN_EMAIL,
            Account {
                password: ADMIN_PASSWORD,
                user: user_json("u-admin", "Asha Admin", ADMIN_EMAIL, "admin"),
            },
        );
        accounts.insert(
            STAFF_EMAIL,
            Account {
                password: STAFF_PASSWORD,
                user: user_json("u-staff", "Sam Staff", STAFF_EMAIL, "staff"),
            },
        );

        Self {
            accounts,
            artworks: Mutex::new(vec![
                artwork_json("aw-1", "Monsoon over Kochi", 45_000.0),
                artwork_json("aw-2", "Dusk at Hampi", 32_500.5),
            ]),
            banners: Mutex::new(vec![
                banner_json("b1", "Summer Show", 1),
                banner_json("b2", "New Artists", 2),
                banner_json("b3", "Sculpture Week", 3),
            ]),
            ..Self::default()
        }
    }

    fn record(&self, method: &Method, uri: &Uri) {
        let path = uri.path().trim_start_matches("/api/v1");
        *self.hits.lock().entry(format!("{method} {path}")).or_default() += 1;
    }

    async fn delay(&self) {
        let delay = *self.read_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn user_json(id: &str, name: &str, email: &str, role: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "email": email,
        "role": role,
        "permissions": [],
    })
}

fn artwork_json(id: &str, title: &str, price: f64) -> Value {
    json!({
        "_id": id,
        "title": title,
        "artist": "Meera Nair",
        "artistId": "ar-1",
        "year": 2023,
        "medium": "Oil on canvas",
        "image": format!("https://cdn.miraki-art.com/{id}.jpg"),
        "location": { "lat": 9.93, "lng": 76.26, "area": "Fort Kochi" },
        "price": price,
        "category": "painting",
        "description": "Commissioned for the biennale.",
        "featured": false,
        "forSale": true,
    })
}

fn banner_json(id: &str, title: &str, priority: i32) -> Value {
    json!({
        "_id": id,
        "title": title,
        "image": format!("https://cdn.miraki-art.com/banners/{id}.jpg"),
        "active": true,
        "priority": priority,
    })
}

// =============================================================================
// Envelope Helpers
// =============================================================================

fn ok(data: Value) -> Response {
    Json(json!({ "success": true, "data": data })).into_response()
}

fn page(items: Vec<Value>) -> Response {
    let total = items.len();
    ok(json!({
        "items": items,
        "pagination": { "total": total, "page": 1, "limit": 20, "pages": 1 },
    }))
}

fn fail(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": { "code": code, "message": message },
        })),
    )
        .into_response()
}

// =============================================================================
// Authentication
// =============================================================================

/// Extractor that requires a bearer token issued by this backend. Records
/// the request before checking the token.
struct Authorized;

impl FromRequestParts<Arc<MockState>> for Authorized {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<MockState>,
    ) -> Result<Self, Self::Rejection> {
        state.record(&parts.method, &parts.uri);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match token {
            Some(token) if state.tokens.lock().contains_key(token) => Ok(Self),
            _ => Err(fail(
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Token is invalid or expired",
            )),
        }
    }
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<LoginBody>) -> Response {
    state.record(&Method::POST, &Uri::from_static("/auth/login"));

    let Some(account) = state.accounts.get(body.email.as_str()) else {
        return fail(
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "Invalid email or password",
        );
    };
    if account.password != body.password {
        return fail(
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "Invalid email or password",
        );
    }

    let n = state.next_token.fetch_add(1, Ordering::Relaxed);
    let token = format!("tok-{n}");
    state.tokens.lock().insert(token.clone(), body.email);
    ok(json!({ "token": token, "user": account.user }))
}

async fn logout(_auth: Authorized, State(state): State<Arc<MockState>>) -> Response {
    if state.fail_logout.load(Ordering::Relaxed) {
        return fail(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
            "Session store unavailable",
        );
    }
    ok(Value::Null)
}

async fn validate(_auth: Authorized) -> Response {
    ok(json!({ "valid": true }))
}

// =============================================================================
// Artworks
// =============================================================================

async fn list_artworks(_auth: Authorized, State(state): State<Arc<MockState>>) -> Response {
    state.delay().await;
    let items = state.artworks.lock().clone();
    page(items)
}

async fn get_artwork(
    _auth: Authorized,
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
) -> Response {
    state.delay().await;
    let found = state
        .artworks
        .lock()
        .iter()
        .find(|a| a["_id"] == id.as_str())
        .cloned();
    found.map_or_else(
        || fail(StatusCode::NOT_FOUND, "NOT_FOUND", "Artwork not found"),
        ok,
    )
}

async fn update_artwork(
    _auth: Authorized,
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    Json(draft): Json<Value>,
) -> Response {
    let mut artworks = state.artworks.lock();
    let Some(artwork) = artworks.iter_mut().find(|a| a["_id"] == id.as_str()) else {
        return fail(StatusCode::NOT_FOUND, "NOT_FOUND", "Artwork not found");
    };
    if let (Some(target), Some(fields)) = (artwork.as_object_mut(), draft.as_object()) {
        for (k, v) in fields {
            target.insert(k.clone(), v.clone());
        }
    }
    ok(artwork.clone())
}

// =============================================================================
// Banners
// =============================================================================

async fn list_banners(_auth: Authorized, State(state): State<Arc<MockState>>) -> Response {
    let items = state.banners.lock().clone();
    page(items)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderBody {
    ordered_ids: Vec<String>,
}

async fn reorder_banners(
    _auth: Authorized,
    State(state): State<Arc<MockState>>,
    Json(body): Json<ReorderBody>,
) -> Response {
    state.reorders.lock().push(body.ordered_ids.clone());
    if state.reject_reorder.load(Ordering::Relaxed) {
        return fail(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
            "Reorder failed",
        );
    }

    let mut banners = state.banners.lock();
    let mut reordered = Vec::with_capacity(banners.len());
    for (position, id) in body.ordered_ids.iter().enumerate() {
        if let Some(mut banner) = banners.iter().find(|b| b["_id"] == id.as_str()).cloned() {
            banner["priority"] = json!(position + 1);
            reordered.push(banner);
        }
    }
    banners.clone_from(&reordered);
    ok(Value::Array(reordered))
}

// =============================================================================
// Orders
// =============================================================================

async fn order_stats(_auth: Authorized) -> Response {
    ok(json!({
        "totalRevenue": 77_500.5,
        "totalOrders": 2,
        "revenueTrend": 12.5,
        "ordersTrend": -3.0,
        "salesByMonth": [{ "month": "Jan", "sales": 77_500.5 }],
        "ordersByStatus": { "delivered": 1, "pending": 1 },
    }))
}

// =============================================================================
// Server
// =============================================================================

/// A running mock backend. The server stops when this is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Bind a random local port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let state = Arc::new(MockState::seeded());

        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/logout", post(logout))
            .route("/auth/validate", get(validate))
            .route("/artworks", get(list_artworks))
            .route("/artworks/{id}", get(get_artwork).put(update_artwork))
            .route("/banners", get(list_banners))
            .route("/banners/reorder", post(reorder_banners))
            .route("/orders/stats", get(order_stats));
        let app = Router::new()
            .nest("/api/v1", api)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Console configuration pointing at this backend, with fast retries.
    ///
    /// # Panics
    ///
    /// Panics if the local address does not form a valid URL.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn config(&self) -> ConsoleConfig {
        ConsoleConfig {
            api_base_url: url::Url::parse(&format!("http://{}/api/v1", self.addr))
                .expect("mock backend URL"),
            request_timeout: Duration::from_secs(5),
            query: QueryConfig {
                retry: 0,
                retry_delay: Duration::from_millis(10),
                ..QueryConfig::default()
            },
            ..ConsoleConfig::default()
        }
    }

    /// A console over this backend with an in-memory credential store.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn console(&self) -> Console {
        self.console_with_store(CredentialStore::in_memory())
    }

    /// A console over this backend using `store` for credentials.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn console_with_store(&self, store: CredentialStore) -> Console {
        Console::new(&self.config(), store).expect("console")
    }

    /// Number of requests received for `"METHOD /path"`, e.g. `"GET /artworks"`.
    #[must_use]
    pub fn hits(&self, route: &str) -> usize {
        self.state.hits.lock().get(route).copied().unwrap_or(0)
    }

    /// Invalidate every issued token, as if they all expired server-side.
    pub fn revoke_tokens(&self) {
        self.state.tokens.lock().clear();
    }

    /// Make `/auth/logout` answer with a 500.
    pub fn fail_logout(&self, fail: bool) {
        self.state.fail_logout.store(fail, Ordering::Relaxed);
    }

    /// Make `/banners/reorder` answer with a 500.
    pub fn reject_reorder(&self, reject: bool) {
        self.state.reject_reorder.store(reject, Ordering::Relaxed);
    }

    /// Delay every artwork read, so concurrent reads overlap.
    pub fn set_read_delay(&self, delay: Duration) {
        *self.state.read_delay.lock() = delay;
    }

    /// Every `orderedIds` body received by `/banners/reorder`, oldest first.
    #[must_use]
    pub fn reorders(&self) -> Vec<Vec<String>> {
        self.state.reorders.lock().clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}
