//! In-process stand-in for the back-office API.
//!
//! Access tokens are real HS256 JWTs, so an expired token is rejected the
//! same way the real backend rejects it.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use evadmin_client::{Gateway, MemorySessionStore, NavigationPort, SessionStore, TokenPair};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const SECRET: &str = "evadmin-test-secret";
pub const PASSWORD: &str = "correct horse";
pub const EMAIL: &str = "ops@example.com";
pub const FIRST_REFRESH: &str = "refresh-1";
pub const ROTATED_REFRESH: &str = "refresh-2";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    exp: i64,
}

pub fn access_token(expires_in_secs: i64) -> String {
    let claims = Claims {
        sub: "user-1".to_owned(),
        email: EMAIL.to_owned(),
        exp: chrono::Utc::now().timestamp() + expires_in_secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn expired_pair() -> TokenPair {
    TokenPair::new(access_token(-3600), FIRST_REFRESH)
}

pub fn valid_pair() -> TokenPair {
    TokenPair::new(access_token(3600), FIRST_REFRESH)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Rotates the pair when the known refresh token is presented.
    #[default]
    Issue,
    /// Accepts the known refresh token any number of times and hands it back
    /// unchanged with a fresh access token.
    Reissue,
    /// Answers 401.
    Reject,
    /// Answers 200 with `isSuccess = false`.
    Unsuccessful,
}

#[derive(Default)]
pub struct BackendState {
    pub refresh_calls: AtomicUsize,
    pub protected_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub always_unauthorized: AtomicBool,
    pub refresh_mode: Mutex<RefreshMode>,
    pub request_ids: Mutex<Vec<String>>,
    pub queries: Mutex<Vec<Vec<(String, String)>>>,
}

#[derive(Clone, Default)]
pub struct Backend {
    pub state: Arc<BackendState>,
}

impl Backend {
    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn protected_calls(&self) -> usize {
        self.state.protected_calls.load(Ordering::SeqCst)
    }

    pub fn set_refresh_mode(&self, mode: RefreshMode) {
        *self.state.refresh_mode.lock() = mode;
    }

    pub fn reject_everything(&self) {
        self.state.always_unauthorized.store(true, Ordering::SeqCst);
    }

    pub fn request_ids(&self) -> Vec<String> {
        self.state.request_ids.lock().clone()
    }

    pub fn last_query(&self) -> Vec<(String, String)> {
        self.state.queries.lock().last().cloned().unwrap_or_default()
    }

    pub fn query_count(&self) -> usize {
        self.state.queries.lock().len()
    }

    /// Starts serving on an ephemeral port and returns the API base url.
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/logout", post(logout))
            .route("/api/auth/refresh-token", post(refresh))
            .route("/api/stations", get(stations))
            .route("/api/vehicle", get(vehicles))
            .route("/api/plans/{id}", delete(delete_plan))
            .route("/api/invoices/{id}/pay", post(pay_invoice))
            .route("/api/boom", get(boom))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}/api")
    }

    /// Rejects the call unless it carries a valid bearer token.
    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        self.state.protected_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
            self.state.request_ids.lock().push(id.to_owned());
        }

        let unauthorized = || (StatusCode::UNAUTHORIZED, "token expired").into_response();
        if self.state.always_unauthorized.load(Ordering::SeqCst) {
            return Err(unauthorized());
        }

        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::default(),
        )
        .map(drop)
        .map_err(|_| unauthorized())
    }

    fn record_query(&self, query: Vec<(String, String)>) {
        self.state.queries.lock().push(query);
    }
}

pub fn envelope(data: Value) -> Response {
    Json(json!({
        "isSuccess": true,
        "value": { "code": "200", "message": "OK", "data": data },
        "error": null,
    }))
    .into_response()
}

pub fn failed_envelope(error: &str) -> Response {
    Json(json!({ "isSuccess": false, "value": null, "error": error })).into_response()
}

fn paged(items: Value, page: u32, page_size: u32, total_pages: u32) -> Value {
    json!({
        "items": items,
        "currentPage": page,
        "totalPages": total_pages,
        "pageSize": page_size,
        "totalCount": total_pages * page_size,
        "hasPrevious": page > 1,
        "hasNext": page < total_pages,
    })
}

fn query_u32(query: &[(String, String)], key: &str) -> u32 {
    query
        .iter()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(1)
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(backend): State<Backend>, Json(body): Json<LoginBody>) -> Response {
    backend.state.login_calls.fetch_add(1, Ordering::SeqCst);
    if body.email == EMAIL && body.password == PASSWORD {
        envelope(json!({ "accessToken": access_token(3600), "refreshToken": FIRST_REFRESH }))
    } else {
        (StatusCode::UNAUTHORIZED, "invalid credentials").into_response()
    }
}

async fn logout(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if let Err(response) = backend.authorize(&headers) {
        return response;
    }
    envelope(json!(true))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    refresh_token: String,
}

async fn refresh(State(backend): State<Backend>, Json(body): Json<RefreshBody>) -> Response {
    backend.state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let mode = *backend.state.refresh_mode.lock();
    match mode {
        RefreshMode::Issue if body.refresh_token == FIRST_REFRESH => envelope(json!({
            "accessToken": access_token(3600),
            "refreshToken": ROTATED_REFRESH,
        })),
        RefreshMode::Reissue if body.refresh_token == FIRST_REFRESH => envelope(json!({
            "accessToken": access_token(3600),
            "refreshToken": FIRST_REFRESH,
        })),
        RefreshMode::Issue | RefreshMode::Reissue | RefreshMode::Reject => {
            (StatusCode::UNAUTHORIZED, "refresh token revoked").into_response()
        }
        RefreshMode::Unsuccessful => failed_envelope("refresh token expired"),
    }
}

async fn stations(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    if let Err(response) = backend.authorize(&headers) {
        return response;
    }

    let page = query_u32(&query, "pageNumber");
    let page_size = query_u32(&query, "pageSize");
    backend.record_query(query);

    let items = json!([{
        "id": format!("station-{page}"),
        "name": "Harbour Depot",
        "locationId": "loc-1",
        "status": "Online",
        "installedConnectors": 4,
    }]);
    envelope(paged(items, page, page_size, 3))
}

async fn vehicles(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    if let Err(response) = backend.authorize(&headers) {
        return response;
    }

    let page = query_u32(&query, "page");
    let page_size = query_u32(&query, "pageSize");
    backend.record_query(query);

    let items = json!([{
        "huyPDID": "veh-1",
        "make": "VinFast",
        "model": "VF 8",
        "year": 2024,
        "licensePlate": "51K-123.45",
        "connectorType": "CCS",
    }]);
    Json(paged(items, page, page_size, 1)).into_response()
}

async fn delete_plan(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(response) = backend.authorize(&headers) {
        return response;
    }
    // Only the "disposable" plan can go.
    envelope(json!(id == "disposable"))
}

async fn pay_invoice(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    if let Err(response) = backend.authorize(&headers) {
        return response;
    }
    let paid: f64 = query
        .iter()
        .find(|(k, _)| k == "amountPaid")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or_default();
    backend.record_query(query);

    envelope(json!({
        "id": id,
        "userId": "user-1",
        "sessionId": "sess-1",
        "periodStart": "2025-03-01T00:00:00Z",
        "periodEnd": "2025-03-01T02:00:00Z",
        "status": "Paid",
        "subtotalAmount": 100.0,
        "taxAmount": 10.0,
        "totalAmount": 110.0,
        "amountPaid": paid,
        "amountDue": 110.0 - paid,
        "dueDate": "2025-03-15T00:00:00Z",
        "issuedAt": "2025-03-01T02:00:00Z",
        "createdAt": "2025-03-01T02:00:00Z",
        "updatedAt": null,
    }))
}

async fn boom(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if let Err(response) = backend.authorize(&headers) {
        return response;
    }
    (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response()
}

/// Navigation double that records whether a session was still present at
/// the moment of each redirect.
pub struct RecordingNavigation {
    store: Arc<dyn SessionStore>,
    redirects: AtomicUsize,
    session_at_redirect: Mutex<Vec<bool>>,
}

impl RecordingNavigation {
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }

    pub fn session_at_redirect(&self) -> Vec<bool> {
        self.session_at_redirect.lock().clone()
    }
}

impl NavigationPort for RecordingNavigation {
    fn redirect_to_login(&self) {
        self.session_at_redirect
            .lock()
            .push(self.store.has_session());
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub backend: Backend,
    pub gateway: Gateway,
    pub session: Arc<MemorySessionStore>,
    pub navigation: Arc<RecordingNavigation>,
}

pub async fn harness(tokens: Option<TokenPair>) -> Harness {
    let backend = Backend::default();
    let base_url = backend.start().await;

    let session = Arc::new(match tokens {
        Some(tokens) => MemorySessionStore::with_tokens(tokens),
        None => MemorySessionStore::new(),
    });
    let navigation = Arc::new(RecordingNavigation {
        store: session.clone(),
        redirects: AtomicUsize::new(0),
        session_at_redirect: Mutex::new(Vec::new()),
    });

    let gateway = Gateway::builder()
        .with_session_store(session.clone())
        .with_navigation(navigation.clone())
        .with_base_url(base_url)
        .build()
        .unwrap();

    Harness {
        backend,
        gateway,
        session,
        navigation,
    }
}
