#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    dead_code,
    missing_docs,
    clippy::expect_used
)]
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Form, Json, Router};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use ministry_platform::oauth2::DEFAULT_SCOPE;
use ministry_platform::{ClientConfig, encode_base64};

pub const CLIENT_ID: &str = "grace-church-api";
pub const CLIENT_SECRET: &str = "s3cr3t-value";
pub const DISPLAY_NAME: &str = "Grace Church";

/// Recorded traffic and failure switches of the mock platform.
#[derive(Debug)]
pub struct PlatformState {
    base_url: String,
    discovery_calls: AtomicUsize,
    token_calls: AtomicUsize,
    api_calls: AtomicUsize,
    authorizations: Mutex<Vec<String>>,
    token_forms: Mutex<Vec<HashMap<String, String>>>,
    queries: Mutex<Vec<HashMap<String, String>>>,
    discovery_failure: Mutex<Option<StatusCode>>,
    token_failure: Mutex<Option<StatusCode>>,
    domain_failure: Mutex<Option<StatusCode>>,
    expires_in: Mutex<Option<u64>>,
}

impl PlatformState {
    fn new(base_url: String) -> Self {
        Self {
            base_url,
            discovery_calls: AtomicUsize::new(0),
            token_calls: AtomicUsize::new(0),
            api_calls: AtomicUsize::new(0),
            authorizations: Mutex::default(),
            token_forms: Mutex::default(),
            queries: Mutex::default(),
            discovery_failure: Mutex::default(),
            token_failure: Mutex::default(),
            domain_failure: Mutex::default(),
            expires_in: Mutex::default(),
        }
    }

    fn failure(slot: &Mutex<Option<StatusCode>>) -> Option<StatusCode> {
        *slot.lock().expect("lock")
    }

    /// Records the bearer header, returns `false` if it is not a token we issued.
    fn check_bearer(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers.get(AUTHORIZATION).and_then(|it| it.to_str().ok()) else {
            return false;
        };
        self.authorizations
            .lock()
            .expect("lock")
            .push(value.to_string());
        value.starts_with("Bearer token-")
    }
}

/// A local HTTP server playing the discovery, token and REST API endpoints.
#[derive(Debug)]
pub struct MockPlatform {
    state: Arc<PlatformState>,
    handle: JoinHandle<()>,
}

impl MockPlatform {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind mock platform")?;
        let addr = listener.local_addr()?;
        let state = Arc::new(PlatformState::new(format!("http://{addr}")));

        let router = Router::new()
            .route("/oauth/.well-known/openid-configuration", get(discovery))
            .route("/oauth/connect/token", post(token))
            .route("/api/domain", get(domain))
            .route("/api/contacts", get(list_contacts).post(create_contact))
            .route("/api/contacts/{id}", delete(delete_contact))
            .route("/api/slow", get(slow))
            .with_state(Arc::clone(&state));

        let handle = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, router).await {
                warn!(?error, "mock platform stopped");
            }
        });
        info!(%addr, "mock platform listening");

        Ok(Self { state, handle })
    }

    pub fn base_url(&self) -> &str {
        &self.state.base_url
    }

    pub fn discovery_url(&self) -> String {
        format!("{}/oauth/.well-known/openid-configuration", self.base_url())
    }

    pub fn service_address(&self) -> String {
        format!("{}/api", self.base_url())
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(
            CLIENT_ID,
            CLIENT_SECRET,
            self.discovery_url(),
            self.service_address(),
        )
        .expect("valid configuration")
    }

    pub fn fail_discovery(&self, status: StatusCode) {
        *self.state.discovery_failure.lock().expect("lock") = Some(status);
    }

    pub fn fail_token(&self, status: StatusCode) {
        *self.state.token_failure.lock().expect("lock") = Some(status);
    }

    pub fn fail_domain(&self, status: StatusCode) {
        *self.state.domain_failure.lock().expect("lock") = Some(status);
    }

    pub fn issue_tokens_expiring_in(&self, seconds: u64) {
        *self.state.expires_in.lock().expect("lock") = Some(seconds);
    }

    pub fn discovery_calls(&self) -> usize {
        self.state.discovery_calls.load(Ordering::SeqCst)
    }

    pub fn token_calls(&self) -> usize {
        self.state.token_calls.load(Ordering::SeqCst)
    }

    pub fn api_calls(&self) -> usize {
        self.state.api_calls.load(Ordering::SeqCst)
    }

    pub fn authorizations(&self) -> Vec<String> {
        self.state.authorizations.lock().expect("lock").clone()
    }

    pub fn token_forms(&self) -> Vec<HashMap<String, String>> {
        self.state.token_forms.lock().expect("lock").clone()
    }

    pub fn queries(&self) -> Vec<HashMap<String, String>> {
        self.state.queries.lock().expect("lock").clone()
    }
}

impl Drop for MockPlatform {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

type SharedState = State<Arc<PlatformState>>;

async fn discovery(State(state): SharedState) -> Response {
    state.discovery_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = PlatformState::failure(&state.discovery_failure) {
        return (status, "discovery unavailable").into_response();
    }

    Json(json!({
        "issuer": format!("{}/oauth", state.base_url),
        "token_endpoint": format!("{}/oauth/connect/token", state.base_url),
        "scopes_supported": [DEFAULT_SCOPE, "openid", "offline_access"],
        "grant_types_supported": ["client_credentials", "authorization_code", "refresh_token"],
        "response_types_supported": ["code", "token"],
    }))
    .into_response()
}

async fn token(
    State(state): SharedState,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let count = state.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
    state.token_forms.lock().expect("lock").push(form);

    if let Some(status) = PlatformState::failure(&state.token_failure) {
        let description = format!("client secret '{CLIENT_SECRET}' is not valid");
        return (
            status,
            Json(json!({ "error": "invalid_client", "error_description": description })),
        )
            .into_response();
    }

    let expected = format!(
        "Basic {}",
        encode_base64(&format!("{CLIENT_ID}:{CLIENT_SECRET}"))
    );
    let actual = headers.get(AUTHORIZATION).and_then(|it| it.to_str().ok());
    if actual != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, "invalid basic authorization").into_response();
    }

    let mut body = json!({
        "token_type": "Bearer",
        "access_token": format!("token-{count}"),
    });
    if let Some(expires_in) = *state.expires_in.lock().expect("lock") {
        body["expires_in"] = json!(expires_in);
    }
    Json(body).into_response()
}

async fn domain(State(state): SharedState, headers: HeaderMap) -> Response {
    if !state.check_bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(status) = PlatformState::failure(&state.domain_failure) {
        return (status, "The user has no security role").into_response();
    }

    Json(json!({
        "DisplayName": DISPLAY_NAME,
        "TimeZoneName": "Eastern Standard Time",
    }))
    .into_response()
}

async fn list_contacts(
    State(state): SharedState,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.api_calls.fetch_add(1, Ordering::SeqCst);
    if !state.check_bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state.queries.lock().expect("lock").push(query);

    Json(json!([
        { "Contact_ID": 1, "Display_Name": "Lovelace, Ada" },
        { "Contact_ID": 2, "Display_Name": "Hopper, Grace" },
    ]))
    .into_response()
}

async fn create_contact(
    State(state): SharedState,
    headers: HeaderMap,
    Json(mut contact): Json<Value>,
) -> Response {
    state.api_calls.fetch_add(1, Ordering::SeqCst);
    if !state.check_bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    contact["Contact_ID"] = json!(3);
    (StatusCode::CREATED, Json(contact)).into_response()
}

async fn delete_contact(
    State(state): SharedState,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Response {
    state.api_calls.fetch_add(1, Ordering::SeqCst);
    if !state.check_bearer(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id > 2 {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    StatusCode::NO_CONTENT.into_response()
}

async fn slow(State(state): SharedState) -> Response {
    state.api_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({})).into_response()
}
