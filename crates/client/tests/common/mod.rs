//! Shared stub backend for session integration tests.
//!
//! A small axum router standing in for the QuizDeck backend, served from an
//! ephemeral local port. Knobs and counters live in `StubState` so tests can
//! steer the probe endpoint and observe request traffic.

use std::path::Path;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::json;

use quizdeck_client::{BackendClient, Credentials, SessionManager, SessionStore};

/// Mutable knobs and counters shared between the stub and the test body.
pub struct StubState {
    /// HTTP status the probe endpoint answers with.
    pub probe_status: AtomicU16,
    /// Number of probe requests received.
    pub probe_hits: AtomicUsize,
    /// Delay before the probe answers, to hold a validation in flight.
    pub probe_delay_ms: AtomicU64,
    /// Number of registration requests received.
    pub register_hits: AtomicUsize,
}

impl StubState {
    fn new() -> Self {
        Self {
            probe_status: AtomicU16::new(200),
            probe_hits: AtomicUsize::new(0),
            probe_delay_ms: AtomicU64::new(0),
            register_hits: AtomicUsize::new(0),
        }
    }
}

/// Install a tracing subscriber once for the whole test binary, so client
/// log output lands in the captured test writer. `RUST_LOG` overrides the
/// default filter.
fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "quizdeck_client=debug".into()),
            )
            .with_test_writer()
            .init();
    });
}

/// Serve the stub backend on an ephemeral port; returns its base URL and the
/// shared state.
pub async fn spawn_backend() -> (String, Arc<StubState>) {
    init_tracing();
    let state = Arc::new(StubState::new());

    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/questions", get(probe))
        .route("/users/{id}", put(update_user))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

/// Manager plus a handle on its store, over a session directory under `dir`.
pub fn manager_at(base_url: &str, dir: &Path) -> (SessionManager, SessionStore) {
    let store = SessionStore::new(dir.join("session"));
    let manager = SessionManager::with_parts(BackendClient::new(base_url), store.clone());
    (manager, store)
}

/// Credentials the stub accepts, answering with Ana the teacher.
pub fn ana_credentials() -> Credentials {
    Credentials {
        email: "ana@example.com".to_string(),
        password: "secret".to_string(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn login(Json(body): Json<serde_json::Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if body["password"].as_str() != Some("secret") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Wrong password"})),
        )
            .into_response();
    }

    // Special account whose login response carries no token
    if email == "tokenless@example.com" {
        return Json(json!({
            "id": 3,
            "email": email,
            "userName": "Ghost",
            "role": "STUDENT",
        }))
        .into_response();
    }

    Json(json!({
        "token": "t1",
        "id": 1,
        "email": email,
        "userName": "Ana",
        "role": "TEACHER",
    }))
    .into_response()
}

async fn register(
    State(state): State<Arc<StubState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.register_hits.fetch_add(1, Ordering::SeqCst);
    if body["email"].as_str() == Some("taken@example.com") {
        return (
            StatusCode::CONFLICT,
            Json(json!({"message": "Email already taken"})),
        )
            .into_response();
    }
    Json(json!({"message": "Account created"})).into_response()
}

async fn probe(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.probe_hits.fetch_add(1, Ordering::SeqCst);

    let delay = state.probe_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    if bearer_token(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let status = StatusCode::from_u16(state.probe_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::OK);
    (status, Json(json!([]))).into_response()
}

async fn update_user(
    UrlPath(id): UrlPath<i64>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if bearer_token(&headers).is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Missing token"})),
        )
            .into_response();
    }

    let mut user_name = String::new();
    let mut email = String::new();
    let mut image = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        match field.name() {
            Some("username") => user_name = field.text().await.unwrap(),
            Some("email") => email = field.text().await.unwrap(),
            Some("image") => {
                let file_name = field.file_name().unwrap_or("profile").to_string();
                // Consume the bytes like the real handler would
                let _ = field.bytes().await.unwrap();
                image = Some(format!("/uploads/{}", file_name));
            }
            _ => {}
        }
    }

    Json(json!({
        "id": id,
        "email": email,
        "userName": user_name,
        "role": "TEACHER",
        "image": image,
    }))
    .into_response()
}
