//! In-process notes server double for integration tests.
//!
//! Behaves like the real backend closely enough for the client: login and
//! register hand out tokens, note routes demand a valid bearer token, and
//! deleting a missing note is a 404 with a JSON message.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};

use notes_client::app::NotesApp;
use notes_client::config::ClientConfig;
use notes_client::models::Note;
use notes_client::session::SessionStore;

pub const EMAIL: &str = "user@example.com";
pub const PASSWORD: &str = "correct";
pub const TOKEN: &str = "abc";
/// Cookie the server sets alongside a successful login.
pub const SERVER_COOKIE: &str = "sid=s3cret";

#[derive(Default)]
pub struct ServerState {
    pub notes: Vec<Note>,
    pub users: HashMap<String, String>,
    /// Every request seen, as (method, path, authorization, cookie).
    pub requests: Vec<(String, String, Option<String>, Option<String>)>,
    /// Raw bodies received on note creation.
    pub created_bodies: Vec<Value>,
    pub register_bodies: Vec<Value>,
    /// Use `_id` instead of `id` for notes, like a document store.
    pub mongo_ids: bool,
    /// Return tokenless auth responses.
    pub omit_token: bool,
    /// Status used when login credentials are wrong.
    pub login_failure_status: Option<StatusCode>,
}

pub type Shared = Arc<Mutex<ServerState>>;

pub struct TestServer {
    pub url: String,
    pub state: Shared,
}

impl TestServer {
    /// Start a server with the default user and no notes.
    pub async fn start() -> Self {
        let mut state = ServerState::default();
        state.users.insert(EMAIL.to_string(), PASSWORD.to_string());
        Self::start_with(state).await
    }

    pub async fn start_with(state: ServerState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::with_api_url(&self.url)
    }

    /// An app over a fresh in-memory session store.
    pub fn app(&self) -> NotesApp {
        NotesApp::new(&self.config(), SessionStore::in_memory()).expect("Failed to build app")
    }

    pub fn seed(&self, notes: Vec<Note>) {
        self.state.lock().unwrap().notes = notes;
    }

    pub fn requests(&self) -> Vec<(String, String, Option<String>, Option<String>)> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|(m, p, _, _)| m == method && p == path)
            .count()
    }
}

pub fn note(id: &str, title: &str, content: &str) -> Note {
    Note {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/notes", get(list_notes).post(create_note))
        .route("/auth/notes/{id}", delete(delete_note))
        .route("/broken", get(broken))
        .route("/empty", get(empty))
        .route("/slow", get(slow))
        .with_state(state)
}

fn record(state: &Shared, method: &str, path: &str, headers: &HeaderMap) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
    };
    state.lock().unwrap().requests.push((
        method.to_string(),
        path.to_string(),
        header("authorization"),
        header("cookie"),
    ));
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|h| h == format!("Bearer {}", TOKEN))
}

fn denied() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Invalid token" })),
    )
        .into_response()
}

fn note_json(note: &Note, mongo_ids: bool) -> Value {
    let key = if mongo_ids { "_id" } else { "id" };
    let mut map = serde_json::Map::new();
    map.insert(key.to_string(), json!(note.id));
    map.insert("title".to_string(), json!(note.title));
    map.insert("content".to_string(), json!(note.content));
    Value::Object(map)
}

fn auth_reply(omit_token: bool) -> Response {
    let body = if omit_token {
        json!({ "message": "ok" })
    } else {
        json!({ "token": TOKEN })
    };
    (
        [(SET_COOKIE, format!("{}; Path=/", SERVER_COOKIE))],
        Json(body),
    )
        .into_response()
}

async fn login(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    record(&state, "POST", "/auth/login", &headers);
    let s = state.lock().unwrap();
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match s.users.get(email) {
        Some(expected) if expected == password => auth_reply(s.omit_token),
        _ => (
            s.login_failure_status.unwrap_or(StatusCode::BAD_REQUEST),
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response(),
    }
}

async fn register(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "POST", "/auth/register", &headers);
    let mut s = state.lock().unwrap();
    s.register_bodies.push(body.clone());
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    if s.users.contains_key(&email) {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "User already exists" })),
        )
            .into_response();
    }
    s.users.insert(email, password);
    auth_reply(s.omit_token)
}

async fn list_notes(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/auth/notes", &headers);
    if !authorized(&headers) {
        return denied();
    }
    let s = state.lock().unwrap();
    let notes: Vec<Value> = s.notes.iter().map(|n| note_json(n, s.mongo_ids)).collect();
    Json(notes).into_response()
}

async fn create_note(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record(&state, "POST", "/auth/notes", &headers);
    if !authorized(&headers) {
        return denied();
    }
    let mut s = state.lock().unwrap();
    s.created_bodies.push(body.clone());
    let note = Note {
        id: uuid::Uuid::new_v4().simple().to_string(),
        title: body["title"].as_str().unwrap_or_default().to_string(),
        content: body["content"].as_str().unwrap_or_default().to_string(),
    };
    let reply = note_json(&note, s.mongo_ids);
    s.notes.push(note);
    (StatusCode::CREATED, Json(reply)).into_response()
}

async fn delete_note(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    record(&state, "DELETE", &format!("/auth/notes/{}", id), &headers);
    if !authorized(&headers) {
        return denied();
    }
    let mut s = state.lock().unwrap();
    let before = s.notes.len();
    s.notes.retain(|n| n.id != id);
    if s.notes.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Note not found" })),
        )
            .into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn broken(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/broken", &headers);
    (StatusCode::INTERNAL_SERVER_ERROR, "<html>upstream down</html>").into_response()
}

async fn empty(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/empty", &headers);
    StatusCode::NO_CONTENT.into_response()
}

async fn slow(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "GET", "/slow", &headers);
    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
    Json(json!([])).into_response()
}
