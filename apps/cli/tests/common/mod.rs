//! In-process fake of the Mochi API for integration tests.
//!
//! Serves the deck, card and attachment endpoints on a random local port,
//! checks basic auth and paginates listings with offset bookmarks. Like the
//! real service it hands back a bookmark on every page, so clients must stop
//! on an empty page.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use serde_json::{json, Value};

pub const API_KEY: &str = "test-api-key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub card_id: String,
    pub file_name: String,
    pub field: String,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Default)]
pub struct FakeState {
    pub decks: Vec<Value>,
    pub cards: Vec<Value>,
    pub uploads: Vec<Upload>,
    pub deck_list_requests: usize,
    /// Most documents returned per page, whatever the client asks for.
    pub page_cap: Option<usize>,
    /// Ignore `parent-id` / `deck-id` filters like a lenient server would.
    pub ignore_filters: bool,
    pub next_id: u32,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeMochi {
    pub url: String,
    pub state: Shared,
}

impl FakeMochi {
    pub async fn start() -> Self {
        Self::start_with(FakeState::default()).await
    }

    pub async fn start_with(state: FakeState) -> Self {
        let state: Shared = Arc::new(Mutex::new(state));
        let app = Router::new()
            .route("/decks/", get(list_decks).post(create_deck))
            .route("/decks/:id", get(get_deck))
            .route("/cards/", get(list_cards).post(create_card))
            .route("/cards/:id", post(update_card))
            .route("/cards/:id/attachments/:file", post(upload_attachment))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake Mochi listener");
        let addr = listener.local_addr().expect("Listener has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake Mochi server failed");
        });

        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    pub fn seed_deck(&self, id: &str, name: &str, parent: Option<&str>) {
        let mut deck = json!({ "id": id, "name": name });
        if let Some(parent) = parent {
            deck["parent-id"] = json!(parent);
        }
        self.state.lock().unwrap().decks.push(deck);
    }

    pub fn decks(&self) -> Vec<Value> {
        self.state.lock().unwrap().decks.clone()
    }

    pub fn cards(&self) -> Vec<Value> {
        self.state.lock().unwrap().cards.clone()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn deck_list_requests(&self) -> usize {
        self.state.lock().unwrap().deck_list_requests
    }

    pub fn deck_named(&self, name: &str) -> Option<Value> {
        self.decks().into_iter().find(|d| d["name"] == name)
    }
}

fn authorize(headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(format!("{API_KEY}:"))
    );
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

fn page(state: &FakeState, docs: Vec<Value>, query: &HashMap<String, String>) -> Value {
    let limit = query
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(10);
    let limit = state.page_cap.map_or(limit, |cap| limit.min(cap));
    let start = query
        .get("bookmark")
        .and_then(|b| b.parse::<usize>().ok())
        .unwrap_or(0)
        .min(docs.len());
    let end = (start + limit).min(docs.len());

    json!({
        "docs": docs[start..end].to_vec(),
        "bookmark": end.to_string(),
    })
}

async fn list_decks(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&headers)?;
    let mut state = state.lock().unwrap();
    state.deck_list_requests += 1;

    let parent = query.get("parent-id").filter(|_| !state.ignore_filters);
    let docs: Vec<Value> = state
        .decks
        .iter()
        .filter(|d| parent.map_or(true, |p| d["parent-id"] == p.as_str()))
        .cloned()
        .collect();
    Ok(Json(page(&state, docs, &query)))
}

async fn get_deck(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&headers)?;
    let state = state.lock().unwrap();
    state
        .decks
        .iter()
        .find(|d| d["id"] == id.as_str())
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_deck(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&headers)?;
    let mut state = state.lock().unwrap();
    let id = state.next_id("deck");

    let mut deck = json!({ "id": id, "name": body["name"], "sort": body["sort"] });
    if !body["parent-id"].is_null() {
        deck["parent-id"] = body["parent-id"].clone();
    }
    state.decks.push(deck.clone());
    Ok(Json(deck))
}

async fn list_cards(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&headers)?;
    let state = state.lock().unwrap();

    let deck = query.get("deck-id").filter(|_| !state.ignore_filters);
    let docs: Vec<Value> = state
        .cards
        .iter()
        .filter(|c| deck.map_or(true, |d| c["deck-id"] == d.as_str()))
        .cloned()
        .collect();
    Ok(Json(page(&state, docs, &query)))
}

async fn create_card(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&headers)?;
    if body["template-id"].as_str().is_none() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut state = state.lock().unwrap();
    let id = state.next_id("card");

    let card = json!({
        "id": id,
        "deck-id": body["deck-id"],
        "content": body["content"],
        "template-id": body["template-id"],
        "fields": body["fields"],
    });
    state.cards.push(card.clone());
    Ok(Json(card))
}

async fn update_card(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    authorize(&headers)?;
    let mut state = state.lock().unwrap();
    let card = state
        .cards
        .iter_mut()
        .find(|c| c["id"] == id.as_str())
        .ok_or(StatusCode::NOT_FOUND)?;

    if let Some(fields) = body.get("fields") {
        card["fields"] = fields.clone();
    }
    if let Some(content) = body.get("content") {
        card["content"] = content.clone();
    }
    Ok(Json(card.clone()))
}

async fn upload_attachment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((card_id, file_name)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<StatusCode, StatusCode> {
    authorize(&headers)?;
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        uploads.push(Upload {
            card_id: card_id.clone(),
            file_name: file_name.clone(),
            field: name,
            content_type,
            size: bytes.len(),
        });
    }

    let mut state = state.lock().unwrap();
    if !state.cards.iter().any(|c| c["id"] == card_id.as_str()) {
        return Err(StatusCode::NOT_FOUND);
    }
    state.uploads.extend(uploads);
    Ok(StatusCode::OK)
}
