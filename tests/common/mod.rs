#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use literary_assistant::config::{AgentConfig, Settings};
use literary_assistant::llm::LlmClient;
use literary_assistant::state::AppState;
use literary_assistant::store::WordStore;

pub const ADMIN_ID: i64 = 1000;

pub fn settings() -> Settings {
  Settings { database_path: ":memory:".into(), admin_user_id: Some(ADMIN_ID) }
}

/// In-memory state without a generator.
pub fn offline_state() -> AppState {
  state_with(None, AgentConfig::default())
}

pub fn state_with(llm: Option<LlmClient>, config: AgentConfig) -> AppState {
  let store = WordStore::open_in_memory().expect("in-memory store");
  AppState::from_parts(store, llm, config, settings())
}

struct MockState {
  status: StatusCode,
  content: String,
  hits: Arc<AtomicUsize>,
  last_body: Arc<std::sync::Mutex<Option<Value>>>,
}

/// Local chat-completions endpoint answering every request with one fixed response.
pub struct MockLlm {
  pub base_url: String,
  hits: Arc<AtomicUsize>,
  last_body: Arc<std::sync::Mutex<Option<Value>>>,
}

impl MockLlm {
  pub fn hits(&self) -> usize {
    self.hits.load(Ordering::SeqCst)
  }

  pub fn last_body(&self) -> Option<Value> {
    self.last_body.lock().expect("mock lock").clone()
  }

  pub fn client(&self) -> LlmClient {
    LlmClient::new("test-key", self.base_url.clone(), "test/model").expect("client")
  }
}

async fn chat_completions(State(mock): State<Arc<MockState>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
  mock.hits.fetch_add(1, Ordering::SeqCst);
  *mock.last_body.lock().expect("mock lock") = Some(body);
  if mock.status.is_success() {
    (mock.status, Json(json!({ "choices": [{ "message": { "content": mock.content } }] })))
  } else {
    (mock.status, Json(json!({ "error": { "message": "upstream exploded" } })))
  }
}

pub async fn spawn_mock_llm(status: StatusCode, content: &str) -> MockLlm {
  let hits = Arc::new(AtomicUsize::new(0));
  let last_body = Arc::new(std::sync::Mutex::new(None));
  let state = Arc::new(MockState {
    status,
    content: content.to_string(),
    hits: hits.clone(),
    last_body: last_body.clone(),
  });
  let app = Router::new().route("/v1/chat/completions", post(chat_completions)).with_state(state);

  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock");
  let addr = listener.local_addr().expect("mock addr");
  tokio::spawn(async move {
    let _ = axum::serve(listener, app).await;
  });

  MockLlm { base_url: format!("http://{}/v1", addr), hits, last_body }
}
