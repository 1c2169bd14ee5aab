//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and chat front ends independently.

use serde::{Deserialize, Serialize};

use crate::domain::{DictionaryEntry, Reply};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  Message {
    #[serde(rename = "userId")]
    user_id: i64,
    #[serde(default)]
    text: String,
  },
  QuizAnswer {
    #[serde(rename = "userId")]
    user_id: i64,
    option: usize,
  },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  Reply {
    #[serde(flatten)]
    reply: Reply,
  },
  Error {
    message: String,
  },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct MessageIn {
  #[serde(rename = "userId")]
  pub user_id: i64,
  #[serde(default)]
  pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct QuizAnswerIn {
  #[serde(rename = "userId")]
  pub user_id: i64,
  pub option: usize,
}

/// Body of the clear route and query of the stats/export routes.
#[derive(Debug, Deserialize)]
pub struct UserIn {
  #[serde(rename = "userId")]
  pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DictionaryQuery {
  #[serde(rename = "userId")]
  pub user_id: i64,
  pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct DictionaryOut {
  pub entries: Vec<DictionaryEntry>,
  pub total: usize,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
  pub generator: bool,
}
