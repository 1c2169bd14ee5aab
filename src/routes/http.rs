//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs the user id and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Query, State},
  http::{header, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument};

use crate::domain::Reply;
use crate::logic::{answer_quiz, clear_dictionary, handle_text};
use crate::protocol::*;
use crate::state::AppState;
use crate::store::Export;

/// Upper bound for `limit` on the dictionary listing.
const MAX_LIST_LIMIT: usize = 1000;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, generator: state.source.has_generator() })
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id, text_len = body.text.len()))]
pub async fn http_post_message(
  State(state): State<Arc<AppState>>,
  Json(body): Json<MessageIn>,
) -> impl IntoResponse {
  let reply = handle_text(&state, body.user_id, &body.text).await;
  info!(target: "literary_assistant", user_id = body.user_id, reply_len = reply.text.len(), has_choices = reply.choices.is_some(), "HTTP message handled");
  Json(reply)
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id, option = body.option))]
pub async fn http_post_quiz_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuizAnswerIn>,
) -> impl IntoResponse {
  Json(answer_quiz(&state, body.user_id, body.option).await)
}

#[instrument(level = "info", skip(state), fields(user_id = q.user_id))]
pub async fn http_get_dictionary(
  State(state): State<Arc<AppState>>,
  Query(q): Query<DictionaryQuery>,
) -> impl IntoResponse {
  let limit = q.limit.unwrap_or(state.config.limits.dictionary_page).min(MAX_LIST_LIMIT);
  let entries = state.store.list(q.user_id, limit);
  let total = state.store.count(q.user_id);
  Json(DictionaryOut { entries, total })
}

/// CSV download; 204 when the user has nothing to export.
#[instrument(level = "info", skip(state), fields(user_id = q.user_id))]
pub async fn http_get_export(
  State(state): State<Arc<AppState>>,
  Query(q): Query<UserIn>,
) -> Response {
  match state.store.export(q.user_id) {
    Export::Empty => StatusCode::NO_CONTENT.into_response(),
    Export::Csv(body) => {
      let disposition = format!("attachment; filename=\"dictionary_{}.csv\"", q.user_id);
      (
        [
          (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
          (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
      )
        .into_response()
    }
  }
}

#[instrument(level = "info", skip(state, body), fields(user_id = body.user_id))]
pub async fn http_post_clear(
  State(state): State<Arc<AppState>>,
  Json(body): Json<UserIn>,
) -> Response {
  match clear_dictionary(&state, body.user_id) {
    Ok(reply) => Json(reply).into_response(),
    Err(e) => {
      tracing::error!(target: "store", user_id = body.user_id, error = %e, "HTTP clear failed");
      (StatusCode::INTERNAL_SERVER_ERROR, Json(Reply::text("❌ Не удалось очистить словарь. Попробуйте позже."))).into_response()
    }
  }
}

#[instrument(level = "info", skip(state), fields(user_id = q.user_id))]
pub async fn http_get_stats(
  State(state): State<Arc<AppState>>,
  Query(q): Query<UserIn>,
) -> Response {
  match state.store.stats(q.user_id) {
    Some(s) => Json(s).into_response(),
    None => StatusCode::NOT_FOUND.into_response(),
  }
}
