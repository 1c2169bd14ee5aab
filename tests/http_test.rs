mod common;

use std::sync::Arc;

use axum::{
  body::{to_bytes, Body},
  http::{header, Request, StatusCode},
  Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::offline_state;
use literary_assistant::routes::build_router;
use literary_assistant::state::AppState;

fn app(state: &AppState) -> Router {
  build_router(Arc::new(state.clone()))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
  let res = app.oneshot(req).await.unwrap();
  let status = res.status();
  let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
  (status, body.to_vec())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

fn get(uri: &str) -> Request<Body> {
  Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_generator_state() {
  let s = offline_state();
  let (status, body) = send(app(&s), get("/api/v1/health")).await;
  assert_eq!(status, StatusCode::OK);
  let v: Value = serde_json::from_slice(&body).unwrap();
  assert_eq!(v, json!({ "ok": true, "generator": false }));
}

#[tokio::test]
async fn message_route_drives_the_conversation() {
  let s = offline_state();

  let (_, body) = send(app(&s), post_json("/api/v1/message", json!({ "userId": 1, "text": "/слово" }))).await;
  let v: Value = serde_json::from_slice(&body).unwrap();
  assert!(v["text"].as_str().unwrap().contains("Введите слово"));

  let (status, body) = send(app(&s), post_json("/api/v1/message", json!({ "userId": 1, "text": "фрак" }))).await;
  assert_eq!(status, StatusCode::OK);
  let v: Value = serde_json::from_slice(&body).unwrap();
  assert!(v["text"].as_str().unwrap().contains("Мужской парадный костюм"));
  assert!(v.get("choices").is_none());
  assert_eq!(s.store.count(1), 1);
}

#[tokio::test]
async fn quiz_answer_route_grades_active_quiz() {
  let s = offline_state();
  send(app(&s), post_json("/api/v1/message", json!({ "userId": 2, "text": "/викторина" }))).await;
  let quiz = s.sessions.active_quiz(2).await.unwrap();

  let req = post_json("/api/v1/quiz/answer", json!({ "userId": 2, "option": quiz.correct_index }));
  let (status, body) = send(app(&s), req).await;
  assert_eq!(status, StatusCode::OK);
  let v: Value = serde_json::from_slice(&body).unwrap();
  assert!(v["text"].as_str().unwrap().contains("Правильно"));
  assert!(s.sessions.active_quiz(2).await.is_none());
}

#[tokio::test]
async fn dictionary_listing_and_export() {
  let s = offline_state();

  let (status, _) = send(app(&s), get("/api/v1/dictionary/export?userId=3")).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  s.store.save(3, "вельми", r#"Очень, "весьма""#);
  s.store.save(3, "дабы", "чтобы");

  let (_, body) = send(app(&s), get("/api/v1/dictionary?userId=3&limit=1")).await;
  let v: Value = serde_json::from_slice(&body).unwrap();
  assert_eq!(v["total"], 2);
  assert_eq!(v["entries"].as_array().unwrap().len(), 1);
  assert_eq!(v["entries"][0]["word"], "дабы");

  let res = app(&s).oneshot(get("/api/v1/dictionary/export?userId=3")).await.unwrap();
  assert_eq!(res.status(), StatusCode::OK);
  assert!(res.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
  let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let mut rdr = csv::Reader::from_reader(body.as_ref());
  let explanations: Vec<String> = rdr.records().map(|r| r.unwrap()[1].to_string()).collect();
  assert!(explanations.contains(&r#"Очень, "весьма""#.to_string()));
}

#[tokio::test]
async fn stats_are_404_until_first_lookup() {
  let s = offline_state();
  let (status, _) = send(app(&s), get("/api/v1/stats?userId=4")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  s.store.save(4, "фрак", "костюм");
  let (status, body) = send(app(&s), get("/api/v1/stats?userId=4")).await;
  assert_eq!(status, StatusCode::OK);
  let v: Value = serde_json::from_slice(&body).unwrap();
  assert_eq!(v["unique_words"], 1);
  assert_eq!(v["total_lookups"], 1);
}

#[tokio::test]
async fn clear_route_empties_dictionary() {
  let s = offline_state();
  s.store.save(5, "фрак", "костюм");
  let (status, body) = send(app(&s), post_json("/api/v1/dictionary/clear", json!({ "userId": 5 }))).await;
  assert_eq!(status, StatusCode::OK);
  let v: Value = serde_json::from_slice(&body).unwrap();
  assert!(v["text"].as_str().unwrap().contains("Удалено слов: 1"));
  assert_eq!(s.store.count(5), 0);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
  let s = offline_state();
  let (status, _) = send(app(&s), post_json("/api/v1/message", json!({ "text": "no user" }))).await;
  assert!(status.is_client_error());
}
