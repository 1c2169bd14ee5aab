//! Per-user ephemeral state: the one-slot conversation state and the active quiz.
//!
//! Process-lifetime only. Both maps are owned by a `SessionStore` instance that is injected
//! through `AppState`, so tests get a fresh store each.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{ConversationState, QuizQuestion};

#[derive(Clone, Default)]
pub struct SessionStore {
  states: Arc<RwLock<HashMap<i64, ConversationState>>>,
  quizzes: Arc<RwLock<HashMap<i64, QuizQuestion>>>,
}

impl SessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Current state; absent users are `Idle`.
  pub async fn state(&self, user_id: i64) -> ConversationState {
    self.states.read().await.get(&user_id).copied().unwrap_or_default()
  }

  pub async fn set_state(&self, user_id: i64, state: ConversationState) {
    let mut states = self.states.write().await;
    if state == ConversationState::Idle {
      states.remove(&user_id);
    } else {
      states.insert(user_id, state);
    }
    debug!(target: "dialog", user_id, ?state, "conversation state set");
  }

  /// Read and reset to `Idle` in one step. The returned value is what the message is for.
  pub async fn take_state(&self, user_id: i64) -> ConversationState {
    self.states.write().await.remove(&user_id).unwrap_or_default()
  }

  /// Store a quiz, replacing (and silently abandoning) any unanswered one.
  pub async fn put_quiz(&self, user_id: i64, quiz: QuizQuestion) -> Option<QuizQuestion> {
    self.quizzes.write().await.insert(user_id, quiz)
  }

  pub async fn active_quiz(&self, user_id: i64) -> Option<QuizQuestion> {
    self.quizzes.read().await.get(&user_id).cloned()
  }

  /// Remove the active quiz; a second call returns `None`.
  pub async fn take_quiz(&self, user_id: i64) -> Option<QuizQuestion> {
    self.quizzes.write().await.remove(&user_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::QuizSource;

  fn quiz(id: &str) -> QuizQuestion {
    QuizQuestion {
      id: id.into(),
      source: QuizSource::Builtin,
      question: "?".into(),
      options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
      correct_index: 2,
    }
  }

  #[tokio::test]
  async fn absent_user_is_idle() {
    let s = SessionStore::new();
    assert_eq!(s.state(42).await, ConversationState::Idle);
  }

  #[tokio::test]
  async fn take_state_resets_to_idle() {
    let s = SessionStore::new();
    s.set_state(1, ConversationState::AwaitingRetell).await;
    assert_eq!(s.take_state(1).await, ConversationState::AwaitingRetell);
    assert_eq!(s.state(1).await, ConversationState::Idle);
    assert_eq!(s.take_state(1).await, ConversationState::Idle);
  }

  #[tokio::test]
  async fn states_are_per_user() {
    let s = SessionStore::new();
    s.set_state(1, ConversationState::AwaitingWord).await;
    assert_eq!(s.state(2).await, ConversationState::Idle);
  }

  #[tokio::test]
  async fn new_quiz_overwrites_and_take_is_single_shot() {
    let s = SessionStore::new();
    assert!(s.put_quiz(7, quiz("first")).await.is_none());
    let old = s.put_quiz(7, quiz("second")).await.unwrap();
    assert_eq!(old.id, "first");
    assert_eq!(s.take_quiz(7).await.unwrap().id, "second");
    assert!(s.take_quiz(7).await.is_none());
  }
}
