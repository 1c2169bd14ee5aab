//! Domain models: dictionary rows, user stats, conversation state, lookup outcomes, quiz
//! questions and the abstract outbound reply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One word a user has looked up. Keyed by `(user_id, word)` where `word` is normalized.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DictionaryEntry {
  pub word: String,
  pub explanation: String,
  pub lookup_count: i64,
  pub first_seen: DateTime<Utc>,
  pub last_seen: DateTime<Utc>,
}

/// Cached per-user aggregate. `unique_words` mirrors the live dictionary row count.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserStats {
  pub user_id: i64,
  pub total_lookups: i64,
  pub unique_words: i64,
  pub quiz_games: i64,
  pub quiz_correct: i64,
  pub created_at: DateTime<Utc>,
}

/// Store-wide figures for the admin overview.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct StoreTotals {
  pub users: i64,
  pub entries: i64,
  pub lookups: i64,
}

/// What the next free-text message from a user means.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
  #[default]
  Idle,
  AwaitingWord,
  AwaitingPhrase,
  AwaitingRetell,
  AwaitingCharacter,
}

/// Free-text intents reachable through an `Awaiting*` state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
  Word,
  Phrase,
  Retell,
  Character,
}

impl ConversationState {
  /// The intent this state is waiting for; `None` for `Idle`.
  pub fn intent(self) -> Option<Intent> {
    match self {
      ConversationState::Idle => None,
      ConversationState::AwaitingWord => Some(Intent::Word),
      ConversationState::AwaitingPhrase => Some(Intent::Phrase),
      ConversationState::AwaitingRetell => Some(Intent::Retell),
      ConversationState::AwaitingCharacter => Some(Intent::Character),
    }
  }
}

impl Intent {
  pub fn awaiting_state(self) -> ConversationState {
    match self {
      Intent::Word => ConversationState::AwaitingWord,
      Intent::Phrase => ConversationState::AwaitingPhrase,
      Intent::Retell => ConversationState::AwaitingRetell,
      Intent::Character => ConversationState::AwaitingCharacter,
    }
  }
}

/// Outcome of asking one producer (or a chain of producers) for content.
///
/// `NotFound` means the producer answered and had nothing; `Unavailable` means the producer is
/// not configured at all; `Failed` is a single failed attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup<T> {
  Found(T),
  NotFound,
  Unavailable,
  Failed(String),
}

impl<T> Lookup<T> {
  pub fn found(self) -> Option<T> {
    match self {
      Lookup::Found(v) => Some(v),
      _ => None,
    }
  }

  pub fn is_found(&self) -> bool {
    matches!(self, Lookup::Found(_))
  }
}

/// Which producer produced an explanation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
  Glossary,
  Generator,
}

/// An explanation together with its origin and the text to persist.
#[derive(Clone, Debug, PartialEq)]
pub struct Explanation {
  pub source: SourceKind,
  /// Full user-facing text.
  pub display: String,
  /// Short text stored in the user's dictionary (word intent only).
  pub stored: String,
}

/// Where a quiz question came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizSource {
  Generated,
  Dictionary,
  Glossary,
  Builtin,
}

/// One multiple-choice question with exactly one correct option.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct QuizQuestion {
  pub id: String,
  pub source: QuizSource,
  pub question: String,
  pub options: Vec<String>,
  pub correct_index: usize,
}

/// Result of grading one answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizVerdict {
  pub correct: bool,
  /// 0-based index of the correct option.
  pub correct_index: usize,
  pub correct_text: String,
}

/// A file attached to a reply (dictionary export).
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Document {
  pub filename: String,
  pub mime: String,
  pub content: String,
}

/// Abstract outbound message; the transport decides how to render `choices`.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Reply {
  pub text: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub choices: Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub document: Option<Document>,
}

impl Reply {
  pub fn text(text: impl Into<String>) -> Self {
    Self { text: text.into(), choices: None, document: None }
  }

  pub fn with_choices(mut self, choices: Vec<String>) -> Self {
    self.choices = Some(choices);
    self
  }

  pub fn with_document(mut self, document: Document) -> Self {
    self.document = Some(document);
    self
  }
}
