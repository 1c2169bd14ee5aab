//! Application state shared by every handler.
//!
//! This module owns:
//!   - the dictionary store (SQLite, falls back to in-memory if the file can't be opened)
//!   - the session store (conversation state + active quizzes)
//!   - the explanation source (glossary + optional generator client)
//!   - the quiz engine
//!   - the loaded TOML config and env settings
//!
//! The generator is decided once here: without an API key every generator-backed intent runs
//! in degraded mode for the whole process lifetime.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::config::{load_agent_config_from_env, AgentConfig, Settings};
use crate::explain::ExplanationSource;
use crate::glossary::Glossary;
use crate::llm::LlmClient;
use crate::quiz::QuizEngine;
use crate::seeds::{seed_phrases, seed_terms};
use crate::session::SessionStore;
use crate::store::{StorageResult, WordStore};

#[derive(Clone)]
pub struct AppState {
  pub store: WordStore,
  pub sessions: SessionStore,
  pub source: ExplanationSource,
  pub quiz: QuizEngine,
  pub config: AgentConfig,
  pub settings: Settings,
}

impl AppState {
  /// Build state from env: load config, open the database, init the generator client.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> StorageResult<Self> {
    let config = load_agent_config_from_env().unwrap_or_default();
    let settings = Settings::from_env();

    let store = match WordStore::open(&settings.database_path) {
      Ok(s) => s,
      Err(e) => {
        error!(target: "store", path = %settings.database_path, error = %e, "Failed to open dictionary database; using in-memory store");
        WordStore::open_in_memory()?
      }
    };

    let llm = LlmClient::from_env();
    if let Some(c) = &llm {
      info!(target: "literary_assistant", base_url = %c.base_url, model = %c.model, "Generator enabled.");
    } else {
      info!(target: "literary_assistant", "Generator disabled (no LLM_API_KEY / OPENROUTER_API_KEY). Using glossary only.");
    }

    Ok(Self::from_parts(store, llm, config, settings))
  }

  /// Assemble state from explicit parts (tests inject an in-memory store and a mock client).
  pub fn from_parts(store: WordStore, llm: Option<LlmClient>, config: AgentConfig, settings: Settings) -> Self {
    // Built-in seeds first so TOML entries with the same key override them.
    let mut terms = seed_terms();
    terms.extend(config.glossary.terms.iter().cloned());
    let mut phrases = seed_phrases();
    phrases.extend(config.glossary.phrases.iter().cloned());
    let glossary = Arc::new(Glossary::new(terms, phrases));
    info!(target: "literary_assistant", terms = glossary.terms().len(), phrases = glossary.phrases().len(), "Glossary loaded");

    let source = ExplanationSource::new(
      glossary,
      llm,
      config.prompts.clone(),
      config.generation.clone(),
      config.sources.explain_priority.clone(),
    );
    let sessions = SessionStore::new();
    let quiz = QuizEngine::new(
      store.clone(),
      sessions.clone(),
      source.clone(),
      config.limits.quiz_option_chars,
      config.quiz.generated_first,
    );

    Self { store, sessions, source, quiz, config, settings }
  }
}
