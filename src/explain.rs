//! Explanation resolution over the static glossary and the generator.
//!
//! Words and phrases walk the configured priority list until one producer yields content.
//! Retelling and character descriptions have a single producer, the generator. Every
//! generator call is a single attempt.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{Generation, Prompts};
use crate::domain::{Explanation, Lookup, SourceKind};
use crate::glossary::{format_phrase, format_term, Glossary};
use crate::llm::LlmClient;
use crate::util::{normalize_word, trunc_for_log};

#[derive(Clone)]
pub struct ExplanationSource {
  glossary: Arc<Glossary>,
  llm: Option<LlmClient>,
  prompts: Prompts,
  generation: Generation,
  priority: Vec<SourceKind>,
}

/// Keep the most informative miss: a failed attempt beats "not found" beats "unavailable".
fn worse<T>(acc: Lookup<T>, next: Lookup<T>) -> Lookup<T> {
  fn rank<T>(l: &Lookup<T>) -> u8 {
    match l {
      Lookup::Failed(_) => 3,
      Lookup::NotFound => 2,
      Lookup::Unavailable => 1,
      Lookup::Found(_) => 0,
    }
  }
  if rank(&next) > rank(&acc) {
    next
  } else {
    acc
  }
}

impl ExplanationSource {
  pub fn new(
    glossary: Arc<Glossary>,
    llm: Option<LlmClient>,
    prompts: Prompts,
    generation: Generation,
    priority: Vec<SourceKind>,
  ) -> Self {
    // An empty list would make every lookup a miss; fall back to glossary then generator.
    let priority = if priority.is_empty() { vec![SourceKind::Glossary, SourceKind::Generator] } else { priority };
    Self { glossary, llm, prompts, generation, priority }
  }

  pub fn has_generator(&self) -> bool {
    self.llm.is_some()
  }

  pub fn glossary(&self) -> &Glossary {
    &self.glossary
  }

  pub fn llm(&self) -> Option<&LlmClient> {
    self.llm.as_ref()
  }

  pub fn prompts(&self) -> &Prompts {
    &self.prompts
  }

  pub fn generation(&self) -> &Generation {
    &self.generation
  }

  pub async fn explain_word(&self, word: &str) -> Lookup<Explanation> {
    let key = normalize_word(word);
    if key.is_empty() {
      return Lookup::NotFound;
    }

    let mut miss = Lookup::Unavailable;
    for kind in &self.priority {
      let step = match kind {
        SourceKind::Glossary => match self.glossary.term(&key) {
          Some(t) => Lookup::Found(Explanation {
            source: SourceKind::Glossary,
            display: format_term(t),
            stored: t.definition.clone(),
          }),
          None => Lookup::NotFound,
        },
        SourceKind::Generator => match &self.llm {
          None => Lookup::Unavailable,
          Some(llm) => match llm.explain_word(&self.prompts, &self.generation, &key).await {
            Ok(text) => Lookup::Found(Explanation {
              source: SourceKind::Generator,
              display: format!("🤖 ИИ-генерация:\n\n{}", text),
              stored: text,
            }),
            Err(e) => {
              warn!(target: "dialog", word = %key, error = %e, "generator failed to explain word");
              Lookup::Failed(e)
            }
          },
        },
      };
      debug!(target: "dialog", word = %key, source = ?kind, found = step.is_found(), "word lookup step");
      if step.is_found() {
        return step;
      }
      miss = worse(miss, step);
    }
    miss
  }

  pub async fn explain_phrase(&self, phrase: &str) -> Lookup<Explanation> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
      return Lookup::NotFound;
    }

    let mut miss = Lookup::Unavailable;
    for kind in &self.priority {
      let step = match kind {
        SourceKind::Glossary => match self.glossary.phrase(phrase) {
          Some(p) => Lookup::Found(Explanation {
            source: SourceKind::Glossary,
            display: format_phrase(p),
            stored: p.explanation.clone(),
          }),
          None => Lookup::NotFound,
        },
        SourceKind::Generator => match &self.llm {
          None => Lookup::Unavailable,
          Some(llm) => match llm.explain_phrase(&self.prompts, &self.generation, phrase).await {
            Ok(text) => Lookup::Found(Explanation {
              source: SourceKind::Generator,
              display: format!("📝 Объяснение фразы:\n\n{}", text),
              stored: text,
            }),
            Err(e) => {
              warn!(target: "dialog", phrase = %trunc_for_log(phrase, 50), error = %e, "generator failed to explain phrase");
              Lookup::Failed(e)
            }
          },
        },
      };
      if step.is_found() {
        return step;
      }
      miss = worse(miss, step);
    }
    miss
  }

  /// Modern retelling. The caller enforces the input length budget before calling.
  pub async fn retell(&self, text: &str) -> Lookup<String> {
    let Some(llm) = &self.llm else { return Lookup::Unavailable };
    if text.trim().is_empty() {
      return Lookup::NotFound;
    }
    match llm.retell(&self.prompts, &self.generation, text).await {
      Ok(t) => Lookup::Found(t),
      Err(e) => {
        warn!(target: "dialog", text = %trunc_for_log(text, 50), error = %e, "generator failed to retell");
        Lookup::Failed(e)
      }
    }
  }

  pub async fn describe_character(&self, character: &str) -> Lookup<String> {
    let Some(llm) = &self.llm else { return Lookup::Unavailable };
    if character.trim().is_empty() {
      return Lookup::NotFound;
    }
    match llm.describe_character(&self.prompts, &self.generation, character.trim()).await {
      Ok(t) => Lookup::Found(t),
      Err(e) => {
        warn!(target: "dialog", character = %trunc_for_log(character, 50), error = %e, "generator failed to describe character");
        Lookup::Failed(e)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::seeds::{seed_phrases, seed_terms};

  fn offline(priority: Vec<SourceKind>) -> ExplanationSource {
    ExplanationSource::new(
      Arc::new(Glossary::new(seed_terms(), seed_phrases())),
      None,
      Prompts::default(),
      Generation::default(),
      priority,
    )
  }

  #[tokio::test]
  async fn glossary_word_is_found_with_definition_stored() {
    let src = offline(vec![SourceKind::Glossary, SourceKind::Generator]);
    let e = src.explain_word("Фрак").await.found().unwrap();
    assert_eq!(e.source, SourceKind::Glossary);
    assert!(e.stored.starts_with("Мужской парадный костюм"));
    assert!(e.display.contains(&e.stored));
  }

  #[tokio::test]
  async fn generator_first_still_falls_back_to_glossary() {
    let src = offline(vec![SourceKind::Generator, SourceKind::Glossary]);
    assert!(src.explain_word("вельми").await.is_found());
  }

  #[tokio::test]
  async fn unknown_word_without_generator_is_not_found() {
    let src = offline(vec![SourceKind::Glossary, SourceKind::Generator]);
    assert_eq!(src.explain_word("квазиабракадабра").await, Lookup::NotFound);
  }

  #[tokio::test]
  async fn generator_only_intents_report_unavailable() {
    let src = offline(vec![]);
    assert_eq!(src.retell("Однажды...").await, Lookup::Unavailable);
    assert_eq!(src.describe_character("Обломов").await, Lookup::Unavailable);
  }

  #[test]
  fn worse_prefers_failures() {
    let a: Lookup<()> = worse(Lookup::Unavailable, Lookup::NotFound);
    assert_eq!(a, Lookup::NotFound);
    let b: Lookup<()> = worse(Lookup::Failed("x".into()), Lookup::NotFound);
    assert_eq!(b, Lookup::Failed("x".into()));
  }
}
