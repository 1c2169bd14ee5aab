//! Static glossary: read-only terms and phrases, looked up by normalized key.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::util::{normalize_phrase, normalize_word};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GlossaryTerm {
  pub term: String,
  pub definition: String,
  #[serde(default)]
  pub category: String,
  #[serde(default)]
  pub examples: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GlossaryPhrase {
  pub text: String,
  pub explanation: String,
  #[serde(default)]
  pub modern_paraphrase: String,
  #[serde(default)]
  pub cultural_context: String,
}

/// In-memory glossary. Terms keep insertion order for `terms()`; later inserts with the same
/// normalized key replace earlier ones.
#[derive(Clone, Debug, Default)]
pub struct Glossary {
  terms: Vec<GlossaryTerm>,
  term_index: HashMap<String, usize>,
  phrases: Vec<GlossaryPhrase>,
  phrase_index: HashMap<String, usize>,
}

impl Glossary {
  pub fn new(terms: Vec<GlossaryTerm>, phrases: Vec<GlossaryPhrase>) -> Self {
    let mut g = Self::default();
    for t in terms {
      g.insert_term(t);
    }
    for p in phrases {
      g.insert_phrase(p);
    }
    g
  }

  fn insert_term(&mut self, t: GlossaryTerm) {
    let key = normalize_word(&t.term);
    if key.is_empty() || t.definition.trim().is_empty() {
      return;
    }
    match self.term_index.get(&key) {
      Some(&i) => self.terms[i] = t,
      None => {
        self.term_index.insert(key, self.terms.len());
        self.terms.push(t);
      }
    }
  }

  fn insert_phrase(&mut self, p: GlossaryPhrase) {
    let key = normalize_phrase(&p.text);
    if key.is_empty() || p.explanation.trim().is_empty() {
      return;
    }
    match self.phrase_index.get(&key) {
      Some(&i) => self.phrases[i] = p,
      None => {
        self.phrase_index.insert(key, self.phrases.len());
        self.phrases.push(p);
      }
    }
  }

  pub fn term(&self, word: &str) -> Option<&GlossaryTerm> {
    self.term_index.get(&normalize_word(word)).map(|&i| &self.terms[i])
  }

  pub fn phrase(&self, text: &str) -> Option<&GlossaryPhrase> {
    self.phrase_index.get(&normalize_phrase(text)).map(|&i| &self.phrases[i])
  }

  pub fn terms(&self) -> &[GlossaryTerm] {
    &self.terms
  }

  pub fn phrases(&self) -> &[GlossaryPhrase] {
    &self.phrases
  }
}

/// User-facing text for a glossary term.
pub fn format_term(t: &GlossaryTerm) -> String {
  let mut out = format!("📝 {}\n\n{}", t.term, t.definition);
  if !t.category.is_empty() {
    out.push_str(&format!("\n\nКатегория: {}", t.category));
  }
  if !t.examples.is_empty() {
    out.push_str("\n\nПримеры:");
    for e in &t.examples {
      out.push_str(&format!("\n• {}", e));
    }
  }
  out
}

/// User-facing text for a glossary phrase.
pub fn format_phrase(p: &GlossaryPhrase) -> String {
  let mut out = format!("🎭 {}", p.explanation);
  if !p.modern_paraphrase.is_empty() {
    out.push_str(&format!("\n\nСовременный вариант\n{}", p.modern_paraphrase));
  }
  if !p.cultural_context.is_empty() {
    out.push_str(&format!("\n\nКультурный контекст\n{}", p.cultural_context));
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::seeds::{seed_phrases, seed_terms};

  #[test]
  fn term_lookup_is_case_insensitive() {
    let g = Glossary::new(seed_terms(), vec![]);
    let t = g.term("ОБЛОМ").expect("seeded");
    assert_eq!(t.term, "облом");
    assert!(g.term("несуществующее").is_none());
  }

  #[test]
  fn later_terms_replace_earlier_with_same_key() {
    let mut terms = seed_terms();
    let before = terms.len();
    terms.push(GlossaryTerm {
      term: "Фрак".into(),
      definition: "Переопределено".into(),
      category: String::new(),
      examples: vec![],
    });
    let g = Glossary::new(terms, vec![]);
    assert_eq!(g.terms().len(), before);
    assert_eq!(g.term("фрак").unwrap().definition, "Переопределено");
  }

  #[test]
  fn blank_definitions_are_skipped() {
    let g = Glossary::new(
      vec![GlossaryTerm { term: "пусто".into(), definition: "  ".into(), category: String::new(), examples: vec![] }],
      vec![],
    );
    assert!(g.terms().is_empty());
  }

  #[test]
  fn phrase_lookup_tolerates_quotes() {
    let g = Glossary::new(vec![], seed_phrases());
    let p = g.phrase("«Счастливые часов не наблюдают!»").expect("seeded");
    assert!(format_phrase(p).contains("Современный вариант"));
  }
}
