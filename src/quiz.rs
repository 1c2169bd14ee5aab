//! Quiz engine: one four-option question per user, graded exactly once.
//!
//! Question sources, in order:
//!   0. the generator (only when `quiz.generated_first` is set and a client exists)
//!   1. the user's own dictionary, when it has at least three entries
//!   2. the static glossary
//!   3. the built-in fallback questions
//!
//! Wrong options are drawn from distinct entries/terms first; filler text pads the rest.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{DictionaryEntry, QuizQuestion, QuizSource, QuizVerdict};
use crate::explain::ExplanationSource;
use crate::glossary::Glossary;
use crate::quiz_text::{parse_quiz_block, ParsedQuestion};
use crate::seeds::fallback_quiz_questions;
use crate::session::SessionStore;
use crate::store::WordStore;
use crate::util::preview;

pub const QUIZ_OPTIONS: usize = 4;
pub const FILLER_OPTION: &str = "Ни один из перечисленных вариантов";
/// Minimum dictionary size before the user's own words are used.
pub const MIN_DICTIONARY_ENTRIES: usize = 3;
const DICTIONARY_SCAN_LIMIT: usize = 1000;
const GENERATED_TOPIC: &str = "русская литература";

/// Shuffle `correct` together with up to three `wrong` options (padded with filler) and
/// remember where the correct one landed.
pub fn assemble<R: Rng + ?Sized>(
  rng: &mut R,
  source: QuizSource,
  question: String,
  correct: String,
  wrong: Vec<String>,
) -> QuizQuestion {
  let mut tagged: Vec<(bool, String)> = Vec::with_capacity(QUIZ_OPTIONS);
  tagged.push((true, correct));
  tagged.extend(wrong.into_iter().take(QUIZ_OPTIONS - 1).map(|w| (false, w)));
  while tagged.len() < QUIZ_OPTIONS {
    tagged.push((false, FILLER_OPTION.to_string()));
  }
  tagged.shuffle(rng);

  let correct_index = tagged.iter().position(|(ok, _)| *ok).unwrap_or(0);
  QuizQuestion {
    id: Uuid::new_v4().to_string(),
    source,
    question,
    options: tagged.into_iter().map(|(_, text)| text).collect(),
    correct_index,
  }
}

/// Pick up to three option texts from `pool` that differ from `correct` and from each other.
fn distinct_wrong<R: Rng + ?Sized>(rng: &mut R, correct: &str, mut pool: Vec<String>) -> Vec<String> {
  pool.shuffle(rng);
  let mut seen: HashSet<String> = HashSet::new();
  seen.insert(correct.to_string());
  let mut out = Vec::with_capacity(QUIZ_OPTIONS - 1);
  for text in pool {
    if out.len() == QUIZ_OPTIONS - 1 {
      break;
    }
    if seen.insert(text.clone()) {
      out.push(text);
    }
  }
  out
}

/// Question about one of the user's words. `None` below `MIN_DICTIONARY_ENTRIES`.
pub fn from_dictionary<R: Rng + ?Sized>(rng: &mut R, entries: &[DictionaryEntry], option_chars: usize) -> Option<QuizQuestion> {
  if entries.len() < MIN_DICTIONARY_ENTRIES {
    return None;
  }
  let pick = rng.gen_range(0..entries.len());
  let target = &entries[pick];
  let correct = preview(&target.explanation, option_chars);
  let pool = entries
    .iter()
    .enumerate()
    .filter(|(i, _)| *i != pick)
    .map(|(_, e)| preview(&e.explanation, option_chars))
    .collect();
  let wrong = distinct_wrong(rng, &correct, pool);
  Some(assemble(rng, QuizSource::Dictionary, format!("Что означает слово «{}»?", target.word), correct, wrong))
}

pub fn from_glossary<R: Rng + ?Sized>(rng: &mut R, glossary: &Glossary, option_chars: usize) -> Option<QuizQuestion> {
  let terms = glossary.terms();
  if terms.is_empty() {
    return None;
  }
  let pick = rng.gen_range(0..terms.len());
  let target = &terms[pick];
  let correct = preview(&target.definition, option_chars);
  let pool = terms
    .iter()
    .enumerate()
    .filter(|(i, _)| *i != pick)
    .map(|(_, t)| preview(&t.definition, option_chars))
    .collect();
  let wrong = distinct_wrong(rng, &correct, pool);
  Some(assemble(rng, QuizSource::Glossary, format!("Что означает слово «{}»?", target.term), correct, wrong))
}

pub fn from_builtin<R: Rng + ?Sized>(rng: &mut R) -> Option<QuizQuestion> {
  let seeds = fallback_quiz_questions();
  let q = seeds.choose(rng)?;
  Some(assemble(
    rng,
    QuizSource::Builtin,
    q.question.to_string(),
    q.correct.to_string(),
    q.wrong.iter().map(|w| w.to_string()).collect(),
  ))
}

fn from_parsed<R: Rng + ?Sized>(rng: &mut R, parsed: &[ParsedQuestion]) -> Option<QuizQuestion> {
  let p = parsed.choose(rng)?;
  let correct = p.options.get(p.correct_index)?.clone();
  let wrong = p
    .options
    .iter()
    .enumerate()
    .filter(|(i, _)| *i != p.correct_index)
    .map(|(_, o)| o.clone())
    .collect();
  Some(assemble(rng, QuizSource::Generated, p.question.clone(), correct, wrong))
}

/// Dictionary → glossary → built-in, synchronously.
pub fn build_local<R: Rng + ?Sized>(
  rng: &mut R,
  entries: &[DictionaryEntry],
  glossary: &Glossary,
  option_chars: usize,
) -> QuizQuestion {
  from_dictionary(rng, entries, option_chars)
    .or_else(|| from_glossary(rng, glossary, option_chars))
    .or_else(|| from_builtin(rng))
    .unwrap_or_else(|| {
      // fallback_quiz_questions() is never empty
      assemble(rng, QuizSource::Builtin, "Что такое метафора?".into(), "Перенос значения по сходству".into(), vec![])
    })
}

#[derive(Clone)]
pub struct QuizEngine {
  store: WordStore,
  sessions: SessionStore,
  source: ExplanationSource,
  option_chars: usize,
  generated_first: bool,
}

impl QuizEngine {
  pub fn new(
    store: WordStore,
    sessions: SessionStore,
    source: ExplanationSource,
    option_chars: usize,
    generated_first: bool,
  ) -> Self {
    Self { store, sessions, source, option_chars, generated_first }
  }

  async fn generated_candidates(&self) -> Vec<ParsedQuestion> {
    if !self.generated_first {
      return Vec::new();
    }
    let Some(llm) = self.source.llm() else { return Vec::new() };
    match llm.quiz_block(self.source.prompts(), self.source.generation(), GENERATED_TOPIC, 3).await {
      Ok(text) => {
        let parsed = parse_quiz_block(&text);
        if parsed.is_empty() {
          warn!(target: "quiz", "generated quiz block had no usable sections");
        }
        parsed
      }
      Err(e) => {
        warn!(target: "quiz", error = %e, "quiz generation failed; using local sources");
        Vec::new()
      }
    }
  }

  /// Build a question for the user and make it their active quiz.
  #[instrument(level = "info", skip(self))]
  pub async fn start_quiz(&self, user_id: i64) -> QuizQuestion {
    let generated = self.generated_candidates().await;

    let entries = match self.store.try_list(user_id, DICTIONARY_SCAN_LIMIT) {
      Ok(e) => e,
      Err(e) => {
        warn!(target: "quiz", user_id, error = %e, "dictionary unavailable for quiz; using glossary");
        Vec::new()
      }
    };

    let question = {
      let mut rng = rand::thread_rng();
      from_parsed(&mut rng, &generated)
        .unwrap_or_else(|| build_local(&mut rng, &entries, self.source.glossary(), self.option_chars))
    };

    if self.sessions.put_quiz(user_id, question.clone()).await.is_some() {
      info!(target: "quiz", user_id, "previous unanswered quiz abandoned");
    }
    info!(target: "quiz", user_id, quiz_id = %question.id, source = ?question.source, "quiz started");
    question
  }

  /// Grade one answer. The active quiz is removed whatever the answer; `None` when the user
  /// has no active quiz.
  #[instrument(level = "info", skip(self))]
  pub async fn answer(&self, user_id: i64, option_index: usize) -> Option<QuizVerdict> {
    let quiz = self.sessions.take_quiz(user_id).await?;
    let correct = option_index == quiz.correct_index;
    self.store.record_quiz_result(user_id, correct);
    info!(target: "quiz", user_id, quiz_id = %quiz.id, option_index, correct, "quiz answered");
    Some(QuizVerdict {
      correct,
      correct_index: quiz.correct_index,
      correct_text: quiz.options.get(quiz.correct_index).cloned().unwrap_or_default(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  use crate::seeds::seed_terms;

  fn entry(word: &str, explanation: &str) -> DictionaryEntry {
    let now = Utc::now();
    DictionaryEntry { word: word.into(), explanation: explanation.into(), lookup_count: 1, first_seen: now, last_seen: now }
  }

  fn pairwise_distinct(options: &[String]) -> bool {
    let set: HashSet<&String> = options.iter().collect();
    set.len() == options.len()
  }

  #[test]
  fn assemble_always_has_four_options_and_tracks_correct() {
    for seed in 0..50 {
      let mut rng = StdRng::seed_from_u64(seed);
      let q = assemble(&mut rng, QuizSource::Builtin, "q".into(), "right".into(), vec!["w1".into()]);
      assert_eq!(q.options.len(), QUIZ_OPTIONS);
      assert_eq!(q.options[q.correct_index], "right");
      assert_eq!(q.options.iter().filter(|o| o.as_str() == FILLER_OPTION).count(), 2);
    }
  }

  #[test]
  fn correct_position_is_shuffled() {
    let positions: HashSet<usize> = (0..64)
      .map(|seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        assemble(&mut rng, QuizSource::Builtin, "q".into(), "right".into(), vec!["a".into(), "b".into(), "c".into()])
          .correct_index
      })
      .collect();
    assert_eq!(positions.len(), QUIZ_OPTIONS);
  }

  #[test]
  fn small_dictionary_is_not_used() {
    let mut rng = StdRng::seed_from_u64(1);
    let entries = vec![entry("облом", "неудача"), entry("фрак", "костюм")];
    assert!(from_dictionary(&mut rng, &entries, 100).is_none());
  }

  #[test]
  fn three_entries_give_two_wrong_options_and_one_filler() {
    let mut rng = StdRng::seed_from_u64(7);
    let entries = vec![entry("облом", "неудача"), entry("фрак", "костюм"), entry("вельми", "очень")];
    let q = from_dictionary(&mut rng, &entries, 100).unwrap();
    assert_eq!(q.source, QuizSource::Dictionary);
    assert_eq!(q.options.iter().filter(|o| o.as_str() == FILLER_OPTION).count(), 1);
    assert!(pairwise_distinct(&q.options));
  }

  #[test]
  fn four_or_more_entries_give_pairwise_distinct_options() {
    let entries = vec![
      entry("облом", "неудача"),
      entry("фрак", "костюм"),
      entry("вельми", "очень"),
      entry("дабы", "чтобы"),
      entry("десница", "правая рука"),
    ];
    for seed in 0..30 {
      let mut rng = StdRng::seed_from_u64(seed);
      let q = from_dictionary(&mut rng, &entries, 100).unwrap();
      assert!(pairwise_distinct(&q.options), "seed {seed}: {:?}", q.options);
      assert!(!q.options.iter().any(|o| o == FILLER_OPTION));
    }
  }

  #[test]
  fn duplicate_explanations_are_skipped_before_filler() {
    let mut rng = StdRng::seed_from_u64(3);
    let entries = vec![
      entry("а", "одно и то же"),
      entry("б", "одно и то же"),
      entry("в", "одно и то же"),
    ];
    let q = from_dictionary(&mut rng, &entries, 100).unwrap();
    assert_eq!(q.options.iter().filter(|o| o.as_str() == "одно и то же").count(), 1);
  }

  #[test]
  fn option_text_is_truncated() {
    let long = "д".repeat(300);
    let entries = vec![entry("а", &long), entry("б", &long), entry("в", &long)];
    let mut rng = StdRng::seed_from_u64(0);
    let q = from_dictionary(&mut rng, &entries, 100).unwrap();
    assert_eq!(q.options[q.correct_index].chars().count(), 101);
  }

  #[test]
  fn empty_glossary_falls_back_to_builtin() {
    let mut rng = StdRng::seed_from_u64(11);
    let q = build_local(&mut rng, &[], &Glossary::default(), 100);
    assert_eq!(q.source, QuizSource::Builtin);
    assert_eq!(q.options.len(), QUIZ_OPTIONS);
  }

  #[test]
  fn glossary_is_used_when_dictionary_is_small() {
    let mut rng = StdRng::seed_from_u64(5);
    let g = Glossary::new(seed_terms(), vec![]);
    let q = build_local(&mut rng, &[entry("облом", "неудача")], &g, 100);
    assert_eq!(q.source, QuizSource::Glossary);
    assert!(pairwise_distinct(&q.options));
  }
}
