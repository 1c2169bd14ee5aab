//! Loading assistant configuration (prompts, limits, source priority, extra glossary) from TOML.
//!
//! Every section is optional; missing keys fall back to `Default`. See `AgentConfig` for the
//! expected schema:
//!
//! ```toml
//! [limits]
//! max_output_chars = 4000
//! max_retell_chars = 2000
//!
//! [sources]
//! explain_priority = ["generator", "glossary"]
//!
//! [[glossary.terms]]
//! term = "кибитка"
//! definition = "Крытая дорожная повозка"
//! ```

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::SourceKind;
use crate::glossary::{GlossaryPhrase, GlossaryTerm};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub limits: Limits,
  #[serde(default)]
  pub sources: Sources,
  #[serde(default)]
  pub quiz: QuizSettings,
  #[serde(default)]
  pub generation: Generation,
  #[serde(default)]
  pub glossary: GlossaryExtra,
}

/// Size budgets enforced by the dispatcher and the quiz engine.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Limits {
  /// Maximum characters of any reply leaving the core.
  pub max_output_chars: usize,
  /// Marker appended when a reply had to be cut.
  pub truncation_marker: String,
  /// Retell inputs above this are rejected before any model call.
  pub max_retell_chars: usize,
  /// Prefix length of an explanation used as quiz option text.
  pub quiz_option_chars: usize,
  /// Entries shown by the dictionary listing command.
  pub dictionary_page: usize,
}

impl Default for Limits {
  fn default() -> Self {
    Self {
      max_output_chars: 4000,
      truncation_marker: "\n\n... [truncated]".into(),
      max_retell_chars: 2000,
      quiz_option_chars: 100,
      dictionary_page: 20,
    }
  }
}

/// Order in which explanation producers are consulted for words and phrases.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Sources {
  pub explain_priority: Vec<SourceKind>,
}

impl Default for Sources {
  fn default() -> Self {
    Self { explain_priority: vec![SourceKind::Glossary, SourceKind::Generator] }
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct QuizSettings {
  /// Ask the model for a question before using the dictionary/glossary.
  pub generated_first: bool,
}

/// Sampling parameters for every generator call.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Generation {
  pub max_tokens: u32,
  pub quiz_max_tokens: u32,
  pub temperature: f32,
  pub top_p: f32,
}

impl Default for Generation {
  fn default() -> Self {
    Self { max_tokens: 500, quiz_max_tokens: 1000, temperature: 0.7, top_p: 0.9 }
  }
}

/// Extra glossary content merged over the built-in set.
#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct GlossaryExtra {
  pub terms: Vec<GlossaryTerm>,
  pub phrases: Vec<GlossaryPhrase>,
}

/// Prompts used by the generator client. Defaults target Russian classic literature.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub system: String,
  pub word_template: String,
  pub phrase_template: String,
  pub retell_template: String,
  pub character_template: String,
  pub quiz_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      system: "Ты — литературный помощник. Отвечай по-русски, кратко и по существу.".into(),
      word_template: "Объясни литературное или устаревшее слово \"{word}\" простым современным языком.\n\
        Если это слово из русской классической литературы XIX-XX веков, укажи культурный контекст.\n\n\
        Структура ответа:\n\
        Определение: [краткое определение]\n\
        Синоним: [современный синоним или аналог]\n\
        Пример: [пример использования в литературе]\n\
        Контекст: [культурный контекст, если применимо]\n\n\
        Будь краток и информативен.".into(),
      phrase_template: "Объясни значение литературной фразы или выражения: \"{phrase}\"\n\n\
        Структура ответа:\n\
        Значение: [прямое значение фразы]\n\
        Современный перевод: [как сказать то же самое сегодня]\n\
        Контекст: [исторический или культурный контекст]\n\
        Происхождение: [откуда пошло выражение]".into(),
      retell_template: "Перескажи этот текст простым современным языком для современного читателя.\n\n\
        Исходный текст:\n\"{text}\"\n\n\
        Сохрани смысл и основные события, замени устаревшую лексику, сократи длинные предложения. \
        Результат должен быть в 2-3 раза короче оригинала.".into(),
      character_template: "Дай характеристику литературного героя: {character}.\n\n\
        Структура ответа:\n\
        Произведение и автор\n\
        Внешность и положение\n\
        Черты характера\n\
        Роль в сюжете\n\
        Значение образа".into(),
      quiz_template: "Создай {count} вопроса для викторины по теме \"{topic}\" из русской литературы.\n\
        Каждый вопрос должен иметь 4 варианта ответа (только один правильный).\n\n\
        Формат для каждого вопроса:\n\
        ВОПРОС: [текст вопроса]\n\
        A) [вариант 1]\nB) [вариант 2]\nC) [вариант 3]\nD) [вариант 4]\n\
        ПРАВИЛЬНЫЙ: [буква правильного ответа]\n\
        ОБЪЯСНЕНИЕ: [краткое объяснение]".into(),
    }
  }
}

/// Process-level settings read from the environment once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
  pub database_path: String,
  pub admin_user_id: Option<i64>,
}

impl Settings {
  pub fn from_env() -> Self {
    let database_path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| "literary_bot.db".into());
    let admin_user_id = std::env::var("ADMIN_USER_ID").ok().and_then(|v| v.trim().parse::<i64>().ok());
    Self { database_path, admin_user_id }
  }
}

/// Parse TOML text into `AgentConfig`.
pub fn parse_agent_config(s: &str) -> Result<AgentConfig, toml::de::Error> {
  toml::from_str::<AgentConfig>(s)
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_agent_config(&s) {
      Ok(cfg) => {
        info!(target: "literary_assistant", %path, extra_terms = cfg.glossary.terms.len(), "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "literary_assistant", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "literary_assistant", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = parse_agent_config("").unwrap();
    assert_eq!(cfg.limits.max_output_chars, 4000);
    assert_eq!(cfg.limits.max_retell_chars, 2000);
    assert_eq!(cfg.sources.explain_priority, vec![SourceKind::Glossary, SourceKind::Generator]);
    assert!(!cfg.quiz.generated_first);
    assert!(cfg.prompts.word_template.contains("{word}"));
  }

  #[test]
  fn partial_sections_keep_remaining_defaults() {
    let cfg = parse_agent_config(
      r#"
        [limits]
        max_retell_chars = 500

        [sources]
        explain_priority = ["generator", "glossary"]

        [[glossary.terms]]
        term = "Кибитка"
        definition = "Крытая дорожная повозка"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.limits.max_retell_chars, 500);
    assert_eq!(cfg.limits.max_output_chars, 4000);
    assert_eq!(cfg.sources.explain_priority, vec![SourceKind::Generator, SourceKind::Glossary]);
    assert_eq!(cfg.glossary.terms.len(), 1);
    assert_eq!(cfg.glossary.terms[0].category, "");
  }

  #[test]
  fn unknown_source_kind_is_a_parse_error() {
    assert!(parse_agent_config("[sources]\nexplain_priority = [\"oracle\"]").is_err());
  }
}
