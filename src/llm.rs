//! Minimal chat-completions client (OpenAI-compatible, e.g. OpenRouter).
//!
//! One request per call, no retries: a failed call is reported upward as `Err`.
//! Calls are instrumented and log model names, latencies and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload previews short.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::{Generation, Prompts};
use crate::util::fill_template;

#[derive(Clone)]
pub struct LlmClient {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl LlmClient {
  /// Construct the client if we find LLM_API_KEY (or OPENROUTER_API_KEY); otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("LLM_API_KEY")
      .or_else(|_| std::env::var("OPENROUTER_API_KEY"))
      .ok()
      .filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("LLM_BASE_URL").unwrap_or_else(|_| "https://openrouter.ai/api/v1".into());
    let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "deepseek/deepseek-chat".into());
    Self::new(api_key, base_url, model)
  }

  pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Option<Self> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build().ok()?;
    Some(Self {
      client,
      api_key: api_key.into(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
      model: model.into(),
    })
  }

  /// Plain-text chat completion. Blank content counts as failure.
  #[instrument(level = "info", skip(self, system, user, params), fields(model = %self.model, prompt_len = user.len()))]
  async fn chat_plain(&self, system: &str, user: &str, params: &Generation, max_tokens: u32) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      max_tokens,
      temperature: params.temperature,
      top_p: params.top_p,
    };

    let start = Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "literary-assistant/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req)
      .send()
      .await
      .map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body).unwrap_or(body);
      error!(elapsed = ?start.elapsed(), %status, "chat completion rejected");
      return Err(format!("LLM HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "LLM usage");
    }
    let text = body
      .choices
      .first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default()
      .trim()
      .to_string();

    if text.is_empty() {
      return Err("LLM returned no content".into());
    }
    info!(elapsed = ?start.elapsed(), response_len = text.len(), "chat completion received");
    Ok(text)
  }

  // --- High-level helpers (domain-specialized) ---

  #[instrument(level = "info", skip(self, prompts, params), fields(word_len = word.len()))]
  pub async fn explain_word(&self, prompts: &Prompts, params: &Generation, word: &str) -> Result<String, String> {
    let user = fill_template(&prompts.word_template, &[("word", word)]);
    self.chat_plain(&prompts.system, &user, params, params.max_tokens).await
  }

  #[instrument(level = "info", skip(self, prompts, params, phrase), fields(phrase_len = phrase.len()))]
  pub async fn explain_phrase(&self, prompts: &Prompts, params: &Generation, phrase: &str) -> Result<String, String> {
    let user = fill_template(&prompts.phrase_template, &[("phrase", phrase)]);
    self.chat_plain(&prompts.system, &user, params, params.max_tokens).await
  }

  #[instrument(level = "info", skip(self, prompts, params, text), fields(text_len = text.len()))]
  pub async fn retell(&self, prompts: &Prompts, params: &Generation, text: &str) -> Result<String, String> {
    let user = fill_template(&prompts.retell_template, &[("text", text)]);
    self.chat_plain(&prompts.system, &user, params, params.max_tokens).await
  }

  #[instrument(level = "info", skip(self, prompts, params, character), fields(character_len = character.len()))]
  pub async fn describe_character(&self, prompts: &Prompts, params: &Generation, character: &str) -> Result<String, String> {
    let user = fill_template(&prompts.character_template, &[("character", character)]);
    self.chat_plain(&prompts.system, &user, params, params.max_tokens).await
  }

  /// Raw quiz block; parse it with `quiz_text::parse_quiz_block`.
  #[instrument(level = "info", skip(self, prompts, params))]
  pub async fn quiz_block(&self, prompts: &Prompts, params: &Generation, topic: &str, count: usize) -> Result<String, String> {
    let count = count.to_string();
    let user = fill_template(&prompts.quiz_template, &[("topic", topic), ("count", &count)]);
    self.chat_plain(&prompts.system, &user, params, params.quiz_max_tokens).await
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  max_tokens: u32,
  temperature: f32,
  top_p: f32,
}
#[derive(Serialize)]
struct ChatMessageReq {
  role: String,
  content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  #[serde(default)]
  choices: Vec<ChatChoice>,
  #[serde(default)]
  usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessageResp,
}
#[derive(Deserialize)]
struct ChatMessageResp {
  content: Option<String>,
}
#[derive(Deserialize)]
struct Usage {
  #[serde(default)]
  prompt_tokens: Option<u32>,
  #[serde(default)]
  completion_tokens: Option<u32>,
  #[serde(default)]
  total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an API error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_error_message() {
    let body = r#"{"error":{"message":"Rate limit exceeded","code":429}}"#;
    assert_eq!(extract_api_error(body).as_deref(), Some("Rate limit exceeded"));
    assert_eq!(extract_api_error("<html>bad gateway</html>"), None);
  }

  #[test]
  fn request_carries_sampling_parameters() {
    let req = ChatCompletionRequest {
      model: "m".into(),
      messages: vec![ChatMessageReq { role: "user".into(), content: "hi".into() }],
      max_tokens: 500,
      temperature: 0.7,
      top_p: 0.9,
    };
    let v = serde_json::to_value(&req).unwrap();
    assert_eq!(v["max_tokens"], 500);
    assert_eq!(v["messages"][0]["role"], "user");
    assert!(v.get("top_p").is_some());
  }

  #[test]
  fn trailing_slash_is_trimmed_from_base_url() {
    let c = LlmClient::new("k", "http://localhost:1/v1/", "m").unwrap();
    assert_eq!(c.base_url, "http://localhost:1/v1");
  }
}
