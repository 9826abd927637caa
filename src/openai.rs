//! Minimal OpenAI-compatible chat client used to generate questions.
//!
//! Works against any chat.completions endpoint (OpenAI, DeepSeek, ...).
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::Prompts;
use crate::domain::{Question, QuestionSourceKind};
use crate::error::QuestionError;
use crate::questions::QuestionSource;
use crate::tracker::QuestionRequest;
use crate::util::{clean_json_response, fill_template, trunc_for_log};

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

/// Raw question object as returned by the model.
#[derive(Deserialize)]
struct Gen {
  question: String,
  /// Models return the answer as a string or a bare number.
  answer: serde_json::Value,
  #[serde(default)] difficulty: Option<f64>,
  #[serde(default)] estimated_time: Option<f64>,
  #[serde(default)] operations: Vec<String>,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model =
      std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// Chat completion returning the raw assistant text.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
  async fn chat(&self, system: &str, user: &str, temperature: f32) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "mathquiz-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    Ok(body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default())
  }

  /// Generate the next question for the player described by `req`.
  /// A repeat of a used question is retried once, then rejected as malformed.
  #[instrument(level = "info", skip(self, prompts, req), fields(level = req.current_level, failures = req.consecutive_failures))]
  pub async fn generate_question(&self, prompts: &Prompts, req: &QuestionRequest) -> Result<Question, QuestionError> {
    let (system, user) = build_question_prompts(prompts, req);

    let first = self.generate_once(&system, &user, req.current_level).await?;
    let q = match ensure_unused(first, &req.used_questions) {
      Ok(q) => q,
      Err(e) => {
        warn!(target: "quiz", error = %e, "Model repeated a used question; asking once more");
        let second = self.generate_once(&system, &user, req.current_level).await?;
        ensure_unused(second, &req.used_questions)?
      }
    };
    debug!(target: "quiz", id = %q.id, question = %trunc_for_log(&q.question, 60), "Question generated");
    Ok(q)
  }

  async fn generate_once(&self, system: &str, user: &str, level: f64) -> Result<Question, QuestionError> {
    let start = std::time::Instant::now();
    let raw = self.chat(system, user, 0.8).await;
    let elapsed = start.elapsed();
    match raw {
      Ok(t) => {
        info!(?elapsed, response_len = t.len(), "Model response received");
        parse_generated_question(&t, level)
      }
      Err(e) => {
        error!(?elapsed, error = %e, "Model call failed during question generation");
        Err(QuestionError::Upstream { reason: e })
      }
    }
  }
}

/// Reject a generated question the player has already seen.
pub fn ensure_unused(q: Question, used: &[String]) -> Result<Question, QuestionError> {
  if used.iter().any(|u| u == &q.question) {
    return Err(QuestionError::Malformed { reason: format!("repeated used question: {}", q.question) });
  }
  Ok(q)
}

/// Fill the system/user prompts from the tracker's view of the player.
pub fn build_question_prompts(prompts: &Prompts, req: &QuestionRequest) -> (String, String) {
  let level = format!("{:.1}", req.current_level);
  let failures = req.consecutive_failures.to_string();
  let used = serde_json::to_string(&req.used_questions).unwrap_or_else(|_| "[]".into());
  let recent = serde_json::to_string(&req.recent_performance).unwrap_or_else(|_| "[]".into());
  let easier = if req.consecutive_failures > 0 { prompts.easier_hint.as_str() } else { "" };

  let pairs = [
    ("level", level.as_str()),
    ("difficulty", level.as_str()),
    ("failures", failures.as_str()),
    ("used_questions", used.as_str()),
    ("recent_performance", recent.as_str()),
    ("easier_hint", easier),
  ];
  (
    fill_template(&prompts.question_system, &pairs),
    fill_template(&prompts.question_user_template, &pairs),
  )
}

/// Parse the model reply (optionally fenced) into a `Question`.
pub fn parse_generated_question(raw: &str, fallback_difficulty: f64) -> Result<Question, QuestionError> {
  let cleaned = clean_json_response(raw);
  let gen: Gen = serde_json::from_str(&cleaned)
    .map_err(|e| QuestionError::Malformed { reason: format!("JSON parse error: {}", e) })?;

  let answer = match gen.answer {
    serde_json::Value::String(s) => s,
    serde_json::Value::Number(n) => n.to_string(),
    other => return Err(QuestionError::Malformed { reason: format!("unexpected answer value: {}", other) }),
  };
  if gen.question.trim().is_empty() || answer.trim().is_empty() {
    return Err(QuestionError::Malformed { reason: "empty question or answer".into() });
  }

  let difficulty = gen.difficulty.filter(|d| d.is_finite()).unwrap_or(fallback_difficulty);
  Ok(Question {
    id: Uuid::new_v4().to_string(),
    question: gen.question.trim().to_string(),
    answer,
    difficulty,
    estimated_time: gen.estimated_time.unwrap_or(0.0),
    operations: gen.operations,
    recommended_time: 0,
    source: QuestionSourceKind::Generated,
  })
}

/// Question source backed by the chat-completions service.
pub struct OpenAiQuestionSource {
  pub client: OpenAI,
  pub prompts: Prompts,
}

#[async_trait]
impl QuestionSource for OpenAiQuestionSource {
  fn name(&self) -> &'static str { "openai_generated" }

  async fn next_question(&self, req: &QuestionRequest) -> Result<Question, QuestionError> {
    self.client.generate_question(&self.prompts, req).await
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
