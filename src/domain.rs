//! Domain models used by the backend: question sources and the question itself.

use serde::{Deserialize, Serialize};

/// Where did we get the question from?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSourceKind {
  LocalBank,   // from user-provided TOML bank
  Generated,   // generated via the chat-completions service
  Seed,        // built-in seeds
}

/// A single arithmetic question, as produced by a question source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  pub question: String,
  /// Expected answer, compared after whitespace normalization.
  pub answer: String,
  pub difficulty: f64,
  pub estimated_time: f64,
  #[serde(default)] pub operations: Vec<String>,
  /// Seconds the client should allow; filled in by the server.
  #[serde(default)] pub recommended_time: u32,
  pub source: QuestionSourceKind,
}
