//! Error types for the collaborators (question sources, progress store) and game flow.

use thiserror::Error;

/// Failures while asking a question source for the next question.
#[derive(Debug, Error)]
pub enum QuestionError {
  #[error("Question service request failed: {reason}")]
  Upstream { reason: String },

  #[error("Question service returned an unusable question: {reason}")]
  Malformed { reason: String },

  #[error("No unused questions left for level {level}")]
  Exhausted { level: u8 },
}

/// Failures of the progress store.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Progress store unavailable: {reason}")]
  Unavailable { reason: String },
}

/// Errors surfaced to API clients while playing a round.
#[derive(Debug, Error)]
pub enum GameError {
  #[error("Unknown session: {session_id}")]
  UnknownSession { session_id: String },

  #[error("No active question; start a new round first")]
  NoActiveQuestion,

  #[error("Round already in progress; answer or time out first")]
  RoundInProgress,

  #[error(transparent)]
  Question(#[from] QuestionError),

  #[error(transparent)]
  Store(#[from] StoreError),
}
