//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Starting a round (ask the question source, attach recommended time)
//!   - Resolving a round by answer or timeout (feeds the tracker)
//!   - Saving a session's result to the progress store

use tracing::{error, info, instrument};

use crate::error::GameError;
use crate::progress::{ProgressEntry, ProgressRecord, ProgressUpdate};
use crate::protocol::{to_out, AnswerOut, QuestionOut};
use crate::session::{ActiveRound, GameSession};
use crate::state::AppState;
use crate::tracker::recommended_time;
use crate::util::answers_match;

/// Shown to players when the question source fails; they can simply retry.
pub const RETRY_MESSAGE: &str = "Error generating question. Please try again.";

/// How a round ended.
#[derive(Debug, Clone, Copy)]
pub enum RoundEnd<'a> {
  Answered(&'a str),
  TimedOut,
}

#[instrument(level = "info", skip(state, session), fields(session_id = %session.id))]
pub async fn start_round(state: &AppState, session: &mut GameSession) -> Result<QuestionOut, GameError> {
  session.touch();
  if session.current.is_some() {
    return Err(GameError::RoundInProgress);
  }

  let req = session.tracker.question_request();
  let mut question = match state.questions.next_question(&req).await {
    Ok(q) => q,
    Err(e) => {
      error!(target: "quiz", source = state.questions.name(), error = %e, "Question generation failed; round not started");
      return Err(e.into());
    }
  };
  question.recommended_time = recommended_time(question.difficulty, session.tracker.average_time());

  let level = session.tracker.current_level();
  info!(target: "quiz", id = %question.id, source = state.questions.name(), level, recommended_time = question.recommended_time, "Round started");
  let out = to_out(&question, level);
  session.current = Some(ActiveRound { question, started_at: std::time::Instant::now() });
  Ok(out)
}

/// Close the active round and record it in the tracker.
#[instrument(level = "info", skip(session, end), fields(session_id = %session.id))]
pub fn resolve_round(session: &mut GameSession, end: RoundEnd<'_>, time_spent: f64) -> Result<AnswerOut, GameError> {
  session.touch();
  let round = session.current.take().ok_or(GameError::NoActiveQuestion)?;
  let question = round.question;

  let (correct, timed_out) = match end {
    RoundEnd::Answered(given) => (answers_match(given, &question.answer), false),
    RoundEnd::TimedOut => (false, true),
  };

  let previous = session.tracker.score();
  session.tracker.record_attempt(&question.question, correct, time_spent);
  session.attempts += 1;
  let score = session.tracker.score();
  let score_delta = score as i64 - previous as i64;

  let feedback = feedback_text(correct, timed_out, &question.answer, time_spent, question.recommended_time, score_delta);
  info!(target: "quiz", id = %question.id, correct, timed_out, score_delta, score, level = session.tracker.current_level(), "Round resolved");

  Ok(AnswerOut {
    correct,
    timed_out,
    expected: question.answer,
    time_spent,
    score_delta,
    score,
    level: session.tracker.current_level(),
    streak: session.tracker.streak(),
    feedback,
  })
}

/// Resolve using the server clock for time spent.
pub fn resolve_round_now(session: &mut GameSession, end: RoundEnd<'_>) -> Result<AnswerOut, GameError> {
  let elapsed = session.elapsed_secs();
  resolve_round(session, end, elapsed)
}

/// Player-facing summary of a round, one item per line.
pub fn feedback_text(
  correct: bool,
  timed_out: bool,
  expected: &str,
  time_spent: f64,
  recommended_time: u32,
  score_delta: i64,
) -> String {
  let mut lines = Vec::new();
  if correct {
    let speed = if time_spent < recommended_time as f64 { "Fast!" } else { "Good" };
    lines.push(format!("Correct! {}", speed));
    lines.push(format!("Time: {:.1}s", time_spent));
    if score_delta > 0 { lines.push(format!("+{} points", score_delta)); }
  } else {
    let head = if timed_out { "Time's up!" } else { "Incorrect." };
    lines.push(format!("{} Answer: {}", head, expected));
    if score_delta < 0 { lines.push(format!("{} points", score_delta)); }
  }
  lines.join("\n")
}

/// Push the session's score, level and the attempts made since the last save.
#[instrument(level = "info", skip(state, session), fields(session_id = %session.id, %player_id))]
pub async fn save_progress(state: &AppState, session: &mut GameSession, player_id: &str) -> Result<ProgressRecord, GameError> {
  let snapshot = session.tracker.snapshot();
  let fresh = session.unsaved_attempts();
  let update = ProgressUpdate {
    high_score: snapshot.score,
    current_level: snapshot.current_level,
    history: snapshot.history[snapshot.history.len() - fresh..].iter().map(ProgressEntry::from).collect(),
  };
  let record = state.progress.update(player_id, update).await.map_err(|e| {
    error!(target: "quiz", %player_id, error = %e, "Progress update failed");
    GameError::from(e)
  })?;
  session.saved_attempts = session.attempts;
  info!(target: "quiz", %player_id, entries = fresh, "Progress saved");
  Ok(record)
}
