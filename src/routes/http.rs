//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{error, info, instrument};

use crate::error::GameError;
use crate::logic::*;
use crate::progress::ProgressUpdate;
use crate::protocol::*;
use crate::state::{AppState, SharedSession};

/// Error wrapper turning `GameError` into a status code + `{message}` body.
pub struct ApiError(pub GameError);

impl From<GameError> for ApiError {
  fn from(e: GameError) -> Self { ApiError(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self.0 {
      GameError::UnknownSession { .. } => (StatusCode::NOT_FOUND, self.0.to_string()),
      GameError::NoActiveQuestion | GameError::RoundInProgress => (StatusCode::CONFLICT, self.0.to_string()),
      GameError::Question(_) => (StatusCode::BAD_GATEWAY, RETRY_MESSAGE.to_string()),
      GameError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string()),
    };
    (status, Json(ErrorOut { message })).into_response()
  }
}

async fn lookup(state: &AppState, session_id: &str) -> Result<SharedSession, ApiError> {
  state
    .get_session(session_id)
    .await
    .ok_or_else(|| ApiError(GameError::UnknownSession { session_id: session_id.to_string() }))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let (session_id, _) = state.create_session().await;
  (StatusCode::CREATED, Json(SessionOut { session_id }))
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
  if state.remove_session(&session_id).await {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(GameError::UnknownSession { session_id }.into())
  }
}

#[instrument(level = "info", skip(state, body), fields(session_id = %body.session_id))]
pub async fn http_new_question(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionIn>,
) -> Result<Json<QuestionOut>, ApiError> {
  let session = lookup(&state, &body.session_id).await?;
  let mut guard = session.lock().await;
  let q = start_round(&state, &mut guard).await?;
  info!(target: "quiz", session_id = %body.session_id, id = %q.id, "HTTP question served");
  Ok(Json(q))
}

#[instrument(level = "info", skip(state, body), fields(session_id = %body.session_id, answer_len = body.answer.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<AnswerOut>, ApiError> {
  let session = lookup(&state, &body.session_id).await?;
  let mut guard = session.lock().await;
  let out = resolve_round_now(&mut guard, RoundEnd::Answered(&body.answer))?;
  info!(target: "quiz", session_id = %body.session_id, correct = out.correct, score = out.score, "HTTP answer evaluated");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(session_id = %body.session_id))]
pub async fn http_post_timeout(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionIn>,
) -> Result<Json<AnswerOut>, ApiError> {
  let session = lookup(&state, &body.session_id).await?;
  let mut guard = session.lock().await;
  let out = resolve_round_now(&mut guard, RoundEnd::TimedOut)?;
  info!(target: "quiz", session_id = %body.session_id, score = out.score, "HTTP timeout recorded");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(session_id = %q.session_id))]
pub async fn http_get_performance(
  State(state): State<Arc<AppState>>,
  Query(q): Query<SessionQuery>,
) -> Result<impl IntoResponse, ApiError> {
  let session = lookup(&state, &q.session_id).await?;
  let snapshot = session.lock().await.tracker.snapshot();
  Ok(Json(snapshot))
}

#[instrument(level = "info", skip(state), fields(%player_id))]
pub async fn http_get_progress(
  State(state): State<Arc<AppState>>,
  Path(player_id): Path<String>,
) -> Response {
  match state.progress.get(&player_id).await {
    Ok(Some(record)) => Json(record).into_response(),
    Ok(None) => (StatusCode::NOT_FOUND, Json(ErrorOut { message: "Progress not found".into() })).into_response(),
    Err(e) => {
      error!(target: "quiz", %player_id, error = %e, "Progress lookup failed");
      ApiError(GameError::Store(e)).into_response()
    }
  }
}

#[instrument(level = "info", skip(state, body), fields(player_id = %body.player_id, high_score = body.high_score))]
pub async fn http_post_progress_update(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ProgressUpdateIn>,
) -> Result<impl IntoResponse, ApiError> {
  let update = ProgressUpdate {
    high_score: body.high_score,
    current_level: body.current_level,
    history: body.history,
  };
  let record = state.progress.update(&body.player_id, update).await.map_err(|e| {
    error!(target: "quiz", player_id = %body.player_id, error = %e, "Progress update failed");
    ApiError(GameError::Store(e))
  })?;
  Ok(Json(record))
}
