//! WebSocket upgrade + message loop. Each connection owns one game session;
//! each client message is parsed as JSON and answered with a single JSON message.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::error::GameError;
use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::GameSession;
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "mathquiz_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  // Connection-local session: never shared, so no registry entry.
  let mut session = GameSession::new(uuid::Uuid::new_v4().to_string());
  info!(target: "mathquiz_backend", session_id = %session.id, "WebSocket connected");

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "mathquiz_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &mut session).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "mathquiz_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "mathquiz_backend", session_id = %session.id, score = session.tracker.score(), "WebSocket disconnected");
}

fn ws_error(e: GameError) -> ServerWsMessage {
  let message = match e {
    GameError::Question(_) => RETRY_MESSAGE.to_string(),
    GameError::Store(_) => "Server error".to_string(),
    other => other.to_string(),
  };
  ServerWsMessage::Error { message }
}

#[instrument(level = "info", skip(state, session), fields(session_id = %session.id))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, session: &mut GameSession) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::NewQuestion => match start_round(state, session).await {
      Ok(question) => {
        info!(target: "quiz", id = %question.id, "WS question served");
        ServerWsMessage::Question { question }
      }
      Err(e) => ws_error(e),
    },

    ClientWsMessage::SubmitAnswer { answer } => match resolve_round_now(session, RoundEnd::Answered(&answer)) {
      Ok(result) => ServerWsMessage::AnswerResult { result },
      Err(e) => ws_error(e),
    },

    ClientWsMessage::Timeout => match resolve_round_now(session, RoundEnd::TimedOut) {
      Ok(result) => ServerWsMessage::AnswerResult { result },
      Err(e) => ws_error(e),
    },

    ClientWsMessage::Performance => ServerWsMessage::Performance { snapshot: session.tracker.snapshot() },

    ClientWsMessage::SaveProgress { player_id } => match save_progress(state, session, &player_id).await {
      Ok(record) => ServerWsMessage::Progress { record },
      Err(e) => ws_error(e),
    },
  }
}
