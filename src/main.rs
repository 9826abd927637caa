//! Adaptive Math Quiz · Backend
//!
//! - Axum HTTP + WebSocket API
//! - Per-session performance tracker driving level and score
//! - Question generation via an OpenAI-compatible service, or an offline bank
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   OPENAI_API_KEY    : enables generated questions if present
//!   OPENAI_BASE_URL   : default "https://api.openai.com/v1" (DeepSeek etc. work too)
//!   OPENAI_MODEL      : default "gpt-4o-mini"
//!   QUIZ_CONFIG_PATH  : path to TOML config (prompts + optional question bank)
//!   SESSION_IDLE_SECS : drop HTTP sessions idle this long (default 7200)
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default), "compact" or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod seeds;
mod tracker;
mod questions;
mod openai;
mod progress;
mod session;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (question source, progress store, sessions).
  let state = Arc::new(AppState::new());

  // Periodically drop abandoned HTTP sessions.
  let idle = std::env::var("SESSION_IDLE_SECS")
    .ok()
    .and_then(|s| s.parse::<u64>().ok())
    .map(Duration::from_secs)
    .unwrap_or(Duration::from_secs(2 * 60 * 60));
  let sweeper = state.clone();
  tokio::spawn(async move {
    let mut tick = tokio::time::interval(Duration::from_secs(60));
    loop {
      tick.tick().await;
      sweeper.prune_idle(idle).await;
    }
  });

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "mathquiz_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
