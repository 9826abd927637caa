//! Application state: question source, progress store, and the session registry.
//!
//! This module owns:
//!   - the question source (chat-completions service or offline bank)
//!   - the progress store
//!   - live game sessions keyed by session id
//!
//! Each session sits behind its own mutex so a tracker only ever has one writer.

use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::load_quiz_config_from_env;
use crate::openai::{OpenAI, OpenAiQuestionSource};
use crate::progress::{InMemoryProgressStore, ProgressStore};
use crate::questions::{LocalBankQuestionSource, QuestionSource};
use crate::seeds::seed_questions;
use crate::session::GameSession;

pub type SharedSession = Arc<Mutex<GameSession>>;

#[derive(Clone)]
pub struct AppState {
    pub questions: Arc<dyn QuestionSource>,
    pub progress: Arc<dyn ProgressStore>,
    pub sessions: Arc<RwLock<HashMap<String, SharedSession>>>,
}

impl AppState {
    /// Build state from env: load config, pick the question source, init the store.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_quiz_config_from_env().unwrap_or_default();

        let questions: Arc<dyn QuestionSource> = match OpenAI::from_env() {
            Some(client) => {
                info!(target: "mathquiz_backend", base_url = %client.base_url, model = %client.model, "OpenAI question generation enabled.");
                Arc::new(OpenAiQuestionSource { client, prompts: cfg.prompts.clone() })
            }
            None => {
                let bank = LocalBankQuestionSource::new(&cfg.questions, seed_questions());
                info!(target: "mathquiz_backend", questions = bank.len(), "OpenAI disabled (no OPENAI_API_KEY). Using local question bank.");
                Arc::new(bank)
            }
        };

        Self::with_parts(questions, Arc::new(InMemoryProgressStore::new()))
    }

    pub fn with_parts(questions: Arc<dyn QuestionSource>, progress: Arc<dyn ProgressStore>) -> Self {
        Self {
            questions,
            progress,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a fresh session with a default tracker.
    #[instrument(level = "debug", skip(self))]
    pub async fn create_session(&self) -> (String, SharedSession) {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(GameSession::new(id.clone())));
        self.sessions.write().await.insert(id.clone(), session.clone());
        info!(target: "quiz", session_id = %id, "Session created");
        (id, session)
    }

    pub async fn get_session(&self, id: &str) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn remove_session(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!(target: "quiz", session_id = %id, "Session ended");
        }
        removed
    }

    /// Drop sessions idle longer than `max_idle`. Sessions busy in a handler are kept.
    #[instrument(level = "debug", skip(self))]
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| match s.try_lock() {
            Ok(guard) => guard.idle_for() <= max_idle,
            Err(_) => true,
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(target: "quiz", pruned, remaining = sessions.len(), "Pruned idle sessions");
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::InMemoryProgressStore;

    fn state() -> AppState {
        AppState::with_parts(
            Arc::new(LocalBankQuestionSource::new(&[], seed_questions())),
            Arc::new(InMemoryProgressStore::new()),
        )
    }

    #[tokio::test]
    async fn sessions_get_independent_trackers() {
        let st = state();
        let (a, sa) = st.create_session().await;
        let (b, _) = st.create_session().await;
        assert_ne!(a, b);

        sa.lock().await.tracker.record_attempt("1+1", false, 3.0);
        let sb = st.get_session(&b).await.unwrap();
        assert_eq!(sb.lock().await.tracker.score(), 100);
        assert_eq!(st.get_session(&a).await.unwrap().lock().await.tracker.score(), 75);
    }

    #[tokio::test]
    async fn removed_sessions_are_gone() {
        let st = state();
        let (id, _) = st.create_session().await;
        assert!(st.remove_session(&id).await);
        assert!(!st.remove_session(&id).await);
        assert!(st.get_session(&id).await.is_none());
    }

    #[tokio::test]
    async fn idle_sessions_are_pruned() {
        let st = state();
        let (id, _) = st.create_session().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(st.prune_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(st.prune_idle(Duration::from_millis(5)).await, 1);
        assert!(st.get_session(&id).await.is_none());
    }
}
