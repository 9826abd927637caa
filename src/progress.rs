//! Player progress storage: high score, last level, games played and a capped history.
//!
//! Merge rules on update:
//!   - high score only ever goes up
//!   - current level is overwritten
//!   - incoming history is appended, keeping the newest 50 entries
//!   - games played is incremented

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::tracker::AttemptRecord;

pub const SERVER_HISTORY_CAP: usize = 50;

/// One stored history item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
  pub question: String,
  #[serde(default)] pub answer: Option<String>,
  pub correct: bool,
  pub time_spent: f64,
  pub difficulty: f64,
  #[serde(default = "Utc::now")] pub timestamp: DateTime<Utc>,
}

impl From<&AttemptRecord> for ProgressEntry {
  fn from(r: &AttemptRecord) -> Self {
    Self {
      question: r.question.clone(),
      answer: None,
      correct: r.correct,
      time_spent: r.time_spent,
      difficulty: r.level,
      timestamp: r.timestamp,
    }
  }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
  pub player_id: String,
  pub high_score: u32,
  pub current_level: f64,
  pub total_games_played: u32,
  pub history: Vec<ProgressEntry>,
  pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
  fn new(player_id: &str) -> Self {
    Self {
      player_id: player_id.to_string(),
      high_score: 0,
      current_level: 1.0,
      total_games_played: 0,
      history: Vec::new(),
      updated_at: Utc::now(),
    }
  }

  /// Apply one update following the merge rules above.
  pub fn merge(&mut self, update: ProgressUpdate) {
    self.high_score = self.high_score.max(update.high_score);
    self.current_level = update.current_level;
    self.total_games_played += 1;
    self.history.extend(update.history);
    let overflow = self.history.len().saturating_sub(SERVER_HISTORY_CAP);
    if overflow > 0 {
      self.history.drain(..overflow);
    }
    self.updated_at = Utc::now();
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
  pub high_score: u32,
  pub current_level: f64,
  #[serde(default)] pub history: Vec<ProgressEntry>,
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
  async fn get(&self, player_id: &str) -> Result<Option<ProgressRecord>, StoreError>;

  /// Merge `update` into the player's record, creating it if needed.
  async fn update(&self, player_id: &str, update: ProgressUpdate) -> Result<ProgressRecord, StoreError>;
}

/// Process-local store; contents are lost on restart.
#[derive(Clone, Default)]
pub struct InMemoryProgressStore {
  records: Arc<RwLock<HashMap<String, ProgressRecord>>>,
}

impl InMemoryProgressStore {
  pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
  #[instrument(level = "debug", skip(self))]
  async fn get(&self, player_id: &str) -> Result<Option<ProgressRecord>, StoreError> {
    Ok(self.records.read().await.get(player_id).cloned())
  }

  #[instrument(level = "debug", skip(self, update), fields(high_score = update.high_score, entries = update.history.len()))]
  async fn update(&self, player_id: &str, update: ProgressUpdate) -> Result<ProgressRecord, StoreError> {
    let mut records = self.records.write().await;
    let record = records
      .entry(player_id.to_string())
      .or_insert_with(|| ProgressRecord::new(player_id));
    record.merge(update);
    debug!(target: "quiz", %player_id, high_score = record.high_score, games = record.total_games_played, "Progress updated");
    Ok(record.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(question: &str) -> ProgressEntry {
    ProgressEntry {
      question: question.into(),
      answer: Some("1".into()),
      correct: true,
      time_spent: 3.0,
      difficulty: 1.0,
      timestamp: Utc::now(),
    }
  }

  fn update(high_score: u32, current_level: f64, history: Vec<ProgressEntry>) -> ProgressUpdate {
    ProgressUpdate { high_score, current_level, history }
  }

  #[tokio::test]
  async fn unknown_player_has_no_record() {
    let store = InMemoryProgressStore::new();
    assert!(store.get("nobody").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn first_update_creates_record() {
    let store = InMemoryProgressStore::new();
    let rec = store.update("p1", update(240, 2.4, vec![entry("a")])).await.unwrap();
    assert_eq!(rec.high_score, 240);
    assert_eq!(rec.current_level, 2.4);
    assert_eq!(rec.total_games_played, 1);
    assert_eq!(rec.history.len(), 1);
    assert_eq!(store.get("p1").await.unwrap().unwrap().high_score, 240);
  }

  #[tokio::test]
  async fn high_score_keeps_maximum_and_level_is_overwritten() {
    let store = InMemoryProgressStore::new();
    store.update("p1", update(300, 3.0, vec![])).await.unwrap();
    let rec = store.update("p1", update(120, 1.6, vec![])).await.unwrap();
    assert_eq!(rec.high_score, 300);
    assert_eq!(rec.current_level, 1.6);
    assert_eq!(rec.total_games_played, 2);
  }

  #[tokio::test]
  async fn history_keeps_newest_fifty() {
    let store = InMemoryProgressStore::new();
    let first: Vec<_> = (0..30).map(|i| entry(&format!("a{i}"))).collect();
    let second: Vec<_> = (0..30).map(|i| entry(&format!("b{i}"))).collect();
    store.update("p1", update(10, 1.0, first)).await.unwrap();
    let rec = store.update("p1", update(10, 1.0, second)).await.unwrap();
    assert_eq!(rec.history.len(), SERVER_HISTORY_CAP);
    assert_eq!(rec.history[0].question, "a10");
    assert_eq!(rec.history.last().unwrap().question, "b29");
  }

  #[tokio::test]
  async fn players_are_isolated() {
    let store = InMemoryProgressStore::new();
    store.update("p1", update(50, 1.0, vec![])).await.unwrap();
    assert!(store.get("p2").await.unwrap().is_none());
  }

  #[test]
  fn update_accepts_camel_case_without_history() {
    let u: ProgressUpdate = serde_json::from_str(r#"{"highScore": 90, "currentLevel": 1.8}"#).unwrap();
    assert_eq!(u.high_score, 90);
    assert!(u.history.is_empty());
  }

  #[test]
  fn entry_from_attempt_keeps_level_as_difficulty() {
    let mut t = crate::tracker::PerformanceTracker::new();
    t.record_attempt("√144", true, 4.0);
    let e = ProgressEntry::from(&t.snapshot().history[0]);
    assert_eq!(e.difficulty, 1.0);
    assert_eq!(e.question, "√144");
    assert!(e.correct);
  }
}
