//! Game sessions: one performance tracker plus the round currently in play.

use std::time::{Duration, Instant};

use crate::domain::Question;
use crate::tracker::PerformanceTracker;

/// Question handed out and when the clock started.
#[derive(Clone, Debug)]
pub struct ActiveRound {
  pub question: Question,
  pub started_at: Instant,
}

#[derive(Debug)]
pub struct GameSession {
  pub id: String,
  pub tracker: PerformanceTracker,
  pub current: Option<ActiveRound>,
  pub last_active: Instant,
  /// Rounds resolved in this session.
  pub attempts: usize,
  /// Value of `attempts` at the last successful progress save.
  pub saved_attempts: usize,
}

impl GameSession {
  pub fn new(id: String) -> Self {
    Self {
      id,
      tracker: PerformanceTracker::new(),
      current: None,
      last_active: Instant::now(),
      attempts: 0,
      saved_attempts: 0,
    }
  }

  /// Seconds since the active round started (0 when idle).
  pub fn elapsed_secs(&self) -> f64 {
    self.current
      .as_ref()
      .map(|r| r.started_at.elapsed().as_secs_f64())
      .unwrap_or(0.0)
  }

  /// Rounds resolved since the last save, bounded by what the tracker still holds.
  pub fn unsaved_attempts(&self) -> usize {
    (self.attempts - self.saved_attempts).min(self.tracker.snapshot().history.len())
  }

  pub fn touch(&mut self) {
    self.last_active = Instant::now();
  }

  pub fn idle_for(&self) -> Duration {
    self.last_active.elapsed()
  }
}
