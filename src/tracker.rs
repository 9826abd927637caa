//! Adaptive performance tracker: level, score, streaks and solve-time estimate.
//!
//! One tracker lives per game session. It is mutated only through
//! `record_attempt`; everything else is a read-only projection.
//!
//! Level moves asymmetrically: it needs a 2-streak to climb (+0.2) but drops
//! on the first miss (-0.3, then -0.5 while the misses keep coming).

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const HISTORY_CAP: usize = 10;
pub const MIN_LEVEL: f64 = 1.0;
pub const MAX_LEVEL: f64 = 5.0;
pub const STARTING_SCORE: u32 = 100;
pub const STARTING_AVERAGE_TIME: f64 = 30.0;
pub const DEFAULT_RECENT: usize = 5;

const LEVEL_STEP_UP: f64 = 0.2;
const LEVEL_STEP_DOWN: f64 = 0.3;
const LEVEL_STEP_DOWN_REPEATED: f64 = 0.5;
const AVERAGE_TIME_KEEP: f64 = 0.7;
const AVERAGE_TIME_WEIGHT: f64 = 0.3;

const BASE_TIME_SECS: f64 = 20.0;
const MIN_RECOMMENDED_SECS: f64 = 15.0;
const MAX_RECOMMENDED_SECS: f64 = 60.0;

/// One answered (or timed-out) question.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
  pub question: String,
  pub correct: bool,
  pub time_spent: f64,
  /// Level the question was asked at, before this attempt moved it.
  pub level: f64,
  pub timestamp: DateTime<Utc>,
}

/// Read-only view of the tracker handed to API clients and collaborators.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSnapshot {
  pub history: Vec<AttemptRecord>,
  pub current_level: f64,
  pub score: u32,
  pub streak: u32,
  pub failures: u32,
  pub average_time: f64,
  pub used_questions: Vec<String>,
}

/// Everything the question generator needs to pick the next question.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
  pub current_level: f64,
  pub consecutive_failures: u32,
  pub recent_performance: Vec<AttemptRecord>,
  pub used_questions: Vec<String>,
  pub average_time: f64,
}

#[derive(Clone, Debug)]
pub struct PerformanceTracker {
  history: VecDeque<AttemptRecord>,
  used_questions: BTreeSet<String>,
  current_level: f64,
  score: u32,
  streak_count: u32,
  consecutive_failures: u32,
  average_time: f64,
}

impl Default for PerformanceTracker {
  fn default() -> Self {
    Self {
      history: VecDeque::with_capacity(HISTORY_CAP + 1),
      used_questions: BTreeSet::new(),
      current_level: MIN_LEVEL,
      score: STARTING_SCORE,
      streak_count: 0,
      consecutive_failures: 0,
      average_time: STARTING_AVERAGE_TIME,
    }
  }
}

impl PerformanceTracker {
  pub fn new() -> Self { Self::default() }

  pub fn current_level(&self) -> f64 { self.current_level }
  pub fn score(&self) -> u32 { self.score }
  pub fn streak(&self) -> u32 { self.streak_count }
  pub fn failures(&self) -> u32 { self.consecutive_failures }
  pub fn average_time(&self) -> f64 { self.average_time }

  /// Ingest one attempt and update level, score, counters and solve-time estimate.
  ///
  /// Negative or non-finite `time_spent` counts as 0 seconds.
  #[instrument(level = "debug", skip(self, question), fields(question_len = question.len()))]
  pub fn record_attempt(&mut self, question: &str, correct: bool, time_spent: f64) {
    let time_spent = if time_spent.is_finite() { time_spent.max(0.0) } else { 0.0 };

    self.used_questions.insert(question.to_string());

    self.history.push_back(AttemptRecord {
      question: question.to_string(),
      correct,
      time_spent,
      level: self.current_level,
      timestamp: Utc::now(),
    });
    while self.history.len() > HISTORY_CAP {
      self.history.pop_front();
    }

    if correct {
      self.consecutive_failures = 0;
      self.streak_count += 1;
      if self.streak_count >= 2 {
        self.current_level = (self.current_level + LEVEL_STEP_UP).min(MAX_LEVEL);
      }

      let speed_bonus = ((self.average_time - time_spent) * 2.0).max(0.0);
      let difficulty_bonus = self.current_level * 20.0;
      let streak_bonus = (self.streak_count.saturating_mul(10)).min(50) as f64;
      let gained = (speed_bonus + difficulty_bonus + streak_bonus).round() as u32;
      self.score = self.score.saturating_add(gained);
      debug!(target: "quiz", speed_bonus, difficulty_bonus, streak_bonus, gained, "Correct attempt scored");
    } else {
      self.streak_count = 0;
      self.consecutive_failures += 1;
      let decrease = if self.consecutive_failures > 1 { LEVEL_STEP_DOWN_REPEATED } else { LEVEL_STEP_DOWN };
      self.current_level = (self.current_level - decrease).max(MIN_LEVEL);

      // Penalty uses the level after the decrease.
      let penalty = (25.0 * self.current_level).round() as u32;
      self.score = self.score.saturating_sub(penalty);
      debug!(target: "quiz", decrease, penalty, failures = self.consecutive_failures, "Incorrect attempt penalized");
    }

    self.average_time = self.average_time * AVERAGE_TIME_KEEP + time_spent * AVERAGE_TIME_WEIGHT;
  }

  pub fn snapshot(&self) -> PerformanceSnapshot {
    PerformanceSnapshot {
      history: self.history.iter().cloned().collect(),
      current_level: self.current_level,
      score: self.score,
      streak: self.streak_count,
      failures: self.consecutive_failures,
      average_time: self.average_time,
      used_questions: self.used_questions.iter().cloned().collect(),
    }
  }

  /// Last `n` attempts, oldest first.
  pub fn recent_performance(&self, n: usize) -> Vec<AttemptRecord> {
    let skip = self.history.len().saturating_sub(n);
    self.history.iter().skip(skip).cloned().collect()
  }

  pub fn question_request(&self) -> QuestionRequest {
    QuestionRequest {
      current_level: self.current_level,
      consecutive_failures: self.consecutive_failures,
      recent_performance: self.recent_performance(DEFAULT_RECENT),
      used_questions: self.used_questions.iter().cloned().collect(),
      average_time: self.average_time,
    }
  }
}

/// Seconds the client should allow for a question of `difficulty`,
/// averaged with the player's own solve time and kept within [15, 60].
pub fn recommended_time(difficulty: f64, average_time: f64) -> u32 {
  let multiplier = 1.0 + (difficulty - 1.0) * 0.3;
  let adjusted = ((BASE_TIME_SECS * multiplier + average_time) / 2.0).round();
  // f64::max/min drop NaN, so non-finite inputs still land in range.
  adjusted.max(MIN_RECOMMENDED_SECS).min(MAX_RECOMMENDED_SECS) as u32
}

#[cfg(test)]
mod tests {
  use super::*;

  fn approx(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

  #[test]
  fn fresh_tracker_has_defaults() {
    let t = PerformanceTracker::new();
    let s = t.snapshot();
    assert!(s.history.is_empty());
    assert!(s.used_questions.is_empty());
    assert_eq!(s.current_level, 1.0);
    assert_eq!(s.score, 100);
    assert_eq!(s.streak, 0);
    assert_eq!(s.failures, 0);
    assert_eq!(s.average_time, 30.0);
  }

  #[test]
  fn first_correct_answer_scores_without_level_bump() {
    let mut t = PerformanceTracker::new();
    t.record_attempt("2+2", true, 10.0);
    assert!(approx(t.average_time(), 24.0));
    assert_eq!(t.streak(), 1);
    assert_eq!(t.current_level(), 1.0);
    // round(40 + 20 + 10) on top of the starting 100
    assert_eq!(t.score(), 170);
  }

  #[test]
  fn second_correct_answer_raises_level() {
    let mut t = PerformanceTracker::new();
    t.record_attempt("q1", true, 30.0);
    t.record_attempt("q2", true, 30.0);
    assert_eq!(t.streak(), 2);
    assert!(approx(t.current_level(), 1.2));
    // q1: 0 + 20 + 10 = 30, q2: 0 + 24 + 20 = 44
    assert_eq!(t.score(), 174);
  }

  #[test]
  fn first_miss_at_floor_costs_base_penalty() {
    let mut t = PerformanceTracker::new();
    t.record_attempt("q1", false, 30.0);
    assert_eq!(t.current_level(), 1.0);
    assert_eq!(t.failures(), 1);
    assert_eq!(t.score(), 75);
  }

  #[test]
  fn second_miss_uses_larger_decrease() {
    let mut t = PerformanceTracker::new();
    for i in 0..6 {
      t.record_attempt(&format!("c{i}"), true, 30.0);
    }
    // five bumps of 0.2 from level 1
    assert!(approx(t.current_level(), 2.0));

    t.record_attempt("m1", false, 30.0);
    assert!(approx(t.current_level(), 1.7));
    assert_eq!(t.failures(), 1);

    let before = t.score();
    t.record_attempt("m2", false, 30.0);
    assert!(approx(t.current_level(), 1.2));
    assert_eq!(t.failures(), 2);
    assert_eq!(t.score(), before - 30);
  }

  #[test]
  fn two_misses_from_defaults_stay_at_floor() {
    let mut t = PerformanceTracker::new();
    t.record_attempt("a", false, 5.0);
    t.record_attempt("b", false, 5.0);
    assert_eq!(t.current_level(), 1.0);
    assert_eq!(t.failures(), 2);
    assert_eq!(t.score(), 50);
  }

  #[test]
  fn score_never_goes_negative() {
    let mut t = PerformanceTracker::new();
    for i in 0..20 {
      t.record_attempt(&format!("q{i}"), false, 60.0);
      assert!(t.current_level() >= MIN_LEVEL);
    }
    assert_eq!(t.score(), 0);
  }

  #[test]
  fn level_is_capped_at_five() {
    let mut t = PerformanceTracker::new();
    for i in 0..40 {
      t.record_attempt(&format!("q{i}"), true, 1.0);
      assert!(t.current_level() <= MAX_LEVEL);
    }
    assert_eq!(t.current_level(), MAX_LEVEL);
  }

  #[test]
  fn streak_bonus_is_capped() {
    let mut t = PerformanceTracker::new();
    for i in 0..10 {
      t.record_attempt(&format!("q{i}"), true, 30.0);
    }
    let before = t.score();
    t.record_attempt("q10", true, 30.0);
    let level = t.current_level();
    let expected = ((30.0 - 30.0) * 2.0f64).max(0.0) + level * 20.0 + 50.0;
    // average time settles at 30 because every answer took 30s
    assert_eq!(t.score() - before, expected.round() as u32);
  }

  #[test]
  fn history_evicts_oldest_first() {
    let mut t = PerformanceTracker::new();
    for i in 1..=11 {
      t.record_attempt(&format!("q{i}"), i % 2 == 0, 10.0);
    }
    let s = t.snapshot();
    assert_eq!(s.history.len(), HISTORY_CAP);
    assert!(s.history.iter().all(|r| r.question != "q1"));
    assert_eq!(s.history.last().map(|r| r.question.as_str()), Some("q11"));
    assert_eq!(s.used_questions.len(), 11);
  }

  #[test]
  fn streak_and_failures_are_exclusive() {
    let mut t = PerformanceTracker::new();
    let pattern = [true, true, false, true, false, false, true, true, true, false];
    for (i, correct) in pattern.iter().enumerate() {
      t.record_attempt(&format!("q{i}"), *correct, 12.0);
      if *correct {
        assert!(t.streak() >= 1);
        assert_eq!(t.failures(), 0);
      } else {
        assert_eq!(t.streak(), 0);
        assert!(t.failures() >= 1);
      }
    }
  }

  #[test]
  fn history_records_level_before_attempt() {
    let mut t = PerformanceTracker::new();
    t.record_attempt("a", true, 10.0);
    t.record_attempt("b", true, 10.0);
    let s = t.snapshot();
    assert_eq!(s.history[1].level, 1.0);
    assert!(approx(s.current_level, 1.2));
  }

  #[test]
  fn accessors_are_idempotent() {
    let mut t = PerformanceTracker::new();
    t.record_attempt("x", true, 3.0);
    t.record_attempt("y", false, 8.0);
    assert_eq!(t.snapshot(), t.snapshot());
    assert_eq!(t.recent_performance(5), t.recent_performance(5));
  }

  #[test]
  fn recent_performance_returns_tail() {
    let mut t = PerformanceTracker::new();
    assert!(t.recent_performance(DEFAULT_RECENT).is_empty());
    for i in 0..8 {
      t.record_attempt(&format!("q{i}"), true, 10.0);
    }
    let recent = t.recent_performance(DEFAULT_RECENT);
    let names: Vec<_> = recent.iter().map(|r| r.question.as_str()).collect();
    assert_eq!(names, ["q3", "q4", "q5", "q6", "q7"]);
    assert_eq!(t.recent_performance(0).len(), 0);
    assert_eq!(t.recent_performance(50).len(), 8);
  }

  #[test]
  fn repeated_question_is_stored_once() {
    let mut t = PerformanceTracker::new();
    t.record_attempt("7*8", false, 10.0);
    t.record_attempt("7*8", true, 10.0);
    assert_eq!(t.snapshot().used_questions, vec!["7*8".to_string()]);
  }

  #[test]
  fn odd_inputs_do_not_break_invariants() {
    let mut t = PerformanceTracker::new();
    t.record_attempt("", true, -12.0);
    t.record_attempt("nan", false, f64::NAN);
    t.record_attempt("inf", true, f64::INFINITY);
    assert!(t.average_time() > 0.0);
    assert!(t.average_time().is_finite());
    assert!(t.snapshot().history.iter().all(|r| r.time_spent >= 0.0));
    assert!(t.snapshot().used_questions.contains(&String::new()));
  }

  #[test]
  fn question_request_mirrors_tracker() {
    let mut t = PerformanceTracker::new();
    t.record_attempt("1+1", false, 4.0);
    let req = t.question_request();
    assert_eq!(req.consecutive_failures, 1);
    assert_eq!(req.current_level, t.current_level());
    assert_eq!(req.used_questions, vec!["1+1".to_string()]);
    assert_eq!(req.recent_performance.len(), 1);
  }

  #[test]
  fn recommended_time_follows_formula() {
    // (20 + 30) / 2
    assert_eq!(recommended_time(1.0, 30.0), 25);
    // (20 * 1.6 + 30) / 2 = 31
    assert_eq!(recommended_time(3.0, 30.0), 31);
    // (20 * 2.2 + 24) / 2 = 34
    assert_eq!(recommended_time(5.0, 24.0), 34);
  }

  #[test]
  fn base_time_is_not_rounded_before_averaging() {
    // (21.2 + 29.9) / 2 = 25.55; rounding the base to 21 first would give 25
    assert_eq!(recommended_time(1.2, 29.9), 26);
  }

  #[test]
  fn recommended_time_is_bounded() {
    let cases = [
      (1.0, 0.0), (5.0, 500.0), (-10.0, -100.0), (100.0, 100.0),
      (f64::NAN, 30.0), (3.0, f64::INFINITY), (3.0, f64::NEG_INFINITY),
    ];
    for (d, avg) in cases {
      let t = recommended_time(d, avg);
      assert!((15..=60).contains(&t), "difficulty={d} avg={avg} gave {t}");
    }
  }
}
