//! Built-in question bank so the game is playable without config or an API key.

use crate::config::QuestionCfg;

fn q(level: u8, question: &str, answer: &str, estimated_time: f64, operations: &[&str]) -> QuestionCfg {
  QuestionCfg {
    id: None,
    level,
    question: question.into(),
    answer: answer.into(),
    estimated_time: Some(estimated_time),
    operations: operations.iter().map(|s| s.to_string()).collect(),
  }
}

/// A few questions per level, following the level guidelines used in prompts.
pub fn seed_questions() -> Vec<QuestionCfg> {
  vec![
    q(1, "45 × 8", "360", 15.0, &["multiplication"]),
    q(1, "√144", "12", 10.0, &["square root"]),
    q(1, "72 + 59", "131", 10.0, &["addition"]),
    q(1, "96 ÷ 4", "24", 12.0, &["division"]),
    q(2, "125 × 4 + 50", "550", 20.0, &["multiplication", "addition"]),
    q(2, "300 − 7 × 12", "216", 20.0, &["multiplication", "subtraction"]),
    q(2, "81 ÷ 9 + 37", "46", 18.0, &["division", "addition"]),
    q(3, "234 × 6 ÷ 3", "468", 25.0, &["multiplication", "division"]),
    q(3, "(48 + 27) × 4", "300", 25.0, &["addition", "multiplication"]),
    q(3, "720 ÷ 8 − 15 × 3", "45", 30.0, &["division", "multiplication", "subtraction"]),
    q(4, "√3025 + 15 × 12", "235", 35.0, &["square root", "multiplication", "addition"]),
    q(4, "√1764 × 3 − 26", "100", 35.0, &["square root", "multiplication", "subtraction"]),
    q(4, "365 × 4 ÷ 5 + 18", "310", 35.0, &["multiplication", "division", "addition"]),
    q(5, "1500 ÷ 25 × 16 + √900", "990", 45.0, &["division", "multiplication", "square root", "addition"]),
    q(5, "√2025 × 12 − 840 ÷ 35", "516", 45.0, &["square root", "multiplication", "division", "subtraction"]),
    q(5, "(175 + 325) × 18 ÷ 45", "200", 40.0, &["addition", "multiplication", "division"]),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_level_has_seeds() {
    let seeds = seed_questions();
    for level in 1..=5u8 {
      assert!(seeds.iter().any(|s| s.level == level), "missing level {level}");
    }
  }
}
