//! Question sources: the seam between the game and whatever produces questions.
//!
//! The game only sees `QuestionSource`. Two implementations ship:
//!   - `OpenAiQuestionSource` (in `openai.rs`), used when OPENAI_API_KEY is set
//!   - `LocalBankQuestionSource`, an offline bank built from TOML + built-in seeds

use std::collections::HashMap;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::QuestionCfg;
use crate::domain::{Question, QuestionSourceKind};
use crate::error::QuestionError;
use crate::tracker::{QuestionRequest, MAX_LEVEL, MIN_LEVEL};

#[async_trait]
pub trait QuestionSource: Send + Sync {
  /// Short label used in logs.
  fn name(&self) -> &'static str;

  async fn next_question(&self, req: &QuestionRequest) -> Result<Question, QuestionError>;
}

/// Integer bucket (1..=5) for a continuous level.
pub fn level_bucket(level: f64) -> u8 {
  let l = if level.is_finite() { level } else { MIN_LEVEL };
  l.round().clamp(MIN_LEVEL, MAX_LEVEL) as u8
}

pub struct LocalBankQuestionSource {
  by_level: HashMap<u8, Vec<Question>>,
}

impl LocalBankQuestionSource {
  /// Build the bank from config entries followed by seeds. Entries with an
  /// out-of-range level or empty text are skipped.
  #[instrument(level = "info", skip_all, fields(configured = configured.len(), seeds = seeds.len()))]
  pub fn new(configured: &[QuestionCfg], seeds: Vec<QuestionCfg>) -> Self {
    let mut by_level: HashMap<u8, Vec<Question>> = HashMap::new();

    let tagged = configured.iter().cloned().map(|c| (c, QuestionSourceKind::LocalBank))
      .chain(seeds.into_iter().map(|c| (c, QuestionSourceKind::Seed)));

    for (cfg, source) in tagged {
      if !(1..=5).contains(&cfg.level) || cfg.question.trim().is_empty() || cfg.answer.trim().is_empty() {
        warn!(target: "quiz", level = cfg.level, question = %cfg.question, "Skipping bank item: bad level or empty text");
        continue;
      }
      let pool = by_level.entry(cfg.level).or_default();
      // Config entries come first, so they win over seeds with the same text.
      if pool.iter().any(|q| q.question == cfg.question) {
        continue;
      }
      pool.push(Question {
        id: cfg.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
        question: cfg.question,
        answer: cfg.answer,
        difficulty: cfg.level as f64,
        estimated_time: cfg.estimated_time.unwrap_or(20.0),
        operations: cfg.operations,
        recommended_time: 0,
        source,
      });
    }

    for level in 1..=5u8 {
      let n = by_level.get(&level).map(|v| v.len()).unwrap_or(0);
      info!(target: "quiz", level, questions = n, "Local bank inventory");
    }
    Self { by_level }
  }

  pub fn len(&self) -> usize {
    self.by_level.values().map(|v| v.len()).sum()
  }
}

#[async_trait]
impl QuestionSource for LocalBankQuestionSource {
  fn name(&self) -> &'static str { "local_bank" }

  #[instrument(level = "debug", skip(self, req), fields(level = req.current_level))]
  async fn next_question(&self, req: &QuestionRequest) -> Result<Question, QuestionError> {
    let level = level_bucket(req.current_level);

    // Player's own level first, then the nearest levels (lower wins a tie).
    let mut order: Vec<u8> = (1..=5).collect();
    order.sort_by_key(|l| ((*l as i16 - level as i16).abs(), *l));

    for served in order {
      let unused: Vec<&Question> = self.by_level
        .get(&served)
        .map(|pool| pool.iter().filter(|q| !req.used_questions.contains(&q.question)).collect())
        .unwrap_or_default();

      let mut rng = rand::thread_rng();
      if let Some(chosen) = unused.choose(&mut rng) {
        if served != level {
          info!(target: "quiz", level, served, "Level pool used up; serving from nearest level");
        }
        debug!(target: "quiz", level = served, id = %chosen.id, remaining = unused.len() - 1, "Local bank question chosen");
        return Ok((*chosen).clone());
      }
    }
    Err(QuestionError::Exhausted { level })
  }
}
