//! Loading quiz configuration (prompts + optional question bank) from TOML.
//!
//! See `QuizConfig` and `Prompts` for expected schema.

use serde::Deserialize;
use tracing::{info, error};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub questions: Vec<QuestionCfg>,
}

/// Question entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCfg {
  #[serde(default)] pub id: Option<String>,
  /// Integer level 1..=5 the question belongs to.
  pub level: u8,
  pub question: String,
  pub answer: String,
  #[serde(default)] pub estimated_time: Option<f64>,
  #[serde(default)] pub operations: Vec<String>,
}

/// Prompts used by the question generator.
///
/// Placeholders: `{level}`, `{failures}`, `{used_questions}`, `{easier_hint}`,
/// `{recent_performance}` and `{difficulty}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub question_system: String,
  pub question_user_template: String,
  /// Appended to the user prompt when the player has recent failures.
  pub easier_hint: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      question_system: "You are an adaptive mathematics challenge generator.
Current level: {level}
Recent failures: {failures}

Rules for question generation:
1. If user has recent failures, generate slightly easier questions
2. Gradually increase complexity as user succeeds
3. Focus on building confidence after failures
4. Ensure questions are engaging and varied

Difficulty guidelines:
Level 1: Simple calculations (e.g., 45×8, √144)
Level 2: Two-step operations (e.g., 125×4+50)
Level 3: Mixed operations (e.g., 234×6÷3)
Level 4: Complex calculations (e.g., √3025+15×12)
Level 5: Advanced problems (e.g., 1500÷25×16+√900)

NEVER repeat these questions: {used_questions}".into(),
      question_user_template: "Generate a level {difficulty} question.
{easier_hint}
Recent performance: {recent_performance}

Return in this exact JSON format:
{
  \"question\": \"the math expression\",
  \"answer\": \"numerical answer only\",
  \"difficulty\": {difficulty},
  \"estimated_time\": number (seconds),
  \"operations\": [\"operations used\"]
}".into(),
      easier_hint: "Make it slightly easier to help build confidence.".into(),
    }
  }
}

/// Parse a TOML config string.
pub fn parse_quiz_config(s: &str) -> Result<QuizConfig, toml::de::Error> {
  toml::from_str::<QuizConfig>(s)
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_quiz_config_from_env() -> Option<QuizConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_quiz_config(&s) {
      Ok(cfg) => {
        info!(target: "mathquiz_backend", %path, questions = cfg.questions.len(), "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "mathquiz_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "mathquiz_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
