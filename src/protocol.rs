//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Question, QuestionSourceKind};
use crate::progress::{ProgressEntry, ProgressRecord};
use crate::tracker::PerformanceSnapshot;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    NewQuestion,
    SubmitAnswer {
        answer: String,
    },
    Timeout,
    Performance,
    SaveProgress {
        #[serde(rename = "playerId")]
        player_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Question {
        question: QuestionOut,
    },
    AnswerResult {
        result: AnswerOut,
    },
    Performance {
        snapshot: PerformanceSnapshot,
    },
    Progress {
        record: ProgressRecord,
    },
    Error {
        message: String,
    },
}

/// DTO used by both WS and HTTP for question delivery. Never carries the answer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    pub id: String,
    pub question: String,
    pub difficulty: f64,
    pub estimated_time: f64,
    pub operations: Vec<String>,
    pub recommended_time: u32,
    pub source: QuestionSourceKind,
    /// Player level when the question was handed out.
    pub level: f64,
}

/// Convert a `Question` (internal) to the public DTO.
pub fn to_out(q: &Question, level: f64) -> QuestionOut {
    QuestionOut {
        id: q.id.clone(),
        question: q.question.clone(),
        difficulty: q.difficulty,
        estimated_time: q.estimated_time,
        operations: q.operations.clone(),
        recommended_time: q.recommended_time,
        source: q.source,
        level,
    }
}

/// Outcome of a round, shared by answer and timeout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOut {
    pub correct: bool,
    pub timed_out: bool,
    pub expected: String,
    pub time_spent: f64,
    pub score_delta: i64,
    pub score: u32,
    pub level: f64,
    pub streak: u32,
    pub feedback: String,
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct SessionOut {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub answer: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdateIn {
    pub player_id: String,
    pub high_score: u32,
    pub current_level: f64,
    #[serde(default)]
    pub history: Vec<ProgressEntry>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
