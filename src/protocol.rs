//! Request/response DTOs for the HTTP endpoints (serde ready, camelCase wire
//! names). Keep this small and stable to evolve backend and client
//! independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{GeneratedTest, QuestionRecord};

//
// Request bodies. Every field is optional; absent bodies deserialize to
// defaults and the pipelines fill in the documented fallbacks.
//

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionIn {
    pub exam_type: Option<String>,
    pub subject: Option<String>,
    pub difficulty: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveDoubtIn {
    pub question: Option<String>,
    pub subject: Option<String>,
    pub student_grade: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTestIn {
    pub exam_type: Option<String>,
    pub subject: Option<String>,
    pub count: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainConceptIn {
    pub concept: Option<String>,
    pub subject: Option<String>,
    pub level: Option<String>,
}

//
// Success bodies.
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    pub success: bool,
    #[serde(flatten)]
    pub question: QuestionRecord,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoubtOut {
    pub success: bool,
    pub question: String,
    pub solution: String,
    pub solved_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOut {
    pub success: bool,
    #[serde(flatten)]
    pub test: GeneratedTest,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptOut {
    pub success: bool,
    pub concept: String,
    pub explanation: String,
    pub explained_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOut {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub upstream_connected: bool,
    pub message: String,
}

//
// Error bodies.
//

/// 400: caller input rejected before any upstream call.
#[derive(Debug, Serialize)]
pub struct BadRequestOut {
    pub error: String,
}

/// 429: emitted by the admission gate.
#[derive(Debug, Serialize)]
pub struct RateLimitedOut {
    pub error: String,
    pub message: String,
}

/// 500: generation failed. `fallback_question` is attached only by the
/// question endpoint; a success response never carries it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationFailedOut {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_question: Option<QuestionRecord>,
}
