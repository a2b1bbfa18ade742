//! Generation pipelines shared by the HTTP handlers.
//!
//! Each operation: validate caller input, render the prompt, call the
//! upstream with task-specific decoding parameters, extract/validate the
//! reply, and attach a server-assigned timestamp. Failures propagate as
//! `PipelineError`; the handlers decide status codes and fallback policy.

use chrono::Utc;
use tracing::{error, info, instrument};

use crate::domain::{GeneratedTest, GenerationTask};
use crate::error::PipelineError;
use crate::extract;
use crate::protocol::{
  ConceptOut, DoubtOut, ExplainConceptIn, GenerateQuestionIn, GenerateTestIn, QuestionOut,
  SolveDoubtIn, TestOut,
};
use crate::state::AppState;
use crate::upstream::decoding_for;
use crate::util::trunc_for_log;

const DEFAULT_TEST_COUNT: u32 = 5;

/// Absent or blank caller fields fall back to a fixed default.
fn or_default(value: Option<String>, default: &str) -> String {
  match value {
    Some(s) if !s.trim().is_empty() => s,
    _ => default.to_string(),
  }
}

#[instrument(level = "info", skip(state, body))]
pub async fn generate_question(
  state: &AppState,
  body: GenerateQuestionIn,
) -> Result<QuestionOut, PipelineError> {
  let task = GenerationTask::Question {
    exam_type: or_default(body.exam_type, "JEE"),
    subject: or_default(body.subject, "Mathematics"),
    difficulty: or_default(body.difficulty, "medium"),
    topic: or_default(body.topic, "Algebra"),
  };
  let prompt = state.prompts.render(&task);
  let raw = state.upstream.chat(&prompt, decoding_for(&task)).await?;

  let question = match extract::extract_question(&raw) {
    Ok(q) => q,
    Err(e) => {
      error!(target: "pipeline", error = %e, raw_preview = %trunc_for_log(&raw, 160), "Model reply failed question extraction");
      return Err(e.into());
    }
  };

  info!(target: "pipeline", topic = %question.topic, difficulty = %question.difficulty, "Question generated");
  Ok(QuestionOut { success: true, question, generated_at: Utc::now() })
}

#[instrument(level = "info", skip(state, body), fields(question_len = body.question.as_deref().map(str::len).unwrap_or(0)))]
pub async fn solve_doubt(state: &AppState, body: SolveDoubtIn) -> Result<DoubtOut, PipelineError> {
  // Required input; rejected before the upstream is ever touched.
  let question = match body.question {
    Some(q) if !q.trim().is_empty() => q,
    _ => return Err(PipelineError::BadRequest("Question is required".into())),
  };

  let task = GenerationTask::Doubt {
    question: question.clone(),
    subject: or_default(body.subject, "General"),
    student_grade: or_default(body.student_grade, "12th"),
  };
  let prompt = state.prompts.render(&task);
  let solution = state.upstream.chat(&prompt, decoding_for(&task)).await?;

  info!(target: "pipeline", solution_len = solution.len(), "Doubt solved");
  Ok(DoubtOut { success: true, question, solution, solved_at: Utc::now() })
}

#[instrument(level = "info", skip(state, body))]
pub async fn generate_test(state: &AppState, body: GenerateTestIn) -> Result<TestOut, PipelineError> {
  let exam_type = or_default(body.exam_type, "JEE Mains");
  let subject = or_default(body.subject, "Physics");
  let count = body.count.unwrap_or(DEFAULT_TEST_COUNT);
  let task =
    GenerationTask::Test { exam_type: exam_type.clone(), subject: subject.clone(), count };
  let prompt = state.prompts.render(&task);
  let raw = state.upstream.chat(&prompt, decoding_for(&task)).await?;

  let questions = match extract::extract_test_questions(&raw) {
    Ok(qs) => qs,
    Err(e) => {
      error!(target: "pipeline", error = %e, raw_preview = %trunc_for_log(&raw, 160), "Model reply failed test extraction");
      return Err(e.into());
    }
  };

  // Totals and duration are derived here, never read from the model reply.
  let test = GeneratedTest::assemble(exam_type, subject, questions);
  info!(target: "pipeline", total_questions = test.total_questions, total_marks = test.total_marks, "Test assembled");
  Ok(TestOut { success: true, test, generated_at: Utc::now() })
}

#[instrument(level = "info", skip(state, body))]
pub async fn explain_concept(
  state: &AppState,
  body: ExplainConceptIn,
) -> Result<ConceptOut, PipelineError> {
  let concept = match body.concept {
    Some(c) if !c.trim().is_empty() => c,
    _ => return Err(PipelineError::BadRequest("Concept is required".into())),
  };

  let task = GenerationTask::Concept {
    concept: concept.clone(),
    subject: or_default(body.subject, "Science"),
    level: or_default(body.level, "Intermediate"),
  };
  let prompt = state.prompts.render(&task);
  let explanation = state.upstream.chat(&prompt, decoding_for(&task)).await?;

  info!(target: "pipeline", explanation_len = explanation.len(), "Concept explained");
  Ok(ConceptOut { success: true, concept, explanation, explained_at: Utc::now() })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{Prompts, Settings};
  use crate::error::UpstreamError;
  use crate::ratelimit::RateLimiter;
  use crate::upstream::UpstreamClient;

  /// State with no upstream key: any attempted call yields an auth failure,
  /// which doubles as proof that validation rejected input before calling out.
  fn keyless_state() -> AppState {
    AppState {
      settings: Settings { port: 0, rate_limit: 5, database_url: None },
      prompts: Prompts::default(),
      limiter: RateLimiter::new(5),
      upstream: UpstreamClient::new(None, "http://127.0.0.1:1".into(), "test-model".into()),
    }
  }

  #[test]
  fn absent_and_blank_fields_fall_back_to_defaults() {
    assert_eq!(or_default(None, "JEE"), "JEE");
    assert_eq!(or_default(Some("  ".into()), "Mathematics"), "Mathematics");
    assert_eq!(or_default(Some("NEET".into()), "JEE"), "NEET");
  }

  #[tokio::test]
  async fn solve_doubt_rejects_missing_question_without_calling_upstream() {
    let state = keyless_state();
    let err = solve_doubt(&state, SolveDoubtIn::default()).await.unwrap_err();
    match err {
      PipelineError::BadRequest(m) => assert_eq!(m, "Question is required"),
      other => panic!("expected BadRequest, got {other}"),
    }
  }

  #[tokio::test]
  async fn solve_doubt_rejects_blank_question() {
    let state = keyless_state();
    let body = SolveDoubtIn { question: Some("   ".into()), ..Default::default() };
    let err = solve_doubt(&state, body).await.unwrap_err();
    assert!(matches!(err, PipelineError::BadRequest(_)));
  }

  #[tokio::test]
  async fn explain_concept_rejects_missing_concept() {
    let state = keyless_state();
    let err = explain_concept(&state, ExplainConceptIn::default()).await.unwrap_err();
    match err {
      PipelineError::BadRequest(m) => assert_eq!(m, "Concept is required"),
      other => panic!("expected BadRequest, got {other}"),
    }
  }

  #[tokio::test]
  async fn unconfigured_upstream_surfaces_auth_failure() {
    let state = keyless_state();
    let err = generate_question(&state, GenerateQuestionIn::default()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Upstream(UpstreamError::Auth(_))));
  }

  #[tokio::test]
  async fn valid_doubt_input_reaches_the_upstream_stage() {
    // With a question present, the keyless client is the first failure point.
    let state = keyless_state();
    let body = SolveDoubtIn { question: Some("What is inertia?".into()), ..Default::default() };
    let err = solve_doubt(&state, body).await.unwrap_err();
    assert!(matches!(err, PipelineError::Upstream(UpstreamError::Auth(_))));
  }
}
