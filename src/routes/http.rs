//! HTTP endpoint handlers: thin wrappers over the generation pipelines, plus
//! the admission-gate middleware. Handlers map pipeline failures to the
//! structured error bodies; only question generation attaches a fallback.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::domain::QuestionRecord;
use crate::error::PipelineError;
use crate::fallback;
use crate::pipeline;
use crate::protocol::{
  BadRequestOut, ExplainConceptIn, GenerateQuestionIn, GenerateTestIn, GenerationFailedOut,
  HealthOut, RateLimitedOut, SolveDoubtIn,
};
use crate::ratelimit::{now_ms, Decision};
use crate::state::AppState;

/// Admission gate for every /api route. Denied requests are answered here and
/// never reach a handler or the upstream.
#[instrument(level = "debug", skip_all)]
pub async fn admission_gate(
  State(state): State<Arc<AppState>>,
  ConnectInfo(addr): ConnectInfo<SocketAddr>,
  req: Request,
  next: Next,
) -> Response {
  let identity = addr.ip().to_string();
  match state.limiter.admit(&identity, now_ms()) {
    Decision::Allowed => next.run(req).await,
    Decision::Denied => {
      warn!(target: "examprep_backend", %identity, "Rate limit exceeded");
      (
        StatusCode::TOO_MANY_REQUESTS,
        Json(RateLimitedOut {
          error: "Rate limit exceeded".into(),
          message: "Please wait a minute before making more requests".into(),
        }),
      )
        .into_response()
    }
  }
}

/// Live upstream probe on every call; works with zero configuration.
#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let upstream_connected = state.upstream.probe().await;
  info!(target: "examprep_backend", upstream_connected, "Health checked");
  Json(HealthOut {
    status: "ok".into(),
    timestamp: Utc::now(),
    upstream_connected,
    message: "Exam Prep Platform API is running".into(),
  })
}

/// Built-in questions only; no upstream call.
#[instrument(level = "info")]
pub async fn http_sample_questions() -> impl IntoResponse {
  Json(fallback::sample_set())
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_generate_question(
  State(state): State<Arc<AppState>>,
  body: Option<Json<GenerateQuestionIn>>,
) -> Response {
  let body = body.map(|Json(b)| b).unwrap_or_default();
  match pipeline::generate_question(&state, body).await {
    Ok(out) => Json(out).into_response(),
    Err(PipelineError::BadRequest(message)) => bad_request(message),
    Err(e) => {
      error!(target: "pipeline", error = %e, "Error generating question");
      generation_failed("Failed to generate question", &e, Some(fallback::sample_question()))
    }
  }
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_solve_doubt(
  State(state): State<Arc<AppState>>,
  body: Option<Json<SolveDoubtIn>>,
) -> Response {
  let body = body.map(|Json(b)| b).unwrap_or_default();
  match pipeline::solve_doubt(&state, body).await {
    Ok(out) => Json(out).into_response(),
    Err(PipelineError::BadRequest(message)) => bad_request(message),
    Err(e) => {
      error!(target: "pipeline", error = %e, "Error solving doubt");
      generation_failed("Failed to solve doubt", &e, None)
    }
  }
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_generate_test(
  State(state): State<Arc<AppState>>,
  body: Option<Json<GenerateTestIn>>,
) -> Response {
  let body = body.map(|Json(b)| b).unwrap_or_default();
  match pipeline::generate_test(&state, body).await {
    Ok(out) => Json(out).into_response(),
    Err(PipelineError::BadRequest(message)) => bad_request(message),
    Err(e) => {
      error!(target: "pipeline", error = %e, "Error generating test");
      generation_failed("Failed to generate test", &e, None)
    }
  }
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_explain_concept(
  State(state): State<Arc<AppState>>,
  body: Option<Json<ExplainConceptIn>>,
) -> Response {
  let body = body.map(|Json(b)| b).unwrap_or_default();
  match pipeline::explain_concept(&state, body).await {
    Ok(out) => Json(out).into_response(),
    Err(PipelineError::BadRequest(message)) => bad_request(message),
    Err(e) => {
      error!(target: "pipeline", error = %e, "Error explaining concept");
      generation_failed("Failed to explain concept", &e, None)
    }
  }
}

fn bad_request(message: String) -> Response {
  (StatusCode::BAD_REQUEST, Json(BadRequestOut { error: message })).into_response()
}

fn generation_failed(
  error: &str,
  cause: &PipelineError,
  fallback_question: Option<QuestionRecord>,
) -> Response {
  (
    StatusCode::INTERNAL_SERVER_ERROR,
    Json(GenerationFailedOut {
      success: false,
      error: error.into(),
      message: cause.to_string(),
      fallback_question,
    }),
  )
    .into_response()
}
