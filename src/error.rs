//! Error taxonomy for the generation pipelines.
//!
//! Every failure a handler can see is one of these; handlers translate them
//! into structured JSON bodies and never let a raw error cross the boundary.

use thiserror::Error;

/// Failures talking to the upstream chat-completion service.
#[derive(Debug, Error)]
pub enum UpstreamError {
  #[error("upstream request timed out")]
  Timeout,
  #[error("upstream transport failure: {0}")]
  Transport(String),
  #[error("upstream authentication failed: {0}")]
  Auth(String),
  #[error("upstream rate limit hit: {0}")]
  RateLimited(String),
  #[error("upstream HTTP {status}: {message}")]
  UnexpectedStatus { status: u16, message: String },
}

/// Failures turning raw model text into a payload the pipelines may trust.
#[derive(Debug, Error)]
pub enum ExtractionError {
  #[error("no JSON payload found in model reply")]
  NoBracketFound,
  #[error("payload did not parse: {0}")]
  MalformedPayload(String),
  #[error("payload failed validation: {0}")]
  SchemaViolation(String),
}

/// What a pipeline surfaces to its HTTP handler. Extraction failures never
/// trigger an upstream retry; they propagate here and the handler applies the
/// fallback policy.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("{0}")]
  BadRequest(String),
  #[error(transparent)]
  Upstream(#[from] UpstreamError),
  #[error(transparent)]
  Extraction(#[from] ExtractionError),
}
