//! Minimal client for the upstream chat-completion service.
//!
//! We only call chat/completions with a single user message and task-specific
//! decoding parameters. Calls are instrumented and log model names, latencies,
//! and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::domain::GenerationTask;
use crate::error::UpstreamError;

const GENERATION_TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Decoding knobs for one upstream call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodingParams {
  pub temperature: f32,
  pub max_tokens: u32,
}

/// Per-task decoding parameters. Lower temperature for structurally
/// constrained output (mock tests) keeps formatting drift down.
pub fn decoding_for(task: &GenerationTask) -> DecodingParams {
  match task {
    GenerationTask::Question { .. } => DecodingParams { temperature: 0.7, max_tokens: 500 },
    GenerationTask::Doubt { .. } => DecodingParams { temperature: 0.5, max_tokens: 800 },
    GenerationTask::Test { .. } => DecodingParams { temperature: 0.3, max_tokens: 2000 },
    GenerationTask::Concept { .. } => DecodingParams { temperature: 0.6, max_tokens: 1000 },
  }
}

#[derive(Clone)]
pub struct UpstreamClient {
  client: reqwest::Client,
  api_key: Option<String>,
  pub base_url: String,
  pub model: String,
}

impl UpstreamClient {
  pub fn new(api_key: Option<String>, base_url: String, model: String) -> Self {
    let client = match reqwest::Client::builder().timeout(GENERATION_TIMEOUT).build() {
      Ok(c) => c,
      Err(e) => {
        error!(target: "examprep_backend", error = %e, "HTTP client build failed; using default client");
        reqwest::Client::new()
      }
    };
    Self { client, api_key, base_url, model }
  }

  /// Build the client from the environment. The client itself always exists;
  /// a missing DEEPSEEK_API_KEY surfaces as an auth failure on the first call
  /// so the health and sample endpoints keep working without configuration.
  pub fn from_env() -> Self {
    let api_key = std::env::var("DEEPSEEK_API_KEY").ok().filter(|k| !k.is_empty());
    let base_url = std::env::var("DEEPSEEK_BASE_URL")
      .unwrap_or_else(|_| "https://api.deepseek.com/v1".into());
    let model = std::env::var("DEEPSEEK_MODEL").unwrap_or_else(|_| "deepseek-chat".into());
    Self::new(api_key, base_url, model)
  }

  pub fn is_configured(&self) -> bool {
    self.api_key.is_some()
  }

  /// One chat-completion round-trip. Returns the first choice's content,
  /// trimmed. No retries; the deadline comes from the client timeout.
  #[instrument(level = "info", skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
  pub async fn chat(&self, prompt: &str, params: DecodingParams) -> Result<String, UpstreamError> {
    let Some(api_key) = &self.api_key else {
      return Err(UpstreamError::Auth("DEEPSEEK_API_KEY is not configured".into()));
    };

    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![ChatMessageReq { role: "user".into(), content: prompt.into() }],
      temperature: Some(params.temperature),
      max_tokens: Some(params.max_tokens),
    };

    let start = std::time::Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "examprep-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", api_key))
      .json(&req)
      .send()
      .await
      .map_err(classify_transport)?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let message = extract_upstream_error(&body).unwrap_or(body);
      error!(status = %status, %message, "Upstream returned an error status");
      return Err(classify_status(status, message));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(classify_transport)?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Upstream usage");
    }
    let text = body
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .unwrap_or_default()
      .trim()
      .to_string();

    info!(elapsed = ?start.elapsed(), reply_len = text.len(), "Upstream reply received");
    Ok(text)
  }

  /// Diagnostics-only connectivity probe: minimal prompt, short timeout.
  /// Never gates the generation pipelines.
  #[instrument(level = "info", skip(self), fields(model = %self.model))]
  pub async fn probe(&self) -> bool {
    let Some(api_key) = &self.api_key else {
      return false;
    };

    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![ChatMessageReq { role: "user".into(), content: "Hello".into() }],
      temperature: None,
      max_tokens: Some(10),
    };

    let sent = self
      .client
      .post(&url)
      .timeout(PROBE_TIMEOUT)
      .header(USER_AGENT, "examprep-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", api_key))
      .json(&req)
      .send()
      .await;

    match sent {
      Ok(res) if res.status().is_success() => true,
      Ok(res) => {
        info!(status = %res.status(), "Probe rejected by upstream");
        false
      }
      Err(e) => {
        info!(error = %e, "Probe failed");
        false
      }
    }
  }
}

fn classify_transport(e: reqwest::Error) -> UpstreamError {
  if e.is_timeout() {
    UpstreamError::Timeout
  } else {
    UpstreamError::Transport(e.to_string())
  }
}

fn classify_status(status: StatusCode, message: String) -> UpstreamError {
  match status {
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamError::Auth(message),
    StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited(message),
    _ => UpstreamError::UnexpectedStatus { status: status.as_u16(), message },
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  #[serde(skip_serializing_if = "Option::is_none")]
  temperature: Option<f32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq {
  role: String,
  content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)]
  usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessageResp,
}
#[derive(Deserialize)]
struct ChatMessageResp {
  content: Option<String>,
}
#[derive(Deserialize)]
struct Usage {
  #[serde(default)]
  prompt_tokens: Option<u32>,
  #[serde(default)]
  completion_tokens: Option<u32>,
  #[serde(default)]
  total_tokens: Option<u32>,
}

/// Try to extract a clean error message from the upstream error body.
fn extract_upstream_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decoding_params_follow_the_task() {
    let test_task =
      GenerationTask::Test { exam_type: "JEE Mains".into(), subject: "Physics".into(), count: 5 };
    let doubt_task = GenerationTask::Doubt {
      question: "q".into(),
      subject: "General".into(),
      student_grade: "12th".into(),
    };
    assert_eq!(decoding_for(&test_task), DecodingParams { temperature: 0.3, max_tokens: 2000 });
    assert_eq!(decoding_for(&doubt_task), DecodingParams { temperature: 0.5, max_tokens: 800 });
  }

  #[test]
  fn status_classification_covers_the_taxonomy() {
    assert!(matches!(
      classify_status(StatusCode::UNAUTHORIZED, "bad key".into()),
      UpstreamError::Auth(_)
    ));
    assert!(matches!(
      classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
      UpstreamError::RateLimited(_)
    ));
    assert!(matches!(
      classify_status(StatusCode::SERVICE_UNAVAILABLE, "oops".into()),
      UpstreamError::UnexpectedStatus { status: 503, .. }
    ));
  }

  #[test]
  fn upstream_error_body_message_is_extracted() {
    let body = r#"{"error": {"message": "Insufficient Balance", "type": "billing"}}"#;
    assert_eq!(extract_upstream_error(body).as_deref(), Some("Insufficient Balance"));
    assert_eq!(extract_upstream_error("not json"), None);
  }

  #[tokio::test]
  async fn missing_key_fails_before_any_network_io() {
    // base_url points nowhere; an auth error proves no request was attempted.
    let client = UpstreamClient::new(None, "http://127.0.0.1:1".into(), "test-model".into());
    let err = client
      .chat("hi", DecodingParams { temperature: 0.0, max_tokens: 1 })
      .await
      .unwrap_err();
    assert!(matches!(err, UpstreamError::Auth(_)));
    assert!(!client.probe().await);
  }
}
