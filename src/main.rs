//! Exam Prep Platform · Generation Backend
//!
//! - Axum HTTP API over an upstream chat-completion service
//! - Per-IP fixed-window admission gate on /api routes
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT               : u16 (default 5000)
//!   DEEPSEEK_API_KEY   : enables upstream generation if present
//!   DEEPSEEK_BASE_URL  : default "https://api.deepseek.com/v1"
//!   DEEPSEEK_MODEL     : default "deepseek-chat"
//!   DATABASE_URL       : optional store connection string (reserved)
//!   RATE_LIMIT         : admissions per client per minute (default 100)
//!   PROMPT_CONFIG_PATH : path to TOML prompt overrides
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod fallback;
mod ratelimit;
mod extract;
mod upstream;
mod state;
mod protocol;
mod pipeline;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (settings, prompts, limiter, upstream).
  let state = Arc::new(AppState::new());
  let port = state.settings.port;

  // Build the HTTP router with routes, the admission gate, CORS and tracing.
  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "examprep_backend", %addr, "HTTP server listening");
  // ConnectInfo feeds the admission gate its client identity.
  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
  Ok(())
}
