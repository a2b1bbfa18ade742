//! Shared application state: settings, prompt templates, the admission gate,
//! and the upstream client.
//!
//! Built once at process start and handed to the router behind an `Arc`.
//! Nothing here is a hidden singleton; tests construct isolated instances.

use tracing::{info, instrument};

use crate::config::{load_prompts_from_env, Prompts, Settings};
use crate::fallback;
use crate::ratelimit::RateLimiter;
use crate::upstream::UpstreamClient;

pub struct AppState {
    pub settings: Settings,
    pub prompts: Prompts,
    pub limiter: RateLimiter,
    pub upstream: UpstreamClient,
}

impl AppState {
    /// Build state from env: settings, prompt overrides, limiter, upstream
    /// client. Also asserts the built-in question pool is schema-valid so a
    /// bad hand-authored record fails fast instead of mid-request.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let settings = Settings::from_env();
        let prompts = load_prompts_from_env();
        fallback::assert_pool_valid();

        let upstream = UpstreamClient::from_env();
        if upstream.is_configured() {
            info!(target: "examprep_backend", base_url = %upstream.base_url, model = %upstream.model, "Upstream generation enabled");
        } else {
            info!(target: "examprep_backend", "DEEPSEEK_API_KEY not set; generation endpoints will surface auth failures");
        }

        match &settings.database_url {
            Some(_) => info!(target: "examprep_backend", "Persistent store configured (reserved for future use)"),
            None => info!(target: "examprep_backend", "No persistent store configured - running in memory mode"),
        }

        let limiter = RateLimiter::new(settings.rate_limit);
        info!(target: "examprep_backend", quota = settings.rate_limit, "Admission gate ready");

        Self { settings, prompts, limiter, upstream }
    }
}
