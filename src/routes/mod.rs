//! Router assembly: REST API, admission-gate middleware, static files, CORS,
//! and HTTP tracing.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - REST API under `/api/...`, every route behind the admission gate
/// - `/health` left ungated so diagnostics work even for throttled clients
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    let api = Router::new()
        .route("/api/sample-questions", get(http::http_sample_questions))
        .route("/api/generate-question", post(http::http_generate_question))
        .route("/api/solve-doubt", post(http::http_solve_doubt))
        .route("/api/generate-test", post(http::http_generate_test))
        .route("/api/explain-concept", post(http::http_explain_concept))
        .route_layer(middleware::from_fn_with_state(state.clone(), http::admission_gate));

    Router::new()
        .route("/health", get(http::http_health))
        .merge(api)
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
