//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Generation endpoints live under `/ai`. The welcome route and `/healthz`
//! sit at the root. CORS is restricted to the configured browser origins;
//! every request is traced, and a panicking handler becomes a generic 500.

pub mod ai;

use std::any::Any;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, Method};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyHeader, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::llm::types::ProviderId;
use crate::state::AppState;

pub const WELCOME_MESSAGE: &str = "Welcome to AI Music Studio API!";
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

/// Full application router.
pub fn app(state: AppState, cors_origins: Vec<HeaderValue>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(cors_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AnyHeader);

    let ai_routes = Router::new()
        .route("/chords", post(ai::chords))
        .route("/backing-track", post(ai::backing_track))
        .route("/rhythm", post(ai::rhythm))
        .route("/melody", post(ai::melody))
        .route("/improv", post(ai::improv))
        .route("/lyrics", post(ai::lyrics))
        .route("/practice-advice", post(ai::practice_advice))
        .route("/lesson", post(ai::lesson));

    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .nest("/ai", ai_routes)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Parse a comma-separated origin list, dropping blanks and values that are
/// not valid header values.
#[must_use]
pub fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin.trim_end_matches('/')).ok())
        .collect()
}

async fn root() -> Json<Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

#[derive(Debug, Serialize)]
pub struct ProviderHealth {
    pub provider: ProviderId,
    pub available: bool,
    pub models: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Health {
    /// `ok` when at least one provider can serve requests, else `degraded`.
    pub status: &'static str,
    pub providers: Vec<ProviderHealth>,
}

async fn healthz(State(state): State<AppState>) -> Json<Health> {
    let providers: Vec<ProviderHealth> = state
        .dispatcher
        .providers()
        .iter()
        .map(|p| ProviderHealth { provider: p.id(), available: p.is_available(), models: p.config().models.clone() })
        .collect();
    let status = if providers.iter().any(|p| p.available) { "ok" } else { "degraded" };
    Json(Health { status, providers })
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %message, "http: handler panicked");
    ai::ApiError::Internal(message.to_string()).into_response()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
