//! `/ai/*` generation endpoints.
//!
//! Handlers translate JSON bodies into a `GenerationRequest`, hand it to the
//! dispatcher, and return the normalized object as the response body.
//! Failures reach the caller as a generic `{detail}` body; provider detail
//! stays in the logs.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::warn;

use crate::error::ErrorCode;
use crate::feature::{
    BackingTrackParams, GenerationRequest, ImprovParams, LessonParams, LyricsParams, MelodyParams,
    PracticeAdviceParams, RhythmParams, SongArrangementParams,
};
use crate::normalize::NormalizedResult;
use crate::services::dispatch::DispatchError;
use crate::state::AppState;

pub const UNAVAILABLE_DETAIL: &str = "All AI backends currently unavailable";
pub const INTERNAL_DETAIL: &str = "Internal server error";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Unavailable(#[from] DispatchError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("malformed body: {0}")]
    MalformedBody(#[from] JsonRejection),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(e) => e.error_code(),
            Self::InvalidRequest(_) => "E_INVALID_REQUEST",
            Self::MalformedBody(_) => "E_MALFORMED_BODY",
            Self::Internal(_) => "E_INTERNAL",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MalformedBody(rejection) => rejection.status(),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::Unavailable(_) => UNAVAILABLE_DETAIL.to_string(),
            Self::InvalidRequest(message) => message.clone(),
            Self::MalformedBody(rejection) => malformed_detail(rejection).to_string(),
            Self::Internal(_) => INTERNAL_DETAIL.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), code = self.error_code(), error = %self, "ai: request failed");
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

/// Caller-facing text for a body rejection. The serde message stays in the
/// logs.
fn malformed_detail(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::JsonDataError(_) => "Request body is missing fields or has invalid values",
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON body with Content-Type: application/json",
        _ => "Request body could not be read",
    }
}

// =============================================================================
// EXTRACTOR
// =============================================================================

/// `Json` body extractor whose rejections answer with `{detail}` like every
/// other error.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

type ApiResult = Result<Json<NormalizedResult>, ApiError>;

async fn generate(state: &AppState, request: GenerationRequest) -> ApiResult {
    let result = state.dispatcher.dispatch_or_default(&request).await?;
    Ok(Json(result))
}

/// `POST /ai/chords`: full song arrangement.
pub async fn chords(State(state): State<AppState>, ApiJson(params): ApiJson<SongArrangementParams>) -> ApiResult {
    if params.song_query.trim().is_empty() {
        return Err(ApiError::InvalidRequest("songQuery must not be empty".into()));
    }
    generate(&state, GenerationRequest::SongArrangement(params)).await
}

pub async fn backing_track(State(state): State<AppState>, ApiJson(params): ApiJson<BackingTrackParams>) -> ApiResult {
    generate(&state, GenerationRequest::BackingTrack(params)).await
}

pub async fn rhythm(State(state): State<AppState>, ApiJson(params): ApiJson<RhythmParams>) -> ApiResult {
    generate(&state, GenerationRequest::RhythmPattern(params)).await
}

pub async fn melody(State(state): State<AppState>, ApiJson(params): ApiJson<MelodyParams>) -> ApiResult {
    generate(&state, GenerationRequest::Melody(params)).await
}

pub async fn improv(State(state): State<AppState>, ApiJson(params): ApiJson<ImprovParams>) -> ApiResult {
    generate(&state, GenerationRequest::ImprovTips(params)).await
}

pub async fn lyrics(State(state): State<AppState>, ApiJson(params): ApiJson<LyricsParams>) -> ApiResult {
    generate(&state, GenerationRequest::Lyrics(params)).await
}

pub async fn practice_advice(State(state): State<AppState>, ApiJson(params): ApiJson<PracticeAdviceParams>) -> ApiResult {
    generate(&state, GenerationRequest::PracticeAdvice(params)).await
}

pub async fn lesson(State(state): State<AppState>, ApiJson(params): ApiJson<LessonParams>) -> ApiResult {
    generate(&state, GenerationRequest::Lesson(params)).await
}

#[cfg(test)]
#[path = "ai_test.rs"]
mod tests;
