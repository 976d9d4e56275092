//! Model fallback chain — one provider, its model variants in order.
//!
//! DESIGN
//! ======
//! Each model gets one call. Failures that say "this model cannot serve
//! you right now" (rate limited, unavailable, overloaded) advance to the
//! next variant. Failures that another variant of the same provider would
//! repeat (transport errors, unparseable or invalid output) stop the chain
//! so the orchestrator can move on to the other provider.

use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::llm::LlmProvider;
use crate::llm::types::{FailureRecord, ProviderId, preview};
use crate::normalize::{NormalizedResult, normalize};
use crate::prompt::RenderedPrompt;

/// Raw output kept in debug logs when normalization fails.
const RAW_LOG_CHARS: usize = 500;

#[derive(Debug)]
pub struct ChainSuccess {
    pub result: NormalizedResult,
    pub provider: ProviderId,
    /// Configured model variant that produced the result.
    pub model: String,
    /// Failures of earlier variants, in order.
    pub skipped: Vec<FailureRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("{provider} has no models configured")]
    NoModels { provider: ProviderId },

    #[error("chain aborted: {0}")]
    Aborted(FailureRecord),

    #[error("all models exhausted after {} attempts; last: {last}", .attempts.len())]
    Exhausted { last: FailureRecord, attempts: Vec<FailureRecord> },
}

impl ChainError {
    /// Every failure recorded along the chain.
    #[must_use]
    pub fn into_records(self) -> Vec<FailureRecord> {
        match self {
            Self::NoModels { .. } => Vec::new(),
            Self::Aborted(record) => vec![record],
            Self::Exhausted { attempts, .. } => attempts,
        }
    }
}

impl ErrorCode for ChainError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoModels { .. } => "E_NO_MODELS",
            Self::Aborted(record) => record.error_code(),
            Self::Exhausted { .. } => "E_MODELS_EXHAUSTED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Try each configured model of `provider` until one yields a valid result.
///
/// # Errors
///
/// [`ChainError::NoModels`] for an empty model list,
/// [`ChainError::Aborted`] on the first non-advancing failure, and
/// [`ChainError::Exhausted`] when every model failed with an advancing one.
pub async fn generate(provider: &dyn LlmProvider, prompt: &RenderedPrompt) -> Result<ChainSuccess, ChainError> {
    let id = provider.id();
    let models = &provider.config().models;
    let mut attempts: Vec<FailureRecord> = Vec::new();

    for model in models {
        let outcome = match provider.call(model, prompt).await {
            Ok(raw) => normalize(&raw.text, &prompt.schema).inspect_err(|_| {
                debug!(provider = %id, %model, reported_model = %raw.model, status = raw.status, finish_reason = ?raw.finish_reason, raw = %preview(&raw.text, RAW_LOG_CHARS), "ai: unusable model output");
            }),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => {
                info!(provider = %id, %model, feature = %prompt.feature, skipped = attempts.len(), "ai: model succeeded");
                return Ok(ChainSuccess { result, provider: id, model: model.clone(), skipped: attempts });
            }
            Err(failure) => {
                let failure = failure.attributed(id, model);
                if failure.kind.advances_model() {
                    warn!(provider = %id, %model, kind = %failure.kind, status = ?failure.status, code = failure.error_code(), detail = %failure.detail, "ai: model failed, advancing");
                    attempts.push(failure);
                } else {
                    warn!(provider = %id, %model, kind = %failure.kind, status = ?failure.status, code = failure.error_code(), detail = %failure.detail, "ai: model failed, aborting chain");
                    return Err(ChainError::Aborted(failure));
                }
            }
        }
    }

    match attempts.last().cloned() {
        Some(last) => Err(ChainError::Exhausted { last, attempts }),
        None => Err(ChainError::NoModels { provider: id }),
    }
}

#[cfg(test)]
#[path = "chain_test.rs"]
mod tests;
