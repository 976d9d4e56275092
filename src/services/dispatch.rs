//! Provider fallback orchestrator.
//!
//! DESIGN
//! ======
//! The primary provider's chain runs first when the primary is available.
//! Any primary failure, whatever its class, hands the request to the
//! secondary. Only when both fail does the caller see an error, and
//! `dispatch_or_default` turns that error into a static payload for the
//! features that have one.
//!
//! Each dispatch runs inside a `dispatch` span carrying a request id, so the
//! provider and chain logs of one HTTP request can be correlated.

use std::sync::Arc;

use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use super::chain;
use super::defaults;
use crate::error::ErrorCode;
use crate::feature::GenerationRequest;
use crate::llm::LlmProvider;
use crate::llm::types::{FailureRecord, ProviderId};
use crate::normalize::NormalizedResult;
use crate::prompt::{self, RenderedPrompt};

#[derive(Debug)]
pub struct Dispatched {
    pub result: NormalizedResult,
    pub provider: ProviderId,
    pub model: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Both providers were unavailable or failed. `failures` lists every
    /// recorded model failure in call order.
    #[error("all AI backends unavailable ({} recorded failures)", .failures.len())]
    AllBackendsUnavailable { failures: Vec<FailureRecord> },
}

impl ErrorCode for DispatchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AllBackendsUnavailable { .. } => "E_ALL_BACKENDS_UNAVAILABLE",
        }
    }

    fn retryable(&self) -> bool {
        true
    }
}

pub struct Dispatcher {
    primary: Arc<dyn LlmProvider>,
    secondary: Arc<dyn LlmProvider>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(primary: Arc<dyn LlmProvider>, secondary: Arc<dyn LlmProvider>) -> Self {
        Self { primary, secondary }
    }

    /// Providers in dispatch order.
    #[must_use]
    pub fn providers(&self) -> [&dyn LlmProvider; 2] {
        [self.primary.as_ref(), self.secondary.as_ref()]
    }

    /// Run the request through the primary, then the secondary provider.
    ///
    /// # Errors
    ///
    /// [`DispatchError::AllBackendsUnavailable`] when neither provider
    /// produced a valid result.
    pub async fn dispatch(&self, request: &GenerationRequest) -> Result<Dispatched, DispatchError> {
        let request_id = Uuid::new_v4();
        let prompt = prompt::build(request);
        let span = info_span!("dispatch", %request_id, feature = %prompt.feature);
        self.run(&prompt).instrument(span).await
    }

    async fn run(&self, prompt: &RenderedPrompt) -> Result<Dispatched, DispatchError> {
        info!(prompt_len = prompt.text.len(), "ai: dispatch");

        let mut failures = Vec::new();
        for provider in self.providers() {
            let id = provider.id();
            if !provider.is_available() {
                info!(provider = %id, "ai: provider unavailable, skipping");
                continue;
            }
            match chain::generate(provider, prompt).await {
                Ok(success) => {
                    info!(provider = %id, model = %success.model, skipped = success.skipped.len(), "ai: dispatch complete");
                    return Ok(Dispatched { result: success.result, provider: id, model: success.model });
                }
                Err(e) => {
                    warn!(provider = %id, code = e.error_code(), error = %e, "ai: provider failed");
                    failures.extend(e.into_records());
                }
            }
        }

        error!(failures = failures.len(), "ai: all backends unavailable");
        Err(DispatchError::AllBackendsUnavailable { failures })
    }

    /// [`Dispatcher::dispatch`], falling back to the feature's static
    /// default when one exists.
    ///
    /// # Errors
    ///
    /// Propagates the dispatch error for features without a default.
    pub async fn dispatch_or_default(&self, request: &GenerationRequest) -> Result<NormalizedResult, DispatchError> {
        match self.dispatch(request).await {
            Ok(dispatched) => {
                debug!(provider = %dispatched.provider, model = %dispatched.model, "ai: serving model result");
                Ok(dispatched.result)
            }
            Err(e) => match defaults::fallback_for(request) {
                Some(result) => {
                    warn!(feature = %request.kind(), code = e.error_code(), "ai: serving default payload");
                    Ok(result)
                }
                None => Err(e),
            },
        }
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
