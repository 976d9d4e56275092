//! LLM — provider capability interface and concrete clients.
//!
//! DESIGN
//! ======
//! `LlmProvider` is the seam the fallback services depend on: a provider
//! knows its identity and static config, whether it is usable, how to turn a
//! rendered prompt into raw text, and how to classify its own failures.
//! `ProviderClient` is the production implementation, dispatching to the
//! Grok or Gemini wire client; tests substitute scripted mocks.

pub mod classify;
pub mod config;
pub mod gemini;
pub mod grok;
pub mod http;
pub mod types;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::prompt::RenderedPrompt;
use config::ProviderConfig;
use types::{FailureKind, FailureRecord, LlmError, ProviderId, RawModelResponse};

/// Instruction used by the startup connectivity probe.
const SELF_CHECK_PROMPT: &str = r#"Connectivity check. Reply with exactly this JSON object: {"status": "OK"}"#;

// =============================================================================
// CAPABILITY TRAIT
// =============================================================================

/// Provider-neutral async interface. Enables mocking in tests.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn config(&self) -> &ProviderConfig;

    /// `true` when credentials are configured and no startup self-check has
    /// failed. Unavailable providers are skipped without a call.
    fn is_available(&self) -> bool;

    /// Send `prompt` to one model variant and return its raw text.
    ///
    /// # Errors
    ///
    /// Returns a classified [`FailureRecord`] for any transport-level
    /// failure or non-success status.
    async fn call(&self, model: &str, prompt: &RenderedPrompt) -> Result<RawModelResponse, FailureRecord>;

    /// Map a status / message pair to a failure kind.
    fn classify_failure(&self, status: Option<u16>, message: &str) -> FailureKind {
        classify::classify(status, message)
    }
}

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

/// Concrete provider client for either backend.
pub struct ProviderClient {
    inner: Backend,
    config: ProviderConfig,
    verified: bool,
}

enum Backend {
    Grok(grok::GrokClient),
    Gemini(gemini::GeminiClient),
}

impl ProviderClient {
    /// Build a client from parsed provider config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: ProviderConfig) -> Result<Self, LlmError> {
        let inner = match config.provider {
            ProviderId::Grok => Backend::Grok(grok::GrokClient::new(&config)?),
            ProviderId::Gemini => Backend::Gemini(gemini::GeminiClient::new(&config)?),
        };
        Ok(Self { inner, config, verified: true })
    }

    /// Probe the configured models in order until one answers. Failures
    /// that would advance the model chain move on to the next variant; any
    /// other failure, an unexpected reply, or running out of models leaves
    /// the provider constructed but reporting itself unavailable.
    pub async fn self_check(mut self) -> Self {
        if !self.config.has_credentials() {
            return self;
        }
        let provider = self.config.provider;
        let models = self.config.models.clone();

        for model in &models {
            match self.complete(model, SELF_CHECK_PROMPT).await {
                Ok(resp) if is_ok_reply(&resp.text) => {
                    info!(%provider, %model, "llm: self-check passed");
                    return self;
                }
                Ok(resp) => {
                    warn!(%provider, %model, reply = %types::preview(&resp.text, 80), "llm: self-check unexpected reply");
                    break;
                }
                Err(e) if e.kind.advances_model() => {
                    info!(%provider, %model, kind = %e.kind, "llm: self-check model skipped");
                }
                Err(e) => {
                    warn!(%provider, %model, error = %e, "llm: self-check failed");
                    break;
                }
            }
        }

        warn!(%provider, "llm: self-check found no usable model");
        self.verified = false;
        self
    }

    async fn complete(&self, model: &str, text: &str) -> Result<RawModelResponse, FailureRecord> {
        let classify = |status: Option<u16>, message: &str| self.classify_failure(status, message);
        match &self.inner {
            Backend::Grok(c) => c.complete(model, text, classify).await,
            Backend::Gemini(c) => c.complete(model, text, classify).await,
        }
    }
}

/// `{"status": "OK"}`, or a bare `OK` word for models that ignore the
/// JSON instruction.
fn is_ok_reply(text: &str) -> bool {
    let trimmed = text.trim().trim_start_matches("```json").trim_matches('`').trim();
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(trimmed) {
        return map
            .get("status")
            .and_then(serde_json::Value::as_str)
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("ok"));
    }
    trimmed
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word.eq_ignore_ascii_case("ok"))
}

#[async_trait]
impl LlmProvider for ProviderClient {
    fn id(&self) -> ProviderId {
        self.config.provider
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn is_available(&self) -> bool {
        self.config.has_credentials() && self.verified
    }

    async fn call(&self, model: &str, prompt: &RenderedPrompt) -> Result<RawModelResponse, FailureRecord> {
        debug!(provider = %self.config.provider, %model, feature = %prompt.feature, prompt_len = prompt.text.len(), "llm: call");
        self.complete(model, &prompt.text)
            .await
            .map_err(|e| e.attributed(self.config.provider, model))
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
