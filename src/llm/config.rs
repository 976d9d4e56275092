//! Provider configuration parsed from environment variables.
//!
//! Each provider reads the same set of keys under its own prefix
//! (`GROK_*`, `GEMINI_*`). A missing API key is not an error: the provider
//! is simply reported unavailable and the orchestrator skips it.

use super::types::{LlmError, ProviderId};

pub const DEFAULT_GROK_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GROK_MODELS: &[&str] = &["grok-3-mini", "grok-3", "grok-beta"];
pub const DEFAULT_GEMINI_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash-001"];
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_INITIAL_MS: u64 = 1_000;
pub const DEFAULT_RETRY_MAX_MS: u64 = 8_000;

pub const DEFAULT_PERSONA: &str = "You are a world-class music teacher, session musician and arranger. \
You answer every request with a single JSON value that matches the requested structure exactly. \
Never add commentary, markdown or code fences.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    /// Not every provider accepts top-k; `None` omits it from the request.
    pub top_k: Option<u32>,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Transport-level retry for 429 responses. Attempts include the first call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    /// Exponential delay before retry number `retry` (1-based), capped.
    #[must_use]
    pub fn backoff_ms(&self, retry: u32) -> u64 {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub provider: ProviderId,
    pub api_key: Option<String>,
    /// Model variants in fallback order.
    pub models: Vec<String>,
    pub sampling: SamplingParams,
    /// Persona / system instruction sent with every call.
    pub persona: String,
    pub base_url: String,
    pub timeouts: LlmTimeouts,
    pub retry: RetryPolicy,
}

impl ProviderConfig {
    /// Built-in configuration without credentials.
    #[must_use]
    pub fn defaults(provider: ProviderId) -> Self {
        let (models, base_url, sampling) = match provider {
            ProviderId::Grok => (
                DEFAULT_GROK_MODELS,
                DEFAULT_GROK_BASE_URL,
                SamplingParams { temperature: 0.7, top_p: 0.95, top_k: None, max_output_tokens: 3000 },
            ),
            ProviderId::Gemini => (
                DEFAULT_GEMINI_MODELS,
                DEFAULT_GEMINI_BASE_URL,
                SamplingParams { temperature: 0.7, top_p: 0.95, top_k: Some(40), max_output_tokens: 8192 },
            ),
        };
        Self {
            provider,
            api_key: None,
            models: models.iter().map(|m| (*m).to_string()).collect(),
            sampling,
            persona: DEFAULT_PERSONA.to_string(),
            base_url: base_url.to_string(),
            timeouts: LlmTimeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            retry: RetryPolicy {
                max_attempts: DEFAULT_RETRY_ATTEMPTS,
                initial_backoff_ms: DEFAULT_RETRY_INITIAL_MS,
                max_backoff_ms: DEFAULT_RETRY_MAX_MS,
            },
        }
    }

    /// Build typed provider config from environment variables.
    ///
    /// With `P` = `GROK` or `GEMINI`:
    /// - `P_API_KEY`: absent or blank disables the provider
    /// - `P_MODELS`: comma-separated model list in fallback order
    /// - `P_BASE_URL`, `P_PERSONA`
    /// - `P_TEMPERATURE`, `P_TOP_P`, `P_TOP_K`, `P_MAX_OUTPUT_TOKENS`
    /// - `P_REQUEST_TIMEOUT_SECS`, `P_CONNECT_TIMEOUT_SECS`
    /// - `P_RETRY_ATTEMPTS`, `P_RETRY_INITIAL_MS`
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ConfigParse`] when a sampling parameter is out of
    /// the range the providers accept.
    pub fn from_env(provider: ProviderId) -> Result<Self, LlmError> {
        let prefix = env_prefix(provider);
        let key = |name: &str| format!("{prefix}_{name}");
        let mut cfg = Self::defaults(provider);

        cfg.api_key = std::env::var(key("API_KEY"))
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        if let Some(models) = std::env::var(key("MODELS"))
            .ok()
            .and_then(|raw| parse_model_list(&raw))
        {
            cfg.models = models;
        }
        if let Ok(url) = std::env::var(key("BASE_URL")) {
            cfg.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(persona) = std::env::var(key("PERSONA")) {
            if !persona.trim().is_empty() {
                cfg.persona = persona;
            }
        }

        cfg.sampling.temperature = env_parse(&key("TEMPERATURE"), cfg.sampling.temperature);
        cfg.sampling.top_p = env_parse(&key("TOP_P"), cfg.sampling.top_p);
        if let Some(top_k) = std::env::var(key("TOP_K"))
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            cfg.sampling.top_k = Some(top_k);
        }
        cfg.sampling.max_output_tokens = env_parse(&key("MAX_OUTPUT_TOKENS"), cfg.sampling.max_output_tokens);

        cfg.timeouts.request_secs = env_parse(&key("REQUEST_TIMEOUT_SECS"), cfg.timeouts.request_secs);
        cfg.timeouts.connect_secs = env_parse(&key("CONNECT_TIMEOUT_SECS"), cfg.timeouts.connect_secs);
        cfg.retry.max_attempts = env_parse(&key("RETRY_ATTEMPTS"), cfg.retry.max_attempts).max(1);
        cfg.retry.initial_backoff_ms = env_parse(&key("RETRY_INITIAL_MS"), cfg.retry.initial_backoff_ms);

        cfg.validate()?;
        Ok(cfg)
    }

    /// Check sampling parameters against the ranges both providers accept.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ConfigParse`] naming the offending parameter.
    pub fn validate(&self) -> Result<(), LlmError> {
        let s = &self.sampling;
        if !(0.0..=2.0).contains(&s.temperature) {
            return Err(LlmError::ConfigParse(format!(
                "{} temperature {} outside 0.0..=2.0",
                self.provider, s.temperature
            )));
        }
        if !(s.top_p > 0.0 && s.top_p <= 1.0) {
            return Err(LlmError::ConfigParse(format!("{} top_p {} outside (0.0, 1.0]", self.provider, s.top_p)));
        }
        if s.max_output_tokens == 0 {
            return Err(LlmError::ConfigParse(format!("{} max_output_tokens must be positive", self.provider)));
        }
        Ok(())
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

fn env_prefix(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Grok => "GROK",
        ProviderId::Gemini => "GEMINI",
    }
}

/// Split a comma-separated model list. Blank entries are dropped; an
/// entirely blank list yields `None` so the defaults stay in effect.
fn parse_model_list(raw: &str) -> Option<Vec<String>> {
    let models: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    if models.is_empty() { None } else { Some(models) }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
