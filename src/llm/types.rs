//! LLM types — provider identity, raw responses and failure records.
//!
//! Provider-neutral types shared by the Grok and Gemini clients, the
//! normalizer and the fallback services.

use std::fmt;

use serde::Serialize;

use crate::error::ErrorCode;

// =============================================================================
// PROVIDER IDENTITY
// =============================================================================

/// The two backends, in fixed preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// xAI Grok, OpenAI-compatible chat completions.
    Grok,
    /// Google Gemini `generateContent`.
    Gemini,
}

impl ProviderId {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grok => "grok",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONFIG / CONSTRUCTION ERRORS
// =============================================================================

/// Errors produced while configuring or constructing a provider client.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for LlmError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }
}

// =============================================================================
// FAILURE RECORDS
// =============================================================================

/// Classification of a single failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    RateLimited,
    ModelUnavailable,
    ServerOverloaded,
    Unparseable,
    SchemaInvalid,
    TransportError,
}

impl FailureKind {
    /// Infrastructure-class failures. Only these advance the model chain.
    #[must_use]
    pub fn advances_model(self) -> bool {
        matches!(self, Self::RateLimited | Self::ModelUnavailable | Self::ServerOverloaded)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::ModelUnavailable => "model_unavailable",
            Self::ServerOverloaded => "server_overloaded",
            Self::Unparseable => "unparseable",
            Self::SchemaInvalid => "schema_invalid",
            Self::TransportError => "transport_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified failure, attached to the attempt that produced it.
///
/// `detail` is diagnostic text for logs (provider error bodies, the head of
/// unparseable output, offending schema paths). It is never sent to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub kind: FailureKind,
    pub provider: Option<ProviderId>,
    pub model: Option<String>,
    pub status: Option<u16>,
    pub detail: String,
}

impl FailureRecord {
    #[must_use]
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self { kind, provider: None, model: None, status: None, detail: detail.into() }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the provider and model that produced this failure, keeping any
    /// origin already recorded by the transport layer.
    #[must_use]
    pub fn attributed(mut self, provider: ProviderId, model: &str) -> Self {
        self.provider.get_or_insert(provider);
        if self.model.is_none() {
            self.model = Some(model.to_string());
        }
        self
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        match (&self.provider, &self.model) {
            (Some(p), Some(m)) => write!(f, " [{p}/{m}]")?,
            (Some(p), None) => write!(f, " [{p}]")?,
            (None, Some(m)) => write!(f, " [{m}]")?,
            (None, None) => {}
        }
        write!(f, ": {}", self.detail)
    }
}

impl std::error::Error for FailureRecord {}

impl ErrorCode for FailureRecord {
    fn error_code(&self) -> &'static str {
        match self.kind {
            FailureKind::RateLimited => "E_RATE_LIMITED",
            FailureKind::ModelUnavailable => "E_MODEL_UNAVAILABLE",
            FailureKind::ServerOverloaded => "E_SERVER_OVERLOADED",
            FailureKind::Unparseable => "E_UNPARSEABLE",
            FailureKind::SchemaInvalid => "E_SCHEMA_INVALID",
            FailureKind::TransportError => "E_TRANSPORT",
        }
    }

    fn retryable(&self) -> bool {
        self.kind.advances_model()
    }
}

// =============================================================================
// RAW RESPONSE
// =============================================================================

/// Unprocessed provider output for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelResponse {
    pub text: String,
    /// Model variant that produced the text.
    pub model: String,
    pub status: u16,
    pub finish_reason: Option<String>,
}

/// First `max_chars` characters of `text`, marked when cut. Used to keep
/// provider bodies and raw output bounded in failure details.
#[must_use]
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
