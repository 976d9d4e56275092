//! xAI Grok client (OpenAI-compatible `/chat/completions`).
//!
//! Thin HTTP wrapper. Pure parsing in `parse_chat_completion` for
//! testability.

use serde::Serialize;
use serde_json::Value;

use super::config::{ProviderConfig, RetryPolicy, SamplingParams};
use super::http::{build_client, send_with_backoff};
use super::types::{FailureKind, FailureRecord, LlmError, RawModelResponse};

// =============================================================================
// CLIENT
// =============================================================================

pub struct GrokClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    sampling: SamplingParams,
    persona: String,
    retry: RetryPolicy,
}

impl GrokClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ProviderConfig) -> Result<Self, LlmError> {
        Ok(Self {
            http: build_client(config.timeouts)?,
            api_key: config.api_key.clone().unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            sampling: config.sampling,
            persona: config.persona.clone(),
            retry: config.retry,
        })
    }

    /// Run one chat completion and return the assistant text.
    ///
    /// # Errors
    ///
    /// Returns a classified [`FailureRecord`] on transport failure, non-2xx
    /// status, or an envelope without assistant content.
    pub async fn complete<C>(&self, model: &str, prompt: &str, classify: C) -> Result<RawModelResponse, FailureRecord>
    where
        C: Fn(Option<u16>, &str) -> FailureKind,
    {
        let body = build_request(model, &self.persona, prompt, self.sampling);
        let url = format!("{}/chat/completions", self.base_url);

        let reply = send_with_backoff(
            || self.http.post(&url).bearer_auth(&self.api_key).json(&body),
            self.retry,
            &classify,
        )
        .await?;

        parse_chat_completion(&reply.body, model, reply.status, &classify)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
struct CcRequest<'a> {
    model: &'a str,
    messages: Vec<CcMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct CcMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

fn build_request<'a>(model: &'a str, persona: &'a str, prompt: &'a str, sampling: SamplingParams) -> CcRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if !persona.trim().is_empty() {
        messages.push(CcMessage { role: "system", content: persona });
    }
    messages.push(CcMessage { role: "user", content: prompt });
    CcRequest {
        model,
        messages,
        temperature: sampling.temperature,
        top_p: sampling.top_p,
        max_tokens: sampling.max_output_tokens,
        response_format: ResponseFormat { kind: "json_object" },
    }
}

// =============================================================================
// PARSING
// =============================================================================

pub(crate) fn parse_chat_completion<C>(
    json_text: &str,
    model: &str,
    status: u16,
    classify: C,
) -> Result<RawModelResponse, FailureRecord>
where
    C: Fn(Option<u16>, &str) -> FailureKind,
{
    let root: Value = serde_json::from_str(json_text)
        .map_err(|e| FailureRecord::new(FailureKind::TransportError, format!("chat_completions envelope: {e}")))?;

    if let Some(message) = root
        .get("error")
        .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("provider error"))
    {
        return Err(FailureRecord::new(classify(Some(status), message), message).with_status(status));
    }

    let choice = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .ok_or_else(|| FailureRecord::new(FailureKind::TransportError, "chat_completions: no choices"))?;

    let text = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let finish_reason = choice
        .get("finish_reason")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let model = root
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(model)
        .to_string();

    Ok(RawModelResponse { text, model, status, finish_reason })
}

#[cfg(test)]
#[path = "grok_test.rs"]
mod tests;
