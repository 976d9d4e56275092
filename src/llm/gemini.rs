//! Google Gemini client (`models/{model}:generateContent`).
//!
//! Applies the persona as `systemInstruction`, asks for a JSON response
//! MIME type, and relaxes the default safety filters to `BLOCK_ONLY_HIGH`
//! so lyrics about heartbreak or rebellion are not silently dropped.

use serde::Serialize;
use serde_json::Value;

use super::config::{ProviderConfig, RetryPolicy, SamplingParams};
use super::http::{build_client, send_with_backoff};
use super::types::{FailureKind, FailureRecord, LlmError, RawModelResponse};

const SAFETY_SETTINGS: &[SafetySetting] = &[
    SafetySetting { category: "HARM_CATEGORY_HARASSMENT", threshold: "BLOCK_ONLY_HIGH" },
    SafetySetting { category: "HARM_CATEGORY_HATE_SPEECH", threshold: "BLOCK_ONLY_HIGH" },
    SafetySetting { category: "HARM_CATEGORY_SEXUALLY_EXPLICIT", threshold: "BLOCK_ONLY_HIGH" },
    SafetySetting { category: "HARM_CATEGORY_DANGEROUS_CONTENT", threshold: "BLOCK_ONLY_HIGH" },
];

// =============================================================================
// CLIENT
// =============================================================================

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    sampling: SamplingParams,
    persona: String,
    retry: RetryPolicy,
}

impl GeminiClient {
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

    /// Run one `generateContent` call and return the candidate text.
    ///
    /// # Errors
    ///
    /// Returns a classified [`FailureRecord`] on transport failure, non-2xx
    /// status, or a malformed envelope.
    pub async fn complete<C>(&self, model: &str, prompt: &str, classify: C) -> Result<RawModelResponse, FailureRecord>
    where
        C: Fn(Option<u16>, &str) -> FailureKind,
    {
        let body = build_request(&self.persona, prompt, self.sampling);
        let url = endpoint_url(&self.base_url, model);

        let reply = send_with_backoff(
            || {
                self.http
                    .post(&url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&body)
            },
            self.retry,
            &classify,
        )
        .await?;

        parse_generate_response(&reply.body, model, reply.status)
    }
}

fn endpoint_url(base_url: &str, model: &str) -> String {
    let model = model.strip_prefix("models/").unwrap_or(model);
    format!("{base_url}/models/{model}:generateContent")
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GContent<'a>>,
    contents: Vec<GContent<'a>>,
    generation_config: GenerationConfig,
    safety_settings: &'static [SafetySetting],
}

#[derive(Debug, Serialize)]
struct GContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

fn build_request<'a>(persona: &'a str, prompt: &'a str, sampling: SamplingParams) -> GenerateRequest<'a> {
    let system_instruction = (!persona.trim().is_empty()).then(|| GContent { role: None, parts: vec![GPart { text: persona }] });
    GenerateRequest {
        system_instruction,
        contents: vec![GContent { role: Some("user"), parts: vec![GPart { text: prompt }] }],
        generation_config: GenerationConfig {
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            top_k: sampling.top_k,
            max_output_tokens: sampling.max_output_tokens,
            response_mime_type: "application/json",
        },
        safety_settings: SAFETY_SETTINGS,
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Extract candidate text. A prompt blocked by safety filters yields an
/// empty response whose finish reason records the block; the normalizer then
/// classifies it as unparseable.
pub(crate) fn parse_generate_response(json_text: &str, model: &str, status: u16) -> Result<RawModelResponse, FailureRecord> {
    let root: Value = serde_json::from_str(json_text)
        .map_err(|e| FailureRecord::new(FailureKind::TransportError, format!("generateContent envelope: {e}")))?;
    let model = root
        .get("modelVersion")
        .and_then(Value::as_str)
        .unwrap_or(model)
        .to_string();

    let Some(candidate) = root
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
    else {
        if let Some(reason) = root
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(Value::as_str)
        {
            return Ok(RawModelResponse {
                text: String::new(),
                model,
                status,
                finish_reason: Some(format!("blocked: {reason}")),
            });
        }
        return Err(FailureRecord::new(FailureKind::TransportError, "generateContent: no candidates"));
    };

    let text = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default();
    let finish_reason = candidate
        .get("finishReason")
        .and_then(Value::as_str)
        .map(str::to_owned);

    Ok(RawModelResponse { text, model, status, finish_reason })
}

#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;
