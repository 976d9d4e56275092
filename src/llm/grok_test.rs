use super::*;
use crate::llm::classify::classify;
use crate::llm::types::ProviderId;

fn sampling() -> SamplingParams {
    ProviderConfig::defaults(ProviderId::Grok).sampling
}

#[test]
fn request_carries_persona_sampling_and_json_hint() {
    let body = serde_json::to_value(build_request("grok-3", "You are a teacher.", "Write JSON", sampling())).unwrap();
    assert_eq!(body["model"], "grok-3");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "You are a teacher.");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "Write JSON");
    assert_eq!(body["max_tokens"], 3000);
    assert_eq!(body["response_format"]["type"], "json_object");
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
}

#[test]
fn blank_persona_omits_system_message() {
    let body = serde_json::to_value(build_request("grok-3", "  ", "hi", sampling())).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
}

#[test]
fn parse_extracts_first_choice_content() {
    let json = serde_json::json!({
        "id": "chatcmpl-1",
        "model": "grok-3-mini",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": "{\"a\":1}" }, "finish_reason": "stop" }
        ],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
    })
    .to_string();
    let resp = parse_chat_completion(&json, "requested", 200, classify).unwrap();
    assert_eq!(resp.text, "{\"a\":1}");
    assert_eq!(resp.model, "grok-3-mini");
    assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
    assert_eq!(resp.status, 200);
}

#[test]
fn parse_null_content_is_empty_text() {
    let json = r#"{"choices":[{"message":{"role":"assistant","content":null},"finish_reason":"length"}]}"#;
    let resp = parse_chat_completion(json, "grok-3", 200, classify).unwrap();
    assert!(resp.text.is_empty());
    assert_eq!(resp.model, "grok-3");
}

#[test]
fn parse_embedded_error_is_classified() {
    let json = r#"{"error":{"message":"The model grok-9 does not exist"}}"#;
    let err = parse_chat_completion(json, "grok-9", 200, classify).unwrap_err();
    assert_eq!(err.kind, FailureKind::ModelUnavailable);
}

#[test]
fn parse_missing_choices_is_transport_error() {
    let err = parse_chat_completion(r#"{"choices":[]}"#, "grok-3", 200, classify).unwrap_err();
    assert_eq!(err.kind, FailureKind::TransportError);
    let err = parse_chat_completion("<html>", "grok-3", 200, classify).unwrap_err();
    assert_eq!(err.kind, FailureKind::TransportError);
}
