use super::*;
use crate::feature::{GenerationRequest, MelodyParams};
use crate::prompt;
use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn provider_config(provider: ProviderId, base_url: &str, api_key: Option<&str>) -> ProviderConfig {
    let mut config = ProviderConfig::defaults(provider);
    config.base_url = base_url.to_string();
    config.api_key = api_key.map(str::to_string);
    config.retry.initial_backoff_ms = 1;
    config.retry.max_backoff_ms = 5;
    config.timeouts = config::LlmTimeouts { request_secs: 2, connect_secs: 1 };
    config
}

fn melody_prompt() -> RenderedPrompt {
    prompt::build(&GenerationRequest::Melody(MelodyParams::default()))
}

/// Chat-completions endpoint answering with `content`, or 404 for `grok-missing`.
fn grok_router(content: &'static str, hits: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        "/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer test-key") {
                    return (StatusCode::UNAUTHORIZED, "bad key").into_response();
                }
                let model = body["model"].as_str().unwrap_or_default().to_string();
                if model == "grok-missing" {
                    return (StatusCode::NOT_FOUND, r#"{"error":"The model grok-missing does not exist"}"#)
                        .into_response();
                }
                Json(json!({
                    "model": model,
                    "choices": [{ "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }]
                }))
                .into_response()
            }
        }),
    )
}

fn gemini_router(status: StatusCode, hits: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        "/models/{action}",
        post(move |Path(action): Path<String>, headers: HeaderMap| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                if headers.get("x-goog-api-key").is_none() || !action.ends_with(":generateContent") {
                    return (StatusCode::BAD_REQUEST, "bad request").into_response();
                }
                if status != StatusCode::OK {
                    return (status, "backend error").into_response();
                }
                Json(json!({
                    "candidates": [{
                        "content": { "parts": [ { "text": "{\"status\":" }, { "text": " \"OK\"}" } ] },
                        "finishReason": "STOP"
                    }]
                }))
                .into_response()
            }
        }),
    )
}

#[tokio::test]
async fn grok_call_returns_text() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(grok_router(r#"{"a":1}"#, hits.clone())).await;
    let client = ProviderClient::from_config(provider_config(ProviderId::Grok, &base, Some("test-key"))).unwrap();

    let resp = client.call("grok-3", &melody_prompt()).await.unwrap();
    assert_eq!(resp.text, r#"{"a":1}"#);
    assert_eq!(resp.model, "grok-3");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn grok_missing_model_is_attributed_and_classified() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(grok_router("{}", hits)).await;
    let client = ProviderClient::from_config(provider_config(ProviderId::Grok, &base, Some("test-key"))).unwrap();

    let err = client.call("grok-missing", &melody_prompt()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::ModelUnavailable);
    assert_eq!(err.provider, Some(ProviderId::Grok));
    assert_eq!(err.model.as_deref(), Some("grok-missing"));
    assert_eq!(err.status, Some(404));
}

#[tokio::test]
async fn gemini_call_joins_parts() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(gemini_router(StatusCode::OK, hits.clone())).await;
    let client = ProviderClient::from_config(provider_config(ProviderId::Gemini, &base, Some("test-key"))).unwrap();

    let resp = client.call("gemini-2.5-flash", &melody_prompt()).await.unwrap();
    assert_eq!(resp.text, r#"{"status": "OK"}"#);
    assert_eq!(client.id(), ProviderId::Gemini);
}

#[tokio::test]
async fn gemini_overload_is_classified() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(gemini_router(StatusCode::SERVICE_UNAVAILABLE, hits.clone())).await;
    let client = ProviderClient::from_config(provider_config(ProviderId::Gemini, &base, Some("test-key"))).unwrap();

    let err = client.call("gemini-2.5-flash", &melody_prompt()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::ServerOverloaded);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn self_check_passes_on_ok_reply() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(grok_router(r#"{"status": "OK"}"#, hits.clone())).await;
    let client = ProviderClient::from_config(provider_config(ProviderId::Grok, &base, Some("test-key")))
        .unwrap()
        .self_check()
        .await;
    assert!(client.is_available());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn self_check_failure_marks_unavailable() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(gemini_router(StatusCode::INTERNAL_SERVER_ERROR, hits)).await;
    let client = ProviderClient::from_config(provider_config(ProviderId::Gemini, &base, Some("test-key")))
        .unwrap()
        .self_check()
        .await;
    assert!(!client.is_available());
}

#[tokio::test]
async fn self_check_rejects_unexpected_reply() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(grok_router("I cannot help with that.", hits)).await;
    let client = ProviderClient::from_config(provider_config(ProviderId::Grok, &base, Some("test-key")))
        .unwrap()
        .self_check()
        .await;
    assert!(!client.is_available());
}

#[tokio::test]
async fn self_check_skips_unavailable_first_model() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(grok_router(r#"{"status": "OK"}"#, hits.clone())).await;
    let mut config = provider_config(ProviderId::Grok, &base, Some("test-key"));
    config.models = vec!["grok-missing".into(), "grok-3".into()];
    let client = ProviderClient::from_config(config).unwrap().self_check().await;

    assert!(client.is_available());
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn self_check_fails_when_every_model_is_unavailable() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(grok_router(r#"{"status": "OK"}"#, hits.clone())).await;
    let mut config = provider_config(ProviderId::Grok, &base, Some("test-key"));
    config.models = vec!["grok-missing".into(), "grok-missing".into()];
    let client = ProviderClient::from_config(config).unwrap().self_check().await;

    assert!(!client.is_available());
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn self_check_rejects_reply_containing_ok_inside_a_word() {
    for reply in ["BROKEN", "TOKEN LIMIT reached", r#"{"status": "error"}"#] {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(grok_router(reply, hits)).await;
        let client = ProviderClient::from_config(provider_config(ProviderId::Grok, &base, Some("test-key")))
            .unwrap()
            .self_check()
            .await;
        assert!(!client.is_available(), "accepted {reply:?}");
    }
}

#[test]
fn ok_reply_accepts_json_status_and_bare_word() {
    assert!(is_ok_reply(r#"{"status": "OK"}"#));
    assert!(is_ok_reply("```json\n{\"status\":\"ok\"}\n```"));
    assert!(is_ok_reply("OK."));
    assert!(!is_ok_reply("BROKEN"));
    assert!(!is_ok_reply(r#"{"reply": "OK"}"#));
}

#[tokio::test]
async fn missing_key_is_unavailable_without_probing() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(grok_router("{}", hits.clone())).await;
    let client = ProviderClient::from_config(provider_config(ProviderId::Grok, &base, None))
        .unwrap()
        .self_check()
        .await;
    assert!(!client.is_available());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn default_classification_uses_shared_table() {
    let client = ProviderClient::from_config(ProviderConfig::defaults(ProviderId::Grok)).unwrap();
    assert_eq!(client.classify_failure(Some(429), ""), FailureKind::RateLimited);
    assert_eq!(client.classify_failure(None, "connection reset"), FailureKind::TransportError);
}
