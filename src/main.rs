mod error;
mod feature;
mod llm;
mod normalize;
mod prompt;
mod routes;
mod schema;
mod services;
mod state;

use std::sync::Arc;

use llm::{LlmProvider, ProviderClient};
use llm::config::ProviderConfig;
use llm::types::{LlmError, ProviderId};

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Build one provider client, optionally probing it once.
async fn init_provider(provider: ProviderId, self_check: bool) -> Result<ProviderClient, LlmError> {
    let config = ProviderConfig::from_env(provider)?;
    let client = ProviderClient::from_config(config)?;
    let client = if self_check { client.self_check().await } else { client };

    if client.is_available() {
        tracing::info!(%provider, models = ?client.config().models, "provider ready");
    } else {
        tracing::warn!(%provider, "provider unavailable, requests will skip it");
    }
    Ok(client)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()
        .expect("invalid PORT");
    let self_check = env_flag("PROVIDER_SELF_CHECK", true);
    let origins = routes::parse_origins(
        &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| routes::DEFAULT_CORS_ORIGINS.into()),
    );

    let primary = init_provider(ProviderId::Grok, self_check)
        .await
        .expect("grok provider config invalid");
    let secondary = init_provider(ProviderId::Gemini, self_check)
        .await
        .expect("gemini provider config invalid");

    let dispatcher = services::dispatch::Dispatcher::new(Arc::new(primary), Arc::new(secondary));
    let app = routes::app(state::AppState::new(dispatcher), origins);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "studio gateway listening");
    axum::serve(listener, app).await.expect("server failed");
}
