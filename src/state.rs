//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the dispatcher, which owns both provider clients. Provider
//! configs and HTTP clients are immutable after startup, so the state is
//! shared without locks.

use std::sync::Arc;

use crate::services::dispatch::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher: Arc::new(dispatcher) }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm::LlmProvider;
    use crate::llm::config::ProviderConfig;
    use crate::llm::types::{FailureKind, FailureRecord, ProviderId, RawModelResponse};
    use crate::prompt::RenderedPrompt;

    /// Scripted provider. Each call consumes the next scripted outcome and
    /// records the model it was asked for.
    pub struct MockProvider {
        config: ProviderConfig,
        available: bool,
        script: Mutex<Vec<Result<String, FailureKind>>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockProvider {
        pub fn new(provider: ProviderId, models: &[&str], script: Vec<Result<&str, FailureKind>>) -> Self {
            let mut config = ProviderConfig::defaults(provider);
            config.api_key = Some("test-key".into());
            config.models = models.iter().map(|m| (*m).to_string()).collect();
            Self {
                config,
                available: true,
                script: Mutex::new(script.into_iter().map(|r| r.map(str::to_string)).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// A provider without credentials.
        pub fn unavailable(provider: ProviderId) -> Self {
            let mut mock = Self::new(provider, &["unused"], Vec::new());
            mock.config.api_key = None;
            mock.available = false;
            mock
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        fn id(&self) -> ProviderId {
            self.config.provider
        }

        fn config(&self) -> &ProviderConfig {
            &self.config
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn call(&self, model: &str, _prompt: &RenderedPrompt) -> Result<RawModelResponse, FailureRecord> {
            self.calls.lock().unwrap().push(model.to_string());
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Err(FailureRecord::new(FailureKind::TransportError, "script exhausted")
                    .attributed(self.config.provider, model));
            }
            match script.remove(0) {
                Ok(text) => Ok(RawModelResponse { text, model: model.to_string(), status: 200, finish_reason: None }),
                Err(kind) => Err(FailureRecord::new(kind, format!("scripted {kind}")).attributed(self.config.provider, model)),
            }
        }
    }

    /// Valid melody payload for scripted successes.
    pub const MELODY_JSON: &str =
        r#"{"scale":"major","key":"C","notes":["C4","E4","G4"],"intervals":["M3","m3"],"suggestion":"Hum it first"}"#;

    #[must_use]
    pub fn test_app_state(primary: Arc<MockProvider>, secondary: Arc<MockProvider>) -> AppState {
        AppState::new(Dispatcher::new(primary, secondary))
    }
}
