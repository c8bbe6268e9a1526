/*!
 * Backend call collaborator.
 *
 * The dispatchers only need "submit text, eventually receive translated text
 * or nothing". This module owns everything behind that line: the empty-input
 * short-circuit, the call to the configured provider, and the optional
 * fallback to a secondary provider when the primary call fails. Transient
 * failures are retried inside the provider clients; by the time a call
 * returns `None` here, every configured backend has given up.
 */

use log::{debug, warn};

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::dispatch::history::ChatMessage;
use crate::providers::deeplx::{DeepLx, TranslateRequest};
use crate::providers::mock::{MockProvider, MockRequest};
use crate::providers::openai::{ChatCompletionRequest, OpenAi};
use crate::providers::Provider;

/// Sentinel returned for empty input without contacting any backend
pub const NO_CONTENT_SENTINEL: &str = "......";

/// Translation backend implementation variants
#[derive(Debug)]
enum BackendImpl {
    /// OpenAI API service
    OpenAI {
        /// Client instance
        client: OpenAi,
        /// Model identifier
        model: String,
    },

    /// LM Studio local server (OpenAI-compatible)
    LMStudio {
        /// Client instance (OpenAI-compatible)
        client: OpenAi,
        /// Model identifier
        model: String,
    },

    /// DeepLX machine-translation service
    DeepLX {
        /// Client instance
        client: DeepLx,
        /// Target language code
        target_lang: String,
    },

    /// Scripted provider for tests
    Mock {
        /// Client instance
        client: MockProvider,
    },
}

impl BackendImpl {
    fn from_config(config: &TranslationConfig, kind: &ConfigTranslationProvider) -> Self {
        let retry_count = config.common.retry_count;
        let retry_backoff_ms = config.common.retry_backoff_ms;

        match kind {
            ConfigTranslationProvider::OpenAI => Self::OpenAI {
                client: OpenAi::new_with_config(
                    config.get_api_key_for(kind),
                    config.get_endpoint_for(kind),
                    retry_count,
                    retry_backoff_ms,
                ),
                model: config.get_model_for(kind),
            },
            ConfigTranslationProvider::LMStudio => {
                // LM Studio often doesn't require an API key; use a default if empty
                let api_key = {
                    let k = config.get_api_key_for(kind);
                    if k.is_empty() { "lm-studio".to_string() } else { k }
                };

                Self::LMStudio {
                    client: OpenAi::new_with_config(
                        api_key,
                        config.get_endpoint_for(kind),
                        retry_count,
                        retry_backoff_ms,
                    ),
                    model: config.get_model_for(kind),
                }
            }
            ConfigTranslationProvider::DeepLX => Self::DeepLX {
                client: DeepLx::new_with_config(
                    config.get_endpoint_for(kind),
                    retry_count,
                    retry_backoff_ms,
                ),
                target_lang: config.get_target_lang_for(kind),
            },
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::OpenAI { .. } => "OpenAI",
            Self::LMStudio { .. } => "LM Studio",
            Self::DeepLX { .. } => "DeepLX",
            Self::Mock { .. } => "Mock",
        }
    }
}

/// Client the dispatchers hand their backend calls to
///
/// Explicitly owned by the dispatcher instance; the pooled HTTP transport
/// inside each provider client is safe to share across worker tasks.
#[derive(Debug)]
pub struct TranslationClient {
    /// Primary backend
    primary: BackendImpl,

    /// Secondary backend tried when the primary call fails
    fallback: Option<BackendImpl>,

    /// System prompt sent to chat providers
    system_prompt: String,

    /// Sampling temperature for chat providers
    temperature: f32,
}

impl TranslationClient {
    /// Create a client from the translation configuration
    pub fn new(config: &TranslationConfig) -> Self {
        let primary = BackendImpl::from_config(config, &config.provider);
        let fallback = config
            .fallback
            .as_ref()
            .map(|kind| BackendImpl::from_config(config, kind));

        Self {
            primary,
            fallback,
            system_prompt: config.common.system_prompt.clone(),
            temperature: config.common.temperature,
        }
    }

    /// Create a client backed by a scripted mock provider, for tests
    pub fn mock(provider: MockProvider) -> Self {
        Self {
            primary: BackendImpl::Mock { client: provider },
            fallback: None,
            system_prompt: String::new(),
            temperature: 0.0,
        }
    }

    /// Create a mock-backed client with a mock fallback, for tests
    pub fn mock_with_fallback(primary: MockProvider, fallback: MockProvider) -> Self {
        Self {
            primary: BackendImpl::Mock { client: primary },
            fallback: Some(BackendImpl::Mock { client: fallback }),
            system_prompt: String::new(),
            temperature: 0.0,
        }
    }

    /// Translate one piece of text, with optional conversation history
    ///
    /// Returns `None` when every configured backend has failed; the
    /// dispatcher's timeout is the failure signal downstream, so no error
    /// is propagated from here.
    pub async fn translate(&self, text: &str, history: &[ChatMessage]) -> Option<String> {
        // Empty input short-circuits to the sentinel without any network interaction
        if text.trim().is_empty() {
            return Some(NO_CONTENT_SENTINEL.to_string());
        }

        match self.call_backend(&self.primary, text, history).await {
            Some(translated) => Some(translated),
            None => {
                let fallback = self.fallback.as_ref()?;
                debug!(
                    "Primary backend {} failed, trying fallback {}",
                    self.primary.name(),
                    fallback.name()
                );
                self.call_backend(fallback, text, history).await
            }
        }
    }

    async fn call_backend(
        &self,
        backend: &BackendImpl,
        text: &str,
        history: &[ChatMessage],
    ) -> Option<String> {
        let result = match backend {
            BackendImpl::OpenAI { client, model } | BackendImpl::LMStudio { client, model } => {
                let request = ChatCompletionRequest::new(model)
                    .add_message("system", &self.system_prompt)
                    .add_history(history)
                    .add_message("user", text)
                    .temperature(self.temperature);

                client
                    .complete(request)
                    .await
                    .map(|response| OpenAi::extract_text(&response))
            }
            BackendImpl::DeepLX { client, target_lang } => {
                // Machine translation has no conversational context
                let request = TranslateRequest::new(text, target_lang);
                client
                    .complete(request)
                    .await
                    .map(|response| DeepLx::extract_text(&response))
            }
            BackendImpl::Mock { client } => {
                let request = MockRequest {
                    text: text.to_string(),
                    history: history.to_vec(),
                };
                client
                    .complete(request)
                    .await
                    .map(|response| MockProvider::extract_text(&response))
            }
        };

        match result {
            Ok(translated) => Some(translated),
            Err(e) => {
                warn!("{} translation error: {}", backend.name(), e);
                None
            }
        }
    }
}
