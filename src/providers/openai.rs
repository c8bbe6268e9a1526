use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::dispatch::history::ChatMessage;
use crate::errors::ProviderError;
use crate::providers::Provider;

/// Client for OpenAI-compatible chat completion endpoints
///
/// Works against the OpenAI API as well as local OpenAI-compatible servers
/// (LM Studio, llama.cpp server, vLLM).
#[derive(Debug)]
pub struct OpenAi {
    /// Base URL of the API, e.g. "https://api.openai.com/v1"
    base_url: String,
    /// API key sent as a bearer token; may be empty for local servers
    api_key: String,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Chat completion request for OpenAI-compatible APIs
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// One completion choice in a chat response
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatChoice {
    /// The generated message
    pub message: ChatMessage,
    /// Why generation stopped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Token usage reported by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u32,
    /// Number of completion tokens
    pub completion_tokens: u32,
    /// Total number of tokens
    pub total_tokens: u32,
}

/// Chat completion response from OpenAI-compatible APIs
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Completion choices
    pub choices: Vec<ChatChoice>,
    /// Token usage, when the server reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ChatUsage>,
}

/// Builder methods for ChatCompletionRequest - API surface for library consumers
#[allow(dead_code)]
impl ChatCompletionRequest {
    /// Create a new chat completion request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
            stream: Some(false),
        }
    }

    /// Append a single message
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new(role, content));
        self
    }

    /// Append prior conversation turns
    pub fn add_history(mut self, history: &[ChatMessage]) -> Self {
        self.messages.extend_from_slice(history);
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// OpenAI client implementation - some methods are API surface for library consumers
#[allow(dead_code)]
impl OpenAi {
    /// Create a new client with default retry settings
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new_with_config(api_key, endpoint, 2, 500)
    }

    /// Create a new client with retry configuration
    ///
    /// Uses connection pooling for better performance with concurrent requests.
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Self {
        let endpoint = endpoint.into();
        let base_url = endpoint.trim_end_matches('/').to_string();

        Self {
            base_url,
            api_key: api_key.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                // Keep connections alive for better performance
                .pool_idle_timeout(Duration::from_secs(90))
                .pool_max_idle_per_host(20)
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            max_retries,
            backoff_base_ms,
        }
    }

    /// Backoff delay before the given retry attempt, in milliseconds
    ///
    /// Exponential in the attempt number, with the exponent capped so large
    /// configured retry counts cannot overflow the delay arithmetic.
    fn backoff_for_attempt(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base_ms.saturating_mul(1u64 << exponent)
    }

    /// Send a chat completion request with retry logic
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            let mut builder = self.client.post(&url).json(request);
            if !self.api_key.is_empty() {
                builder = builder.bearer_auth(&self.api_key);
            }

            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let response_text = response.text().await.map_err(|e| {
                            ProviderError::RequestFailed(format!(
                                "Failed to read chat completion response body: {}", e
                            ))
                        })?;

                        match serde_json::from_str::<ChatCompletionResponse>(&response_text) {
                            Ok(parsed) => {
                                if parsed.choices.is_empty() {
                                    return Err(ProviderError::ParseError(
                                        "Chat completion response contained no choices".to_string(),
                                    ));
                                }
                                return Ok(parsed);
                            }
                            Err(e) => {
                                error!(
                                    "Failed to parse chat completion response: {}. Raw response (first 500 chars): {}",
                                    e,
                                    response_text.chars().take(500).collect::<String>()
                                );
                                return Err(ProviderError::ParseError(e.to_string()));
                            }
                        }
                    } else if status.is_server_error() || status.as_u16() == 429 {
                        // Server error or rate limit - can retry
                        let error_text = response.text().await
                            .unwrap_or_else(|_| "Failed to get error response text".to_string());
                        error!(
                            "Chat completion API error ({}): {} - attempt {}/{}",
                            status, error_text, attempt + 1, self.max_retries + 1
                        );
                        last_error = Some(ProviderError::ApiError {
                            status_code: status.as_u16(),
                            message: error_text,
                        });
                    } else if status.as_u16() == 401 || status.as_u16() == 403 {
                        // Authentication failure - don't retry
                        let error_text = response.text().await
                            .unwrap_or_else(|_| "Failed to get error response text".to_string());
                        return Err(ProviderError::AuthenticationError(error_text));
                    } else {
                        // Other client error - don't retry
                        let error_text = response.text().await
                            .unwrap_or_else(|_| "Failed to get error response text".to_string());
                        error!("Chat completion API error ({}): {}", status, error_text);
                        return Err(ProviderError::ApiError {
                            status_code: status.as_u16(),
                            message: error_text,
                        });
                    }
                }
                Err(e) => {
                    // Network error - can retry
                    error!(
                        "Chat completion network error: {} - attempt {}/{}",
                        e, attempt + 1, self.max_retries + 1
                    );
                    last_error = Some(ProviderError::ConnectionError(e.to_string()));
                }
            }

            attempt += 1;

            // If we have more retries left, wait with exponential backoff
            if attempt <= self.max_retries {
                let backoff_ms = self.backoff_for_attempt(attempt);
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!(
                "Chat completion request failed after {} attempts", self.max_retries + 1
            ))
        }))
    }
}

#[async_trait::async_trait]
impl Provider for OpenAi {
    type Request = ChatCompletionRequest;
    type Response = ChatCompletionResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.chat_completion(&request).await
    }

    fn extract_text(response: &Self::Response) -> String {
        response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}
