use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Client for the DeepLX machine-translation API
///
/// A lightweight alternative to the chat providers: no prompt, no history,
/// just source text in and translated text out. Commonly used as the
/// fallback backend when a chat provider is unavailable.
#[derive(Debug)]
pub struct DeepLx {
    /// Full URL of the translate endpoint
    endpoint: String,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Delay between retry attempts in milliseconds
    retry_delay_ms: u64,
}

/// Translate request for the DeepLX API
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateRequest {
    /// Text to translate
    text: String,
    /// Source language code, "auto" for detection
    source_lang: String,
    /// Target language code
    target_lang: String,
}

/// Translate response from the DeepLX API
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    /// Translated text
    pub data: String,
}

impl TranslateRequest {
    /// Create a new translate request with automatic source detection
    pub fn new(text: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_lang: "auto".to_string(),
            target_lang: target_lang.into(),
        }
    }

    /// Set an explicit source language
    #[allow(dead_code)]
    pub fn source_lang(mut self, source_lang: impl Into<String>) -> Self {
        self.source_lang = source_lang.into();
        self
    }
}

impl DeepLx {
    /// Create a new client with default retry settings
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::new_with_config(endpoint, 2, 500)
    }

    /// Create a new client with retry configuration
    pub fn new_with_config(
        endpoint: impl Into<String>,
        max_retries: u32,
        retry_delay_ms: u64,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            max_retries,
            retry_delay_ms,
        }
    }

    /// Translate text with retry on transient failures
    pub async fn translate(
        &self,
        request: &TranslateRequest,
    ) -> Result<TranslateResponse, ProviderError> {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            match self.client.post(&self.endpoint).json(request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.json::<TranslateResponse>().await {
                            Ok(parsed) => return Ok(parsed),
                            Err(e) => {
                                error!("Failed to parse DeepLX response: {}", e);
                                return Err(ProviderError::ParseError(e.to_string()));
                            }
                        }
                    } else {
                        let error_text = response.text().await
                            .unwrap_or_else(|_| "Failed to get error response text".to_string());
                        error!(
                            "DeepLX API error ({}): {} - attempt {}/{}",
                            status, error_text, attempt + 1, self.max_retries + 1
                        );
                        last_error = Some(ProviderError::ApiError {
                            status_code: status.as_u16(),
                            message: error_text,
                        });
                    }
                }
                Err(e) => {
                    // Network errors, including TLS failures, are retried
                    error!(
                        "DeepLX network error: {} - attempt {}/{}",
                        e, attempt + 1, self.max_retries + 1
                    );
                    last_error = Some(ProviderError::ConnectionError(e.to_string()));
                }
            }

            attempt += 1;
            if attempt <= self.max_retries {
                tokio::time::sleep(Duration::from_millis(self.retry_delay_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!(
                "DeepLX request failed after {} attempts", self.max_retries + 1
            ))
        }))
    }
}

#[async_trait::async_trait]
impl Provider for DeepLx {
    type Request = TranslateRequest;
    type Response = TranslateResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.translate(&request).await
    }

    fn extract_text(response: &Self::Response) -> String {
        response.data.clone()
    }
}
