use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Dispatch strategy settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Translation backend config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Dispatch strategy selection
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Concurrent fan-out with submission-order output
    #[default]
    Parallel,
    /// One request at a time with conversational history
    Serial,
}

impl DispatchMode {
    /// Lowercase mode identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Parallel => "parallel".to_string(),
            Self::Serial => "serial".to_string(),
        }
    }
}

impl std::fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for DispatchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "parallel" => Ok(Self::Parallel),
            "serial" => Ok(Self::Serial),
            _ => Err(anyhow!("Invalid dispatch mode: {}", s)),
        }
    }
}

/// Settings shared by both dispatch strategies
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DispatchConfig {
    /// Which dispatch strategy to run; a deployment chooses exactly one
    #[serde(default)]
    pub mode: DispatchMode,

    /// Per-task timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Coordinator loop interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum concurrent backend calls (parallel mode)
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Number of past assistant turns kept as context (serial mode)
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::default(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            max_concurrent_requests: default_max_concurrent_requests(),
            history_size: default_history_size(),
        }
    }
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: OpenAI
    #[default]
    OpenAI,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
    // @provider: DeepLX machine translation
    DeepLX,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::LMStudio => "LM Studio",
            Self::DeepLX => "DeepLX",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
            Self::DeepLX => "deeplx".to_string(),
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "lmstudio" => Ok(Self::LMStudio),
            "deeplx" => Ok(Self::DeepLX),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Target language code (DeepLX)
    #[serde(default = "default_target_lang")]
    pub target_lang: String,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::OpenAI => Self {
                provider_type: "openai".to_string(),
                model: default_openai_model(),
                api_key: String::new(),
                endpoint: default_openai_endpoint(),
                target_lang: default_target_lang(),
            },
            TranslationProvider::LMStudio => Self {
                provider_type: "lmstudio".to_string(),
                model: default_lmstudio_model(),
                api_key: String::new(),
                endpoint: default_lmstudio_endpoint(),
                target_lang: default_target_lang(),
            },
            TranslationProvider::DeepLX => Self {
                provider_type: "deeplx".to_string(),
                model: String::new(),
                api_key: String::new(),
                endpoint: default_deeplx_endpoint(),
                target_lang: default_target_lang(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Optional secondary provider tried when the primary call fails
    #[serde(default)]
    pub fallback: Option<TranslationProvider>,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt for chat providers
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_poll_interval_ms() -> u64 {
    100 // Matches the coordinator loop granularity the timeout bound assumes
}

fn default_max_concurrent_requests() -> usize {
    32
}

fn default_history_size() -> usize {
    10
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_temperature() -> f32 {
    0.3
}

fn default_target_lang() -> String {
    "ZH".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_lmstudio_endpoint() -> String {
    // LM Studio default server (OpenAI compatible) runs on port 1234 under /v1
    "http://localhost:1234/v1".to_string()
}

fn default_deeplx_endpoint() -> String {
    "https://api.deeplx.org/translate".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_lmstudio_model() -> String {
    // Placeholder; users should set to the loaded model name in LM Studio
    "local-model".to_string()
}

fn default_system_prompt() -> String {
    "You are a professional translator for live captions. Translate each line the user sends. Only respond with the translated text, without any explanations or notes.".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.timeout_secs == 0 {
            return Err(anyhow!("Dispatch timeout must be at least one second"));
        }

        if self.dispatch.poll_interval_ms == 0 {
            return Err(anyhow!("Poll interval must be greater than zero"));
        }

        if self.dispatch.max_concurrent_requests == 0 {
            return Err(anyhow!("Max concurrent requests must be at least 1"));
        }

        if self.dispatch.mode == DispatchMode::Serial && self.dispatch.history_size == 0 {
            return Err(anyhow!("History size must be at least 1 in serial mode"));
        }

        // Validate API key for providers that require one
        if self.translation.provider == TranslationProvider::OpenAI {
            let api_key = self.translation.get_api_key();
            if api_key.is_empty() {
                return Err(anyhow!("Translation API key is required for OpenAI provider"));
            }
        }

        let endpoint = self.translation.get_endpoint_for(&self.translation.provider);
        url::Url::parse(&endpoint)
            .map_err(|e| anyhow!("Invalid endpoint URL '{}': {}", endpoint, e))?;

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            dispatch: DispatchConfig::default(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        self.get_model_for(&self.provider)
    }

    /// Get the model for a specific provider
    pub fn get_model_for(&self, provider_type: &TranslationProvider) -> String {
        if let Some(provider_config) = self.get_provider_config(provider_type) {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        // Default fallback based on provider type
        match provider_type {
            TranslationProvider::OpenAI => default_openai_model(),
            TranslationProvider::LMStudio => default_lmstudio_model(),
            TranslationProvider::DeepLX => String::new(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_api_key_for(&self.provider)
    }

    /// Get the API key for a specific provider
    pub fn get_api_key_for(&self, provider_type: &TranslationProvider) -> String {
        if let Some(provider_config) = self.get_provider_config(provider_type) {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        // Default fallback - local and keyless providers
        String::new()
    }

    /// Get the endpoint for a specific provider
    pub fn get_endpoint_for(&self, provider_type: &TranslationProvider) -> String {
        if let Some(provider_config) = self.get_provider_config(provider_type) {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        // Default fallback based on provider type
        match provider_type {
            TranslationProvider::OpenAI => default_openai_endpoint(),
            TranslationProvider::LMStudio => default_lmstudio_endpoint(),
            TranslationProvider::DeepLX => default_deeplx_endpoint(),
        }
    }

    /// Get the target language for a specific provider
    pub fn get_target_lang_for(&self, provider_type: &TranslationProvider) -> String {
        if let Some(provider_config) = self.get_provider_config(provider_type) {
            if !provider_config.target_lang.is_empty() {
                return provider_config.target_lang.clone();
            }
        }

        default_target_lang()
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let mut config = Self {
            provider: TranslationProvider::default(),
            fallback: None,
            available_providers: Vec::new(),
            common: TranslationCommonConfig::default(),
        };

        // Add default providers
        config.available_providers.push(ProviderConfig::new(TranslationProvider::OpenAI));
        config.available_providers.push(ProviderConfig::new(TranslationProvider::LMStudio));
        config.available_providers.push(ProviderConfig::new(TranslationProvider::DeepLX));

        config
    }
}
