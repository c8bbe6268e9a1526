/*!
 * Tests for app configuration functionality
 */

use std::str::FromStr;

use livetrans::app_config::{
    Config, DispatchMode, ProviderConfig, TranslationProvider,
};

#[test]
fn test_default_config_shouldUseParallelModeAndSaneBounds() {
    let config = Config::default();
    assert_eq!(config.dispatch.mode, DispatchMode::Parallel);
    assert_eq!(config.dispatch.timeout_secs, 5);
    assert_eq!(config.dispatch.poll_interval_ms, 100);
    assert!(config.dispatch.max_concurrent_requests >= 1);
    assert!(config.dispatch.history_size >= 1);
}

#[test]
fn test_default_config_shouldListAllProviders() {
    let config = Config::default();
    let types: Vec<&str> = config.translation.available_providers.iter()
        .map(|p| p.provider_type.as_str())
        .collect();
    assert!(types.contains(&"openai"));
    assert!(types.contains(&"lmstudio"));
    assert!(types.contains(&"deeplx"));
}

#[test]
fn test_parse_config_withPartialJson_shouldFillDefaults() {
    let json = r#"{
        "dispatch": { "mode": "serial", "history_size": 3 },
        "translation": { "provider": "deeplx" }
    }"#;

    let config: Config = serde_json::from_str(json).expect("partial config parses");
    assert_eq!(config.dispatch.mode, DispatchMode::Serial);
    assert_eq!(config.dispatch.history_size, 3);
    assert_eq!(config.dispatch.timeout_secs, 5);
    assert_eq!(config.translation.provider, TranslationProvider::DeepLX);
}

#[test]
fn test_validate_withZeroTimeout_shouldFail() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::DeepLX;
    config.dispatch.timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroHistoryInSerialMode_shouldFail() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::DeepLX;
    config.dispatch.mode = DispatchMode::Serial;
    config.dispatch.history_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroHistoryInParallelMode_shouldPass() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::DeepLX;
    config.dispatch.history_size = 0;
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withOpenAIAndNoApiKey_shouldFail() {
    let config = Config::default();
    assert_eq!(config.translation.provider, TranslationProvider::OpenAI);
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withOpenAIAndApiKey_shouldPass() {
    let mut config = Config::default();
    if let Some(provider_config) = config.translation.available_providers.iter_mut()
        .find(|p| p.provider_type == "openai") {
        provider_config.api_key = "test-api-key".to_string();
    }
    assert!(config.validate().is_ok());
}

#[test]
fn test_dispatchMode_fromStr_shouldRoundTrip() {
    assert_eq!(DispatchMode::from_str("parallel").unwrap(), DispatchMode::Parallel);
    assert_eq!(DispatchMode::from_str("SERIAL").unwrap(), DispatchMode::Serial);
    assert!(DispatchMode::from_str("batch").is_err());
    assert_eq!(DispatchMode::Serial.to_string(), "serial");
}

#[test]
fn test_translationProvider_fromStr_shouldRoundTrip() {
    assert_eq!(TranslationProvider::from_str("openai").unwrap(), TranslationProvider::OpenAI);
    assert_eq!(TranslationProvider::from_str("DeepLX").unwrap(), TranslationProvider::DeepLX);
    assert!(TranslationProvider::from_str("ollama").is_err());
    assert_eq!(TranslationProvider::LMStudio.display_name(), "LM Studio");
}

#[test]
fn test_getModelFor_withEmptyModel_shouldFallBackToDefault() {
    let mut config = Config::default();
    if let Some(provider_config) = config.translation.available_providers.iter_mut()
        .find(|p| p.provider_type == "openai") {
        provider_config.model = String::new();
    }
    assert_eq!(config.translation.get_model_for(&TranslationProvider::OpenAI), "gpt-4o-mini");
}

#[test]
fn test_getEndpointFor_withCustomEndpoint_shouldUseIt() {
    let mut config = Config::default();
    config.translation.available_providers = vec![ProviderConfig {
        provider_type: "deeplx".to_string(),
        model: String::new(),
        api_key: String::new(),
        endpoint: "http://localhost:1188/translate".to_string(),
        target_lang: "EN".to_string(),
    }];

    assert_eq!(
        config.translation.get_endpoint_for(&TranslationProvider::DeepLX),
        "http://localhost:1188/translate"
    );
    assert_eq!(
        config.translation.get_target_lang_for(&TranslationProvider::DeepLX),
        "EN"
    );
}

#[test]
fn test_getTargetLangFor_withoutProviderEntry_shouldDefaultToZh() {
    let mut config = Config::default();
    config.translation.available_providers.clear();
    assert_eq!(
        config.translation.get_target_lang_for(&TranslationProvider::DeepLX),
        "ZH"
    );
}

#[test]
fn test_serialize_config_shouldRoundTrip() {
    let config = Config::default();
    let json = serde_json::to_string_pretty(&config).expect("config serializes");
    let parsed: Config = serde_json::from_str(&json).expect("config parses back");
    assert_eq!(parsed.dispatch.mode, config.dispatch.mode);
    assert_eq!(parsed.translation.provider, config.translation.provider);
    assert_eq!(
        parsed.translation.available_providers.len(),
        config.translation.available_providers.len()
    );
}
