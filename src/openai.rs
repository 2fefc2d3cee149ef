//! OpenAI client construction from explicit configuration.
//!
//! The API key and base URL always come from an [`OpenAiSettings`] value
//! passed at construction, never from process-wide mutable state.

use crate::config::OpenAiSettings;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client for the given settings.
///
/// Uses a 5-minute timeout by default to prevent hung API calls.
pub fn create_client(settings: &OpenAiSettings) -> Client<OpenAIConfig> {
    create_client_with_timeout(settings, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(
    settings: &OpenAiSettings,
    timeout: Duration,
) -> Client<OpenAIConfig> {
    let mut config = OpenAIConfig::default();
    if let Some(key) = &settings.api_key {
        config = config.with_api_key(key.clone());
    }
    if let Some(base) = &settings.api_base {
        config = config.with_api_base(base.clone());
    }

    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(config).with_http_client(http_client)
}
