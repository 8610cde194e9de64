//! Provider wiring: builds the configured backend behind the retry policy.

use std::sync::Arc;
use std::time::Duration;
use catalogist_config::AppConfig;
use catalogist_core::provider::Provider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::retry::{RetryPolicy, RetryingProvider};

/// Build the retry policy described by `[compensation]`.
pub fn retry_policy(config: &AppConfig) -> RetryPolicy {
    RetryPolicy {
        max_attempts: config.compensation.max_retries,
        delay: Duration::from_secs(config.compensation.retry_delay_secs),
        attempt_timeout: Duration::from_secs(config.compensation.request_timeout_secs),
    }
}

/// Build the backend from configuration.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    let api_key = config.api_key.clone().unwrap_or_default();
    let policy = retry_policy(config);

    let backend = OpenAiCompatProvider::with_timeout(
        provider_name(&config.api_url),
        &config.api_url,
        &api_key,
        policy.attempt_timeout,
    );

    Arc::new(RetryingProvider::new(Arc::new(backend), policy))
}

/// Derive a short provider label from a base URL for logs.
fn provider_name(api_url: &str) -> String {
    let host = api_url
        .split("://")
        .nth(1)
        .unwrap_or(api_url)
        .split(['/', ':'])
        .next()
        .unwrap_or_default();

    match host {
        "api.openai.com" => "openai".into(),
        "dashscope.aliyuncs.com" => "dashscope".into(),
        "api.deepseek.com" => "deepseek".into(),
        "localhost" | "127.0.0.1" => "local".into(),
        "" => "custom".into(),
        other => other.to_string(),
    }
}
