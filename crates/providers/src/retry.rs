//! Retry policy: bounded re-attempts with a per-attempt timeout.
//!
//! Wraps any provider. Each attempt is cut off after `attempt_timeout`;
//! transient failures (timeouts, dropped connections, interrupted bodies)
//! are retried after a fixed `delay`, up to `max_attempts` in total.
//! Every other error propagates immediately.

use async_trait::async_trait;
use catalogist_core::error::ProviderError;
use catalogist_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How often and how long to try a backend call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
            attempt_timeout: Duration::from_secs(180),
        }
    }
}

/// A provider that re-issues transient failures according to a [`RetryPolicy`].
pub struct RetryingProvider {
    inner: Arc<dyn Provider>,
    policy: RetryPolicy,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn Provider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl Provider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let attempts = self.policy.max_attempts.max(1);
        let provider_name = self.inner.name().to_string();
        let mut last_error = ProviderError::NotConfigured("No attempts made".into());

        for attempt in 1..=attempts {
            if attempt > 1 {
                info!(
                    provider = %provider_name,
                    attempt,
                    total = attempts,
                    delay_secs = self.policy.delay.as_secs(),
                    "Retrying backend call"
                );
                tokio::time::sleep(self.policy.delay).await;
            }

            match tokio::time::timeout(self.policy.attempt_timeout, self.inner.complete(request.clone()))
                .await
            {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) if e.is_transient() => {
                    warn!(
                        provider = %provider_name,
                        attempt,
                        error = %e,
                        "Backend call failed with a transient error"
                    );
                    last_error = e;
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    warn!(
                        provider = %provider_name,
                        attempt,
                        timeout_secs = self.policy.attempt_timeout.as_secs(),
                        "Backend call timed out"
                    );
                    last_error = ProviderError::Timeout(format!(
                        "Provider '{}' timed out after {}s",
                        provider_name,
                        self.policy.attempt_timeout.as_secs()
                    ));
                }
            }
        }

        warn!(provider = %provider_name, attempts, "Backend call failed after all attempts");
        Err(last_error)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalogist_core::message::Message;
    use std::sync::Mutex;

    /// Fails with the queued errors in order, then succeeds.
    struct FlakyProvider {
        errors: Mutex<Vec<ProviderError>>,
        call_count: Mutex<usize>,
    }

    impl FlakyProvider {
        fn new(mut errors: Vec<ProviderError>) -> Self {
            errors.reverse();
            Self {
                errors: Mutex::new(errors),
                call_count: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl Provider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            if let Some(e) = self.errors.lock().unwrap().pop() {
                return Err(e);
            }
            Ok(ProviderResponse {
                message: Message::assistant("success"),
                usage: None,
                model: "test-model".into(),
            })
        }
    }

    /// A mock provider that hangs forever (for timeout testing).
    struct HangingProvider {
        call_count: Mutex<usize>,
    }

    #[async_trait]
    impl Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    fn test_request() -> ProviderRequest {
        ProviderRequest::new("test", vec![Message::user("hello")])
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_succeeds() {
        let inner = Arc::new(FlakyProvider::new(vec![]));
        let provider = RetryingProvider::new(inner.clone(), RetryPolicy::default());

        let result = provider.complete(test_request()).await;
        assert_eq!(result.unwrap().message.content, "success");
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_then_succeeds() {
        let inner = Arc::new(FlakyProvider::new(vec![
            ProviderError::Network("connection reset".into()),
            ProviderError::StreamInterrupted("eof".into()),
        ]));
        let provider = RetryingProvider::new(inner.clone(), RetryPolicy::default());

        let started = tokio::time::Instant::now();
        let result = provider.complete(test_request()).await;
        assert!(result.is_ok());
        assert_eq!(inner.calls(), 3);
        // Two pauses of 5s each
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let inner = Arc::new(FlakyProvider::new(vec![
            ProviderError::Timeout("1".into()),
            ProviderError::Timeout("2".into()),
            ProviderError::Network("3".into()),
            ProviderError::Network("never reached".into()),
        ]));
        let provider = RetryingProvider::new(inner.clone(), RetryPolicy::default());

        let err = provider.complete(test_request()).await.unwrap_err();
        assert_eq!(inner.calls(), 3);
        match err {
            ProviderError::Network(msg) => assert_eq!(msg, "3"),
            other => panic!("Expected last Network error, got: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_error_is_not_retried() {
        let inner = Arc::new(FlakyProvider::new(vec![ProviderError::AuthenticationFailed(
            "bad key".into(),
        )]));
        let provider = RetryingProvider::new(inner.clone(), RetryPolicy::default());

        let err = provider.complete(test_request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_attempts_time_out() {
        let inner = Arc::new(HangingProvider {
            call_count: Mutex::new(0),
        });
        let policy = RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(30),
        };
        let provider = RetryingProvider::new(inner.clone(), policy);

        let err = provider.complete(test_request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
        assert_eq!(*inner.call_count.lock().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_tries_once() {
        let inner = Arc::new(FlakyProvider::new(vec![]));
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        let provider = RetryingProvider::new(inner.clone(), policy);
        assert!(provider.complete(test_request()).await.is_ok());
        assert_eq!(inner.calls(), 1);
        assert_eq!(provider.name(), "flaky");
    }
}
