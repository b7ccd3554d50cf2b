use std::future::Future;
use std::time::Duration;

use super::classification::ErrorClassification;
use super::types::SpeculaError;
use tracing::warn;

impl ErrorClassification {
    /// Calculate the retry delay for this classification based on the
    /// current attempt number (0-indexed).
    ///
    /// - rate_limit: 15s + (attempt * 10s), capped at 90s
    /// - everything else: base * 2^attempt + random jitter (0-1s), capped
    pub fn retry_delay(&self, attempt: u32, config: &RetryConfig) -> Duration {
        use super::classification::MissionErrorKind;
        match self.kind {
            MissionErrorKind::RateLimit => {
                let secs = 15 + (attempt as u64 * 10);
                Duration::from_secs(secs.min(90))
            }
            _ => {
                let base = config.base_delay.as_secs_f64() * 2.0_f64.powi(attempt as i32);
                let jitter: f64 = rand::random::<f64>();
                let secs = (base + jitter).min(config.max_delay.as_secs_f64());
                Duration::from_secs_f64(secs)
            }
        }
    }
}

/// Retry policy for the reasoning-engine boundary.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Execute an async operation with retry logic.
///
/// Retries only when the error classifies as retryable and attempts remain.
/// Credential and preflight errors fail immediately.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    mut factory: F,
) -> Result<T, SpeculaError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SpeculaError>>,
{
    let max_attempts = config.max_retries + 1;
    let mut last_error = None;

    for attempt in 0..max_attempts {
        match factory().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let classification = e.classify();

                if !classification.retryable || attempt + 1 >= max_attempts {
                    if !classification.retryable {
                        warn!(
                            operation = operation_name,
                            kind = classification.kind.as_str(),
                            "Non-retryable error, failing immediately"
                        );
                    } else {
                        warn!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            max = max_attempts,
                            "Max retries exhausted"
                        );
                    }
                    return Err(e);
                }

                let delay = classification.retry_delay(attempt, config);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max = max_attempts,
                    kind = classification.kind.as_str(),
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "Retrying after error"
                );

                tokio::time::sleep(delay).await;
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| SpeculaError::Internal("Retry loop exited unexpectedly".into())))
}
