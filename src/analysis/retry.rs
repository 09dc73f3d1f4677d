use crate::analysis::types::RetryConfig;
use std::time::Duration;

/// Exponential backoff arithmetic. Deciding *whether* an error is retried is
/// left to the dispatch loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    config: RetryConfig,
}

impl RetryPolicy {
    /// `retry_attempts` comes straight from the service config; a value of 0
    /// still allows the initial attempt.
    pub fn new(retry_attempts: u32, config: RetryConfig) -> Self {
        Self {
            max_attempts: retry_attempts.max(1),
            config,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn max_rate_limit_retries(&self) -> u32 {
        self.config.max_rate_limit_retries
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Delay before the attempt following `attempt` (1-based):
    /// `min(max_delay, base_delay * multiplier^(attempt-1))`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.config.backoff_multiplier.max(1.0).powi(exponent);
        let millis = self.config.base_delay.as_millis() as f64 * factor;
        let max_millis = self.config.max_delay.as_millis() as f64;

        if !millis.is_finite() || millis >= max_millis {
            self.config.max_delay
        } else {
            Duration::from_millis(millis as u64)
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::env::defaults::RETRY_ATTEMPTS, RetryConfig::default())
    }
}
