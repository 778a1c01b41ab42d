//! Exponential backoff with jitter (spec §4.1), shaped after
//! `riptide-fetch::fetch::RetryConfig`.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(20),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Delay before the `attempt`-th retry (0-indexed: 0 is the delay
    /// before the first retry after the initial failed call).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        let capped = scaled.min(self.max_delay.as_secs_f64());
        let with_jitter = if self.jitter {
            let jitter_fraction: f64 = rand::thread_rng().gen_range(0.0..0.25);
            capped * (1.0 + jitter_fraction)
        } else {
            capped
        };
        Duration::from_secs_f64(with_jitter.min(self.max_delay.as_secs_f64() * 1.25))
    }

    /// 4xx responses are not retried except for 408 (timeout) and 429
    /// (rate limited); 5xx and network errors are always retryable.
    pub fn should_retry_status(status: u16) -> bool {
        match status {
            408 | 429 => true,
            400..=499 => false,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_with_attempt_and_stays_capped() {
        let cfg = RetryConfig {
            jitter: false,
            ..RetryConfig::default()
        };
        assert_eq!(cfg.delay_for(0), cfg.initial_delay);
        assert!(cfg.delay_for(1) > cfg.delay_for(0));
        assert!(cfg.delay_for(10) <= cfg.max_delay);
    }

    #[test]
    fn status_retry_policy_skips_client_errors_except_408_429() {
        assert!(!RetryConfig::should_retry_status(404));
        assert!(!RetryConfig::should_retry_status(400));
        assert!(RetryConfig::should_retry_status(408));
        assert!(RetryConfig::should_retry_status(429));
        assert!(RetryConfig::should_retry_status(503));
    }
}
