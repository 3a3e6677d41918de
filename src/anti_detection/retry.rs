use crate::config::{AntiDetectionConfig, DelayRange};
use std::time::Duration;

/// How often a blocked page is re-fetched and how long to back off in between
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: DelayRange,
    growth: f64,
    max_backoff_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &AntiDetectionConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: config.backoff,
            growth: if config.backoff_growth.is_finite() && config.backoff_growth >= 1.0 {
                config.backoff_growth
            } else {
                1.0
            },
            max_backoff_ms: config.max_backoff_ms,
        }
    }

    /// Total fetch attempts allowed per page, the first one included
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// True while a page blocked on `attempt` (1-based) may be fetched again
    pub fn allows_another(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Bounds of the sleep after the `attempt`-th blocked fetch.
    /// Attempt n scales the base range by growth^(n-1), capped at max_backoff_ms.
    pub fn backoff_for(&self, attempt: u32) -> DelayRange {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        self.backoff.scaled(self.growth.powi(exponent), self.max_backoff_ms)
    }

    /// A concrete sleep for the `attempt`-th blocked fetch
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_for(attempt).sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let policy = RetryPolicy::from_config(&AntiDetectionConfig::default());
        assert_eq!(policy.backoff_for(1), DelayRange::new(30_000, 60_000));
        assert_eq!(policy.backoff_for(2), DelayRange::new(45_000, 90_000));
        assert_eq!(policy.backoff_for(3), DelayRange::new(67_500, 135_000));
        assert_eq!(policy.backoff_for(10), DelayRange::new(180_000, 180_000));

        for attempt in 1..5 {
            let d = policy.delay_after(attempt).as_millis() as u64;
            let range = policy.backoff_for(attempt);
            assert!(d >= range.min_ms && d <= range.max_ms);
        }
    }

    #[test]
    fn test_attempt_ceiling() {
        let policy = RetryPolicy::from_config(&AntiDetectionConfig::default());
        assert_eq!(policy.max_attempts(), 3);
        assert!(policy.allows_another(1));
        assert!(policy.allows_another(2));
        assert!(!policy.allows_another(3));
    }

    #[test]
    fn test_degenerate_config_is_sanitized() {
        let config = AntiDetectionConfig {
            max_attempts: 0,
            backoff_growth: 0.2,
            ..AntiDetectionConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts(), 1);
        assert!(!policy.allows_another(1));
        assert_eq!(policy.backoff_for(3), policy.backoff_for(1));
    }
}
