//! Reconnect delay computation.

use std::time::Duration;

use crate::config::ReconnectConfig;

impl ReconnectConfig {
    /// Delay before reconnect attempt `attempt` (zero-based), with random jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.delay_with_sample(attempt, fastrand::f64())
    }

    /// Delay before reconnect attempt `attempt` for a jitter sample in `[0, 1)`.
    ///
    /// Jitter never exceeds the base delay, so `delay_with_sample(n + 1, _)` is never
    /// shorter than `delay_with_sample(n, _)` for any pair of samples.
    pub fn delay_with_sample(&self, attempt: u32, sample: f64) -> Duration {
        let base = self.initial_delay.max(Duration::from_millis(1));
        let cap = self.max_delay.max(base);
        let Some(factor) = 1u32.checked_shl(attempt) else {
            return cap;
        };
        let exponential = base.saturating_mul(factor);
        if exponential >= cap {
            return cap;
        }

        let jitter_cap = self.jitter.min(base);
        let jitter = jitter_cap.mul_f64(sample.clamp(0.0, 1.0));

        exponential.saturating_add(jitter).min(cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn policy() -> ReconnectConfig {
        ReconnectConfig::new()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(2))
            .with_jitter(Duration::ZERO)
    }

    #[test]
    fn test_exponential_growth_until_cap() {
        let policy = policy();
        let delays: Vec<_> = (0..7).map(|n| policy.delay_with_sample(n, 0.0)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
                Duration::from_millis(1600),
                Duration::from_secs(2),
                Duration::from_secs(2),
            ]
        );
    }

    #[test]
    fn test_jitter_bounded_by_base() {
        let policy = policy().with_jitter(Duration::from_secs(10));
        let delay = policy.delay_with_sample(0, 0.5);
        assert_eq!(delay, Duration::from_millis(150));
    }

    #[test]
    fn test_huge_attempt_saturates_to_cap() {
        assert_eq!(policy().delay_for(u32::MAX), Duration::from_secs(2));
    }

    #[test]
    fn test_zero_base_still_waits() {
        let policy = ReconnectConfig::new()
            .with_initial_delay(Duration::ZERO)
            .with_jitter(Duration::ZERO);
        assert!(policy.delay_for(0) > Duration::ZERO);
    }
}
