//! Bounded retry with exponential backoff
//!
//! A call makes at most `1 + max_retries` attempts. The delay before the
//! first retry is `initial_delay`; each later delay is the previous one
//! times `multiplier`.

use std::time::Duration;

use zonesync_core::ClientConfig;

/// Retry settings of one client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Growth factor of the delay
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Create a retry policy
    pub fn new(max_retries: u32, initial_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_retries,
            initial_delay,
            multiplier: multiplier.max(1),
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, 1)
    }

    /// Upper bound on attempts per call, first one included
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delays to sleep between attempts, in order
    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.initial_delay,
            multiplier: self.multiplier,
            remaining: self.max_retries,
        }
    }
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self::new(
            config.max_retries,
            config.retry_delay(),
            config.backoff_multiplier,
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

/// Iterator over the delays of one retry sequence
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    multiplier: u32,
    remaining: u32,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let delay = self.next;
        self.next = delay.saturating_mul(self.multiplier);
        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 4);

        let delays: Vec<u64> = policy.backoff().map(|d| d.as_secs()).collect();
        assert_eq!(delays, vec![15, 30, 60]);
    }

    #[test]
    fn multiplier_of_one_is_constant() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10), 1);
        assert!(policy.backoff().all(|d| d == Duration::from_millis(10)));
    }

    #[test]
    fn zero_multiplier_is_clamped() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1), 0);
        assert_eq!(policy.multiplier, 1);
    }

    #[test]
    fn no_retries() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.backoff().count(), 0);
    }

    #[test]
    fn large_delays_saturate() {
        let policy = RetryPolicy::new(10, Duration::MAX / 2, 4);
        assert_eq!(policy.backoff().last(), Some(Duration::MAX));
    }
}
