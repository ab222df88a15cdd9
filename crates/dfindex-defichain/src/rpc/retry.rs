//! Backoff schedule for node calls that failed in transport.

use std::time::Duration;

/// Doubling backoff: `base`, `2 * base`, `4 * base` ... capped at `ceiling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Retries allowed after the first attempt; `0` disables retrying.
    pub retries: u32,
    pub base: Duration,
    pub ceiling: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            retries: 3,
            base: Duration::from_millis(200),
            ceiling: Duration::from_secs(5),
        }
    }
}

impl Backoff {
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// How long to wait after failed attempt number `failed` (1-based), or
    /// `None` once the retry budget is spent.
    pub fn delay_after(&self, failed: u32) -> Option<Duration> {
        if failed == 0 || failed > self.retries {
            return None;
        }
        let factor = 1u32.checked_shl(failed - 1).unwrap_or(u32::MAX);
        Some(self.base.saturating_mul(factor).min(self.ceiling))
    }

    /// Total time a call may spend sleeping before it gives up.
    pub fn worst_case(&self) -> Duration {
        (1..=self.retries)
            .filter_map(|n| self.delay_after(n))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_then_gives_up() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay_after(1), Some(Duration::from_millis(200)));
        assert_eq!(backoff.delay_after(2), Some(Duration::from_millis(400)));
        assert_eq!(backoff.delay_after(3), Some(Duration::from_millis(800)));
        assert_eq!(backoff.delay_after(4), None);
        assert_eq!(backoff.worst_case(), Duration::from_millis(1400));
    }

    #[test]
    fn ceiling_holds_for_long_budgets() {
        let backoff = Backoff::default().with_retries(40);
        assert_eq!(backoff.delay_after(10), Some(Duration::from_secs(5)));
        assert_eq!(backoff.delay_after(40), Some(Duration::from_secs(5)));
    }

    #[test]
    fn zero_retries_never_sleeps() {
        let backoff = Backoff::default().with_retries(0);
        assert_eq!(backoff.delay_after(1), None);
        assert_eq!(backoff.worst_case(), Duration::ZERO);
    }
}
