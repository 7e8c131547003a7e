//! Exponential backoff for the candle source

use std::time::{Duration, Instant};

/// Refuses requests for a growing delay after penalised failures.
///
/// The delay starts at `base`, doubles on each consecutive failure up to
/// `max`, and returns to `base` after a success.
#[derive(Debug, Clone)]
pub struct FetchBackoff {
    base: Duration,
    max: Duration,
    current: Duration,
    next_allowed: Option<Instant>,
    consecutive_failures: u32,
}

impl FetchBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let max = max.max(base);
        Self {
            base,
            max,
            current: base,
            next_allowed: None,
            consecutive_failures: 0,
        }
    }

    /// `Err(remaining)` while a backoff window is open
    pub fn check(&self, now: Instant) -> Result<(), Duration> {
        match self.next_allowed {
            Some(next) if now < next => Err(next - now),
            _ => Ok(()),
        }
    }

    /// Open a backoff window and return its length
    pub fn record_failure(&mut self, now: Instant) -> Duration {
        let delay = self.current;
        self.next_allowed = Some(now + delay);
        self.current = (self.current * 2).clamp(self.base, self.max);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        delay
    }

    pub fn record_success(&mut self) {
        self.current = self.base;
        self.next_allowed = None;
        self.consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_and_clamps() {
        let mut backoff = FetchBackoff::new(Duration::from_secs(5), Duration::from_secs(300));
        let now = Instant::now();

        let delays: Vec<u64> = (0..8)
            .map(|_| backoff.record_failure(now).as_secs())
            .collect();
        assert_eq!(delays, vec![5, 10, 20, 40, 80, 160, 300, 300]);
        assert_eq!(backoff.consecutive_failures(), 8);
    }

    #[test]
    fn test_refuses_inside_window() {
        let mut backoff = FetchBackoff::new(Duration::from_secs(5), Duration::from_secs(300));
        let now = Instant::now();

        assert!(backoff.check(now).is_ok());
        backoff.record_failure(now);

        let remaining = backoff.check(now + Duration::from_secs(2)).unwrap_err();
        assert_eq!(remaining, Duration::from_secs(3));
        assert!(backoff.check(now + Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_success_resets() {
        let mut backoff = FetchBackoff::new(Duration::from_secs(5), Duration::from_secs(300));
        let now = Instant::now();

        backoff.record_failure(now);
        backoff.record_failure(now);
        backoff.record_success();

        assert!(backoff.check(now).is_ok());
        assert_eq!(backoff.consecutive_failures(), 0);
        assert_eq!(backoff.record_failure(now), Duration::from_secs(5));
    }
}
