//! Client-side request pacing for exchange REST calls

use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;

/// Paces outbound requests to a per-minute quota.
///
/// A zero quota disables pacing.
pub struct RequestPacer {
    limiter: Option<DefaultDirectRateLimiter>,
    requests_per_minute: u32,
}

impl RequestPacer {
    pub fn new(requests_per_minute: u32) -> Self {
        let limiter = match NonZeroU32::new(requests_per_minute) {
            Some(rate) => Some(DefaultDirectRateLimiter::direct(Quota::per_minute(rate))),
            None => {
                tracing::warn!("Request pacing disabled (requests_per_minute = 0)");
                None
            }
        };

        Self {
            limiter,
            requests_per_minute,
        }
    }

    /// Check if a request is allowed right now (non-blocking)
    pub fn check(&self) -> bool {
        self.limiter
            .as_ref()
            .map(|limiter| limiter.check().is_ok())
            .unwrap_or(true)
    }

    /// Wait until a request is allowed
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exhaustion() {
        let pacer = RequestPacer::new(2);
        assert!(pacer.check());
        assert!(pacer.check());
        assert!(!pacer.check());
    }

    #[test]
    fn test_zero_quota_disables_pacing() {
        let pacer = RequestPacer::new(0);
        for _ in 0..100 {
            assert!(pacer.check());
        }
    }

    #[tokio::test]
    async fn test_wait_returns_with_capacity() {
        let pacer = RequestPacer::new(60);
        pacer.wait().await;
        assert_eq!(pacer.requests_per_minute(), 60);
    }
}
