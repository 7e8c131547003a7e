//! Persistent alert rate limiter: daily cap plus per-signal-key cooldown

use crate::storage::{atomic_write_json, read_json};
use chrono::{DateTime, Local};
use rotation_types::RateReason;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// On-disk limiter state; resets wholesale when the local date changes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterState {
    pub date: String,
    pub count: u32,
    /// Signal key → epoch seconds of its last allowed alert
    #[serde(default)]
    pub cooldowns: BTreeMap<String, i64>,
}

impl RateLimiterState {
    pub fn fresh(date: String) -> Self {
        Self {
            date,
            count: 0,
            cooldowns: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub reason: RateReason,
}

impl RateDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: RateReason::RateLimitOk,
        }
    }

    fn deny(reason: RateReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    path: PathBuf,
    max_per_day: u32,
    cooldown_secs: i64,
    state: RateLimiterState,
}

impl RateLimiter {
    /// Load state from `path` once; missing or corrupt files start fresh
    pub fn open(
        path: impl Into<PathBuf>,
        max_per_day: u32,
        cooldown_minutes: u32,
        now: DateTime<Local>,
    ) -> Self {
        let path = path.into();
        let today = local_date(now);

        let state = match read_json::<RateLimiterState>(&path) {
            Ok(Some(state)) => state,
            Ok(None) => RateLimiterState::fresh(today),
            Err(e) => {
                warn!(
                    "Rate limiter state at {} unreadable, starting fresh: {}",
                    path.display(),
                    e
                );
                RateLimiterState::fresh(today)
            }
        };

        Self {
            path,
            max_per_day,
            cooldown_secs: i64::from(cooldown_minutes) * 60,
            state,
        }
    }

    /// Decide whether an alert for `key` may go out now, recording it if so
    pub fn allow(&mut self, key: &str, now: DateTime<Local>) -> RateDecision {
        let today = local_date(now);
        if self.state.date != today {
            self.state = RateLimiterState::fresh(today);
        }

        if self.state.count >= self.max_per_day {
            return RateDecision::deny(RateReason::DailyCapReached);
        }

        let ts = now.timestamp();
        if let Some(&last) = self.state.cooldowns.get(key) {
            if ts - last < self.cooldown_secs {
                return RateDecision::deny(RateReason::CooldownActive);
            }
        }

        self.state.cooldowns.insert(key.to_string(), ts);
        self.state.count += 1;

        if let Err(e) = atomic_write_json(&self.path, &self.state) {
            error!(
                "Failed to persist rate limiter state to {}: {}",
                self.path.display(),
                e
            );
        }

        RateDecision::allow()
    }

    pub fn state(&self) -> &RateLimiterState {
        &self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Local calendar date as `YYYY-MM-DD`
pub fn local_date(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::fs;
    use tempfile::tempdir;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .earliest()
            .unwrap()
    }

    #[test]
    fn test_cooldown_blocks_same_key() {
        let dir = tempdir().unwrap();
        let now = at(2024, 3, 10, 12, 0);
        let mut limiter = RateLimiter::open(dir.path().join("rate.json"), 6, 120, now);

        let first = limiter.allow("SOL|ARB", now);
        assert!(first.allowed);
        assert_eq!(first.reason, RateReason::RateLimitOk);

        let second = limiter.allow("SOL|ARB", now + Duration::minutes(30));
        assert!(!second.allowed);
        assert_eq!(second.reason, RateReason::CooldownActive);

        // Different key is unaffected
        assert!(limiter.allow("OP|ARB", now + Duration::minutes(31)).allowed);

        // Cooldown expires
        assert!(limiter.allow("SOL|ARB", now + Duration::minutes(121)).allowed);
    }

    #[test]
    fn test_daily_cap() {
        let dir = tempdir().unwrap();
        let now = at(2024, 3, 10, 9, 0);
        let mut limiter = RateLimiter::open(dir.path().join("rate.json"), 2, 0, now);

        assert!(limiter.allow("a", now).allowed);
        assert!(limiter.allow("b", now).allowed);
        assert_eq!(
            limiter.allow("c", now).reason,
            RateReason::DailyCapReached
        );
    }

    #[test]
    fn test_rollover_resets_count_and_cooldowns() {
        let dir = tempdir().unwrap();
        let day_one = at(2024, 3, 10, 23, 0);
        let mut limiter = RateLimiter::open(dir.path().join("rate.json"), 1, 600, day_one);

        assert!(limiter.allow("SOL|ARB", day_one).allowed);
        assert!(!limiter.allow("OP|ARB", day_one).allowed);
        assert!(!limiter.state().cooldowns.is_empty());

        let day_two = at(2024, 3, 11, 0, 30);
        let decision = limiter.allow("SOL|ARB", day_two);
        assert!(decision.allowed);
        assert_eq!(limiter.state().date, "2024-03-11");
        assert_eq!(limiter.state().count, 1);
    }

    #[test]
    fn test_state_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rate.json");
        let now = at(2024, 3, 10, 12, 0);

        let mut limiter = RateLimiter::open(&path, 6, 120, now);
        limiter.allow("SOL|ARB", now);

        let mut reopened = RateLimiter::open(&path, 6, 120, now);
        assert_eq!(reopened.state().count, 1);
        assert_eq!(
            reopened.allow("SOL|ARB", now + Duration::minutes(5)).reason,
            RateReason::CooldownActive
        );
    }

    #[test]
    fn test_corrupt_state_starts_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rate.json");
        fs::write(&path, "not json").unwrap();

        let now = at(2024, 3, 10, 12, 0);
        let limiter = RateLimiter::open(&path, 6, 120, now);
        assert_eq!(limiter.state(), &RateLimiterState::fresh("2024-03-10".into()));
    }
}
