//! Fetch failure hysteresis
//!
//! Turns a stream of per-key fetch outcomes into sparse `fetch_fail` and
//! `fetch_recovered` events. Short failure bursts stay quiet; a key failing
//! for longer than `fail_emit_after` goes loud, repeats at most every
//! `event_min_interval` (or immediately when the failure reason changes), and
//! announces recovery exactly once.

use rotation_strategy_shared::FetchError;
use rotation_types::FetchEvent;
use std::collections::HashMap;

pub const FAIL_EMIT_AFTER_SECS: i64 = 600;
pub const EVENT_MIN_INTERVAL_SECS: i64 = 600;

const MAX_ERROR_CHARS: usize = 200;
const MAX_REASON_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq)]
struct FetchFailState {
    first_fail_ts: i64,
    last_fail_ts: i64,
    fail_count: u32,
    last_error: String,
    last_reason: String,
    last_event_ts: Option<i64>,
    in_fail_mode: bool,
}

/// Per-key failure state machine. Timestamps are epoch seconds.
#[derive(Debug)]
pub struct FetchTracker {
    fail_emit_after: i64,
    event_min_interval: i64,
    states: HashMap<String, FetchFailState>,
}

impl FetchTracker {
    pub fn new() -> Self {
        Self::with_thresholds(FAIL_EMIT_AFTER_SECS, EVENT_MIN_INTERVAL_SECS)
    }

    pub fn with_thresholds(fail_emit_after: i64, event_min_interval: i64) -> Self {
        Self {
            fail_emit_after,
            event_min_interval,
            states: HashMap::new(),
        }
    }

    /// Record a failed fetch; returns a `fetch_fail` event when one is due.
    ///
    /// Backoff refusals are ignored.
    pub fn on_fail(
        &mut self,
        key: &str,
        symbol_pair: &str,
        error: &FetchError,
        now: i64,
    ) -> Option<FetchEvent> {
        if error.is_backoff() {
            return None;
        }

        let detail = truncate_chars(&error.to_string(), MAX_ERROR_CHARS);
        let reason = truncate_chars(error.reason(), MAX_REASON_CHARS);

        let state = self
            .states
            .entry(key.to_string())
            .or_insert_with(|| FetchFailState {
                first_fail_ts: now,
                last_fail_ts: now,
                fail_count: 0,
                last_error: String::new(),
                last_reason: String::new(),
                last_event_ts: None,
                in_fail_mode: false,
            });

        let reason_changed = state.fail_count > 0 && state.last_reason != reason;

        state.fail_count = state.fail_count.saturating_add(1);
        state.last_fail_ts = now;
        state.last_error = detail;
        state.last_reason = reason;

        if now - state.first_fail_ts < self.fail_emit_after {
            return None;
        }

        let interval_elapsed = state
            .last_event_ts
            .map_or(true, |ts| now - ts >= self.event_min_interval);

        if state.in_fail_mode && !reason_changed && !interval_elapsed {
            return None;
        }

        state.in_fail_mode = true;
        state.last_event_ts = Some(now);

        Some(FetchEvent {
            ts: now,
            key: key.to_string(),
            symbol_pair: Some(symbol_pair.to_string()),
            fail_count: state.fail_count,
            fail_duration_sec: now - state.first_fail_ts,
            last_error: state.last_error.clone(),
            last_reason: state.last_reason.clone(),
        })
    }

    /// Record a successful fetch; returns `fetch_recovered` if the key was loud
    pub fn on_success(&mut self, key: &str, symbol_pair: &str, now: i64) -> Option<FetchEvent> {
        let state = self.states.remove(key)?;
        if !state.in_fail_mode {
            return None;
        }

        Some(FetchEvent {
            ts: now,
            key: key.to_string(),
            symbol_pair: Some(symbol_pair.to_string()),
            fail_count: state.fail_count,
            fail_duration_sec: now - state.first_fail_ts,
            last_error: state.last_error,
            last_reason: state.last_reason,
        })
    }

    pub fn is_failing(&self, key: &str) -> bool {
        self.states.contains_key(key)
    }

    pub fn is_loud(&self, key: &str) -> bool {
        self.states.get(key).is_some_and(|s| s.in_fail_mode)
    }
}

impl Default for FetchTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
