//! Persisted signal decisions and the events-log record family
//!
//! Every record carries `ts` in epoch seconds. Events are internally tagged by
//! `type` so the log can be replayed into typed values.

use crate::metrics::MetricRecord;
use crate::reasons::{LagReason, LeaderReason, RateReason, SkipReason};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reasons attached to an emitted signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalReasons {
    pub leader: LeaderReason,
    pub lags: LagReason,
    pub rate: RateReason,
}

/// A leader/laggard rotation that cleared every gate and the rate limiter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDecision {
    pub ts: i64,
    pub leader: String,
    /// Sorted lexicographically
    pub lags: Vec<String>,
    pub metrics: BTreeMap<String, MetricRecord>,
    /// Reference symbol's return that opened the volatility gate
    pub ref_return: Option<f64>,
    pub reason: SignalReasons,
}

impl SignalDecision {
    /// Cooldown key: `leader|lag1,lag2` with laggards sorted
    pub fn signal_key(&self) -> String {
        let mut lags: Vec<&str> = self.lags.iter().map(String::as_str).collect();
        lags.sort_unstable();
        format!("{}|{}", self.leader, lags.join(","))
    }
}

/// A cycle that ended without a signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipEvent {
    pub ts: i64,
    pub reason: SkipReason,
    pub ref_return: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_symbols: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_skipped: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lags: Vec<String>,
}

impl SkipEvent {
    pub fn new(ts: i64, reason: SkipReason, ref_return: Option<f64>) -> Self {
        Self {
            ts,
            reason,
            ref_return,
            scores: None,
            missing_symbols: Vec::new(),
            volume_skipped: Vec::new(),
            leader: None,
            lags: Vec::new(),
        }
    }

    pub fn with_scores(mut self, scores: BTreeMap<String, f64>) -> Self {
        self.scores = Some(scores);
        self
    }

    pub fn with_symbol_gaps(mut self, missing: Vec<String>, volume_skipped: Vec<String>) -> Self {
        self.missing_symbols = missing;
        self.volume_skipped = volume_skipped;
        self
    }

    pub fn with_leader(mut self, leader: impl Into<String>) -> Self {
        self.leader = Some(leader.into());
        self
    }

    pub fn with_lags(mut self, lags: Vec<String>) -> Self {
        self.lags = lags;
        self
    }
}

/// Liveness record emitted on a fixed interval regardless of detection outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatEvent {
    pub ts: i64,
    pub status: String,
    pub last_ref_return: Option<f64>,
    pub last_success_ts: Option<i64>,
    pub last_success_candle_open_time: Option<i64>,
    pub last_success_symbol: Option<String>,
    pub success_age_sec: Option<i64>,
    #[serde(default)]
    pub uptime_sec: u64,
    #[serde(default)]
    pub cycles_evaluated: u64,
    #[serde(default)]
    pub signals_emitted: u64,
}

/// Fetch failure-mode transition for one fetch key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchEvent {
    pub ts: i64,
    pub key: String,
    pub symbol_pair: Option<String>,
    pub fail_count: u32,
    pub fail_duration_sec: i64,
    pub last_error: String,
    pub last_reason: String,
}

/// Symbols dropped by the volume dead-zone filter during one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeDeadZoneEvent {
    pub ts: i64,
    pub symbols: Vec<String>,
}

/// One line of the append-only events log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventRecord {
    Skip(SkipEvent),
    Heartbeat(HeartbeatEvent),
    FetchFail(FetchEvent),
    FetchRecovered(FetchEvent),
    VolumeDeadZone(VolumeDeadZoneEvent),
}

impl EventRecord {
    pub fn ts(&self) -> i64 {
        match self {
            EventRecord::Skip(e) => e.ts,
            EventRecord::Heartbeat(e) => e.ts,
            EventRecord::FetchFail(e) | EventRecord::FetchRecovered(e) => e.ts,
            EventRecord::VolumeDeadZone(e) => e.ts,
        }
    }
}
