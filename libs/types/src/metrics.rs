//! Per-symbol metric records and the per-cycle snapshot

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Momentum/volume metrics derived from one symbol's candles for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Return over the short window; absent when history is too short
    pub ret_recent: Option<f64>,
    /// Return over the primary window
    pub ret_primary: f64,
    /// Summed volume over the primary window
    pub vol_primary: f64,
    /// Summed volume over the window preceding the primary one
    pub vol_prior: f64,
    /// Relative volume change, primary vs prior
    pub vol_chg: f64,
    /// Median of rolling primary-window volume sums; absent without enough data
    pub vol_median: Option<f64>,
    /// Composite ranking score
    pub score: f64,
    pub last_close: f64,
}

/// Metrics for every symbol that survived one cycle, in watchlist order.
///
/// Insertion order matters: the signal engine breaks score ties by it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    entries: Vec<(String, MetricRecord)>,
}

impl MetricsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a symbol's metrics. A symbol already present is replaced in place.
    pub fn insert(&mut self, symbol: impl Into<String>, record: MetricRecord) {
        let symbol = symbol.into();
        match self.entries.iter_mut().find(|(s, _)| *s == symbol) {
            Some(entry) => entry.1 = record,
            None => self.entries.push((symbol, record)),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&MetricRecord> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricRecord)> {
        self.entries.iter().map(|(s, r)| (s.as_str(), r))
    }

    /// Score per symbol, for skip-event context
    pub fn scores(&self) -> BTreeMap<String, f64> {
        self.iter().map(|(s, r)| (s.to_string(), r.score)).collect()
    }

    /// Full metrics keyed by symbol, for persisted signals
    pub fn to_map(&self) -> BTreeMap<String, MetricRecord> {
        self.iter().map(|(s, r)| (s.to_string(), *r)).collect()
    }
}

impl FromIterator<(String, MetricRecord)> for MetricsSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, MetricRecord)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (symbol, record) in iter {
            snapshot.insert(symbol, record);
        }
        snapshot
    }
}
