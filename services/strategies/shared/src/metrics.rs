//! Monitor runtime metrics collection

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Point-in-time copy of the collector's counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorMetrics {
    pub polls: u64,
    pub cycles_evaluated: u64,
    pub signals_emitted: u64,
    pub skips: u64,
    pub fetch_failures: u64,
}

/// Thread-safe metrics collector for the monitor loop
#[derive(Debug)]
pub struct MetricsCollector {
    start_time: Instant,
    polls: AtomicU64,
    cycles_evaluated: AtomicU64,
    signals_emitted: AtomicU64,
    skips: AtomicU64,
    fetch_failures: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            polls: AtomicU64::new(0),
            cycles_evaluated: AtomicU64::new(0),
            signals_emitted: AtomicU64::new(0),
            skips: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
        }
    }

    pub fn increment_polls(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cycles(&self) {
        self.cycles_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_signals(&self) {
        self.signals_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_skips(&self) {
        self.skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_fetch_failures(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> MonitorMetrics {
        MonitorMetrics {
            polls: self.polls.load(Ordering::Relaxed),
            cycles_evaluated: self.cycles_evaluated.load(Ordering::Relaxed),
            signals_emitted: self.signals_emitted.load(Ordering::Relaxed),
            skips: self.skips.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let collector = MetricsCollector::new();
        collector.increment_polls();
        collector.increment_polls();
        collector.increment_cycles();
        collector.increment_signals();
        collector.increment_fetch_failures();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.polls, 2);
        assert_eq!(metrics.cycles_evaluated, 1);
        assert_eq!(metrics.signals_emitted, 1);
        assert_eq!(metrics.skips, 0);
        assert_eq!(metrics.fetch_failures, 1);
    }
}
