//! # Rotation Strategy - L2 Sector Rotation Detection
//!
//! ## Purpose
//!
//! Polls OHLCV candles for a watchlist of layer-2 tokens and flags short-term
//! rotations: one token (the leader) clearly outperforms its peers while the
//! broad market is calm, and one or more peers (the laggards) have not yet
//! caught up but show volume interest.
//!
//! ## Pipeline
//!
//! ```text
//! reference candles → [Volatility Gate] → per-symbol fetch → [Scoring]
//!        ↓                   ↓                                   ↓
//!   candle dedup        gate skip                     [Volume Dead Zone]
//!                                                                ↓
//!        [Rate Limiter] ← [Laggard Selection] ← [Leader Selection]
//!              ↓
//!   signals.jsonl + alert     (every rejection → skip event in events.jsonl)
//! ```
//!
//! ## State
//!
//! Everything lives under the configured storage directory: the rate limiter
//! and daily counters are JSON objects rewritten atomically, signals and events
//! are append-only JSONL logs. All daily state rolls over on the local
//! calendar date.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rotation_adapters::{BinanceCandleSource, TelegramNotifier};
//! use rotation_config::RotationConfig;
//! use rotation_strategy::RotationMonitor;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = RotationConfig::load(Some("configs/rotation.toml".as_ref()))?;
//! let source = BinanceCandleSource::new(&config.exchange)?;
//! let alerts = TelegramNotifier::new(&config.alerts)?;
//!
//! let mut monitor = RotationMonitor::new(config, source, alerts, chrono::Local::now());
//! monitor.run().await;
//! # Ok(())
//! # }
//! ```

pub mod counters;
pub mod error;
pub mod fetch_tracker;
pub mod gate;
pub mod indicators;
pub mod logging;
pub mod monitor;
pub mod rate_limiter;
pub mod scoring;
pub mod signals;
pub mod storage;

pub use counters::{CounterKind, CounterState, DailyCounters};
pub use error::{MonitorError, Result, ScoringError};
pub use fetch_tracker::FetchTracker;
pub use gate::{volatility_gate, GateCheck};
pub use monitor::{CycleOutcome, PollOutcome, RotationMonitor};
pub use rate_limiter::{RateDecision, RateLimiter, RateLimiterState};
pub use scoring::{compute_metrics, in_volume_dead_zone};
pub use signals::{select_lags, select_leader, signal_key, LeaderPick};
pub use storage::{atomic_write_json, read_json, JsonlLog};

/// Re-export core record types
pub use rotation_types::{Candle, EventRecord, MetricRecord, MetricsSnapshot, SignalDecision};
