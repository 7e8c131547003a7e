//! Rotation monitor control loop
//!
//! One `poll_once` per poll interval: heartbeat if due, fetch the reference
//! symbol, and run a detection cycle only when a new reference candle has
//! appeared. Each cycle ends in exactly one signal or one skip event.

use crate::counters::DailyCounters;
use crate::fetch_tracker::FetchTracker;
use crate::gate::volatility_gate;
use crate::rate_limiter::RateLimiter;
use crate::scoring::{compute_metrics, in_volume_dead_zone};
use crate::signals::{select_lags, select_leader, signal_key};
use crate::storage::JsonlLog;
use crate::logging::LogEmoji;
use crate::{log_network, log_signal, log_skip};
use chrono::{DateTime, Local};
use rotation_config::RotationConfig;
use rotation_strategy_shared::{
    AlertChannel, CandleSource, FetchError, MetricsCollector, MonitorMetrics,
};
use rotation_types::{
    Candle, EventRecord, HeartbeatEvent, LagReason, LeaderReason, MetricsSnapshot, SignalDecision,
    SignalReasons, SkipEvent, SkipReason, VolumeDeadZoneEvent,
};
use tracing::{debug, info, warn};

/// Result of one poll
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Reference candles could not be fetched
    NoReferenceData,
    /// Newest reference candle was already evaluated
    AlreadyEvaluated,
    Evaluated(CycleOutcome),
}

/// Result of one detection cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Signal(SignalDecision),
    Skipped(SkipReason),
}

#[derive(Debug, Clone)]
struct LastSuccess {
    ts: i64,
    candle_open_time: i64,
    symbol: String,
}

pub struct RotationMonitor<S, A> {
    config: RotationConfig,
    symbol_pairs: Vec<(String, String)>,
    source: S,
    alerts: A,
    tracker: FetchTracker,
    limiter: RateLimiter,
    counters: DailyCounters,
    signals_log: JsonlLog,
    events_log: JsonlLog,
    metrics: MetricsCollector,
    last_evaluated_open_time: Option<i64>,
    last_heartbeat_ts: Option<i64>,
    last_ref_return: Option<f64>,
    last_success: Option<LastSuccess>,
}

impl<S: CandleSource, A: AlertChannel> RotationMonitor<S, A> {
    pub fn new(config: RotationConfig, source: S, alerts: A, now: DateTime<Local>) -> Self {
        let storage = &config.storage;
        let limiter = RateLimiter::open(
            storage.rate_state_path(),
            config.limits.max_per_day,
            config.limits.cooldown_minutes,
            now,
        );
        let counters = DailyCounters::open(storage.counters_path(), now);
        let signals_log = JsonlLog::new(storage.signals_path());
        let events_log = JsonlLog::new(storage.events_path());
        let symbol_pairs = config.symbol_pairs();

        info!(
            "Rotation monitor watching {} symbols against {} ({})",
            symbol_pairs.len(),
            config.gate.reference_symbol,
            config.monitor.timeframe
        );

        Self {
            config,
            symbol_pairs,
            source,
            alerts,
            tracker: FetchTracker::new(),
            limiter,
            counters,
            signals_log,
            events_log,
            metrics: MetricsCollector::new(),
            last_evaluated_open_time: None,
            last_heartbeat_ts: None,
            last_ref_return: None,
            last_success: None,
        }
    }

    /// Poll forever at the configured interval
    pub async fn run(&mut self) {
        let interval = self.config.poll_interval();
        loop {
            let outcome = self.poll_once(Local::now()).await;
            debug!("Poll outcome: {:?}", outcome);
            tokio::time::sleep(interval).await;
        }
    }

    pub async fn poll_once(&mut self, now: DateTime<Local>) -> PollOutcome {
        self.metrics.increment_polls();
        self.maybe_heartbeat(now);

        let reference_symbol = self.config.gate.reference_symbol.clone();
        let reference_pair = self.config.gate.reference_pair.clone();
        let Some(candles) = self.fetch(&reference_pair, now).await else {
            return PollOutcome::NoReferenceData;
        };
        let Some(latest) = candles.last().map(|c| c.open_time) else {
            return PollOutcome::NoReferenceData;
        };

        self.last_success = Some(LastSuccess {
            ts: now.timestamp(),
            candle_open_time: latest,
            symbol: reference_symbol,
        });
        self.last_ref_return = volatility_gate(&candles, self.config.gate.abs_return_threshold).ret;

        if self.last_evaluated_open_time == Some(latest) {
            return PollOutcome::AlreadyEvaluated;
        }
        self.last_evaluated_open_time = Some(latest);

        PollOutcome::Evaluated(self.run_cycle(&candles, now).await)
    }

    /// Evaluate one detection cycle against the given reference candles
    pub async fn run_cycle(&mut self, reference: &[Candle], now: DateTime<Local>) -> CycleOutcome {
        self.metrics.increment_cycles();
        let ts = now.timestamp();

        let gate = volatility_gate(reference, self.config.gate.abs_return_threshold);
        if !gate.open {
            return self.skip(SkipEvent::new(ts, SkipReason::VolatilityGate, gate.ret), now);
        }

        let mut snapshot = MetricsSnapshot::new();
        let mut missing = Vec::new();
        let mut volume_skipped = Vec::new();

        for (symbol, pair) in self.symbol_pairs.clone() {
            let Some(candles) = self.fetch(&pair, now).await else {
                missing.push(symbol);
                continue;
            };

            let record = match compute_metrics(&candles) {
                Ok(record) => record,
                Err(e) => {
                    debug!("{} not scored: {}", symbol, e);
                    missing.push(symbol);
                    continue;
                }
            };

            if in_volume_dead_zone(&record, self.config.volume.drop_ratio) {
                debug!(
                    "{} in volume dead zone: {:.2} vs median {:?}",
                    symbol, record.vol_primary, record.vol_median
                );
                volume_skipped.push(symbol);
                continue;
            }

            snapshot.insert(symbol, record);
        }

        if !volume_skipped.is_empty() {
            let event = EventRecord::VolumeDeadZone(VolumeDeadZoneEvent {
                ts,
                symbols: volume_skipped.clone(),
            });
            self.record_event(&event, now);
        }

        let leader = match select_leader(&snapshot, &self.config.leader) {
            Ok(pick) => pick,
            Err(reason) => {
                let event = SkipEvent::new(ts, leader_skip(reason), gate.ret)
                    .with_scores(snapshot.scores())
                    .with_symbol_gaps(missing, volume_skipped);
                return self.skip(event, now);
            }
        };

        let lags = match select_lags(&snapshot, &leader.symbol, &self.config.lag) {
            Ok(lags) => lags,
            Err(reason) => {
                let event =
                    SkipEvent::new(ts, lag_skip(reason), gate.ret).with_leader(&leader.symbol);
                return self.skip(event, now);
            }
        };

        let key = signal_key(&leader.symbol, &lags);
        let rate = self.limiter.allow(&key, now);
        if !rate.allowed {
            let reason = rate
                .reason
                .skip_reason()
                .unwrap_or(SkipReason::RateLimitCooldownActive);
            let event = SkipEvent::new(ts, reason, gate.ret)
                .with_leader(&leader.symbol)
                .with_lags(lags);
            return self.skip(event, now);
        }

        let leader_score = snapshot.get(&leader.symbol).map(|m| m.score);
        let decision = SignalDecision {
            ts,
            leader: leader.symbol,
            lags,
            metrics: snapshot.to_map(),
            ref_return: gate.ret,
            reason: SignalReasons {
                leader: LeaderReason::LeaderSelected,
                lags: LagReason::LagsSelected,
                rate: rate.reason,
            },
        };

        self.signals_log.append(&decision);
        self.metrics.increment_signals();

        let text = alert_text(&decision, leader_score);
        log_signal!("{} (gap {:.4} over {})", text, leader.score_gap, leader.runner_up);
        if !self.alerts.send(&text).await {
            warn!("Alert for {} not delivered", decision.signal_key());
        }

        CycleOutcome::Signal(decision)
    }

    pub fn metrics(&self) -> MonitorMetrics {
        self.metrics.get_metrics()
    }

    pub fn counters(&self) -> &DailyCounters {
        &self.counters
    }

    pub fn tracker(&self) -> &FetchTracker {
        &self.tracker
    }

    /// Fetch candles through the failure tracker; `None` on any failure
    async fn fetch(&mut self, pair: &str, now: DateTime<Local>) -> Option<Vec<Candle>> {
        let ts = now.timestamp();
        let result = self
            .source
            .fetch_candles(pair, &self.config.monitor.timeframe, self.config.monitor.candle_limit)
            .await;

        let error = match result {
            Ok(candles) if !candles.is_empty() => {
                if let Some(event) = self.tracker.on_success(pair, pair, ts) {
                    info!(
                        "{} recovered after {}s ({} failures)",
                        pair, event.fail_duration_sec, event.fail_count
                    );
                    self.record_event(&EventRecord::FetchRecovered(event), now);
                }
                return Some(candles);
            }
            Ok(_) => FetchError::Malformed("no candles returned".to_string()),
            Err(error) => error,
        };

        if error.is_backoff() {
            debug!("{} skipped: {}", pair, error);
        } else {
            self.metrics.increment_fetch_failures();
            if self.tracker.is_failing(pair) {
                debug!("{} still failing: {}", pair, error);
            } else {
                log_network!("Fetch failed for {}: {}", pair, error);
            }
        }

        if let Some(event) = self.tracker.on_fail(pair, pair, &error, ts) {
            warn!(
                "{} failing for {}s ({} failures, {})",
                pair, event.fail_duration_sec, event.fail_count, event.last_reason
            );
            self.record_event(&EventRecord::FetchFail(event), now);
        }
        None
    }

    fn skip(&mut self, event: SkipEvent, now: DateTime<Local>) -> CycleOutcome {
        let reason = event.reason;
        if reason == SkipReason::VolatilityGate {
            info!(
                "{} Gate closed (ref_return {:?})",
                LogEmoji::GATE,
                event.ref_return
            );
        } else {
            log_skip!("Skip: {} (ref_return {:?})", reason, event.ref_return);
        }
        self.metrics.increment_skips();
        self.record_event(&EventRecord::Skip(event), now);
        CycleOutcome::Skipped(reason)
    }

    /// Append to the events log and bump the matching daily counter
    fn record_event(&mut self, event: &EventRecord, now: DateTime<Local>) {
        self.events_log.append(event);
        self.counters.record_event(event, now);
    }

    fn maybe_heartbeat(&mut self, now: DateTime<Local>) {
        let interval =
            i64::try_from(self.config.monitor.heartbeat_interval_secs).unwrap_or(i64::MAX);
        if interval == 0 {
            return;
        }

        let ts = now.timestamp();
        let due = self
            .last_heartbeat_ts
            .map_or(true, |last| ts - last >= interval);
        if !due {
            return;
        }
        self.last_heartbeat_ts = Some(ts);

        let metrics = self.metrics.get_metrics();
        let last_success = self.last_success.clone();
        let event = HeartbeatEvent {
            ts,
            status: "alive".to_string(),
            last_ref_return: self.last_ref_return,
            last_success_ts: last_success.as_ref().map(|s| s.ts),
            last_success_candle_open_time: last_success.as_ref().map(|s| s.candle_open_time),
            success_age_sec: last_success.as_ref().map(|s| ts - s.ts),
            last_success_symbol: last_success.map(|s| s.symbol),
            uptime_sec: self.metrics.uptime().as_secs(),
            cycles_evaluated: metrics.cycles_evaluated,
            signals_emitted: metrics.signals_emitted,
        };

        info!(
            "{} Heartbeat: {} cycles, {} signals, last ref return {:?}",
            LogEmoji::HEARTBEAT,
            event.cycles_evaluated,
            event.signals_emitted,
            event.last_ref_return
        );
        self.record_event(&EventRecord::Heartbeat(event), now);
    }
}

fn leader_skip(reason: LeaderReason) -> SkipReason {
    reason.skip_reason().unwrap_or(SkipReason::NotEnoughSymbols)
}

fn lag_skip(reason: LagReason) -> SkipReason {
    reason.skip_reason().unwrap_or(SkipReason::NoLagCandidates)
}

/// `[Rotation] leader=SOL lags=ARB,OP ref_ret=+0.20% score=0.0800`
pub fn alert_text(decision: &SignalDecision, leader_score: Option<f64>) -> String {
    let ref_ret = decision
        .ref_return
        .map_or_else(|| "n/a".to_string(), |r| format!("{:+.2}%", r * 100.0));
    let score = leader_score.map_or_else(|| "n/a".to_string(), |s| format!("{:.4}", s));

    format!(
        "[Rotation] leader={} lags={} ref_ret={} score={}",
        decision.leader,
        decision.lags.join(","),
        ref_ret,
        score
    )
}
