//! Daily outcome counters
//!
//! Counts why cycles ended without a signal, per local calendar day. The live
//! counters and [`DailyCounters::replay`] share [`CounterKind::for_event`], so a
//! day's totals can always be rebuilt from the events log.

use crate::rate_limiter::local_date;
use crate::storage::{atomic_write_json, read_json};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use rotation_types::{EventRecord, SkipReason};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CounterKind {
    GateHits,
    VolumeDeadZoneHits,
    NotEnoughSymbols,
    LeaderFail,
    LagFail,
    RateLimitBlocked,
}

impl CounterKind {
    pub const ALL: [CounterKind; 6] = [
        CounterKind::GateHits,
        CounterKind::VolumeDeadZoneHits,
        CounterKind::NotEnoughSymbols,
        CounterKind::LeaderFail,
        CounterKind::LagFail,
        CounterKind::RateLimitBlocked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CounterKind::GateHits => "gate_hits",
            CounterKind::VolumeDeadZoneHits => "volume_dead_zone_hits",
            CounterKind::NotEnoughSymbols => "not_enough_symbols",
            CounterKind::LeaderFail => "leader_fail",
            CounterKind::LagFail => "lag_fail",
            CounterKind::RateLimitBlocked => "rate_limit_blocked",
        }
    }

    pub fn for_skip(reason: SkipReason) -> CounterKind {
        match reason {
            SkipReason::VolatilityGate => CounterKind::GateHits,
            SkipReason::NotEnoughSymbols => CounterKind::NotEnoughSymbols,
            SkipReason::LeaderGapNotMet | SkipReason::LeaderMinReturnNotMet => {
                CounterKind::LeaderFail
            }
            SkipReason::LeaderMissing | SkipReason::NoLagCandidates => CounterKind::LagFail,
            SkipReason::RateLimitDailyCapReached | SkipReason::RateLimitCooldownActive => {
                CounterKind::RateLimitBlocked
            }
        }
    }

    /// Counter an event contributes to, if any
    pub fn for_event(event: &EventRecord) -> Option<CounterKind> {
        match event {
            EventRecord::Skip(skip) => Some(Self::for_skip(skip.reason)),
            EventRecord::VolumeDeadZone(_) => Some(CounterKind::VolumeDeadZoneHits),
            EventRecord::Heartbeat(_)
            | EventRecord::FetchFail(_)
            | EventRecord::FetchRecovered(_) => None,
        }
    }
}

/// `{"date": "YYYY-MM-DD", "gate_hits": 3, ...}` on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    pub date: String,
    #[serde(flatten)]
    pub counts: BTreeMap<String, u64>,
}

impl CounterState {
    /// All counters present at zero
    pub fn fresh(date: String) -> Self {
        Self {
            date,
            counts: CounterKind::ALL
                .iter()
                .map(|kind| (kind.as_str().to_string(), 0))
                .collect(),
        }
    }

    pub fn get(&self, kind: CounterKind) -> u64 {
        self.counts.get(kind.as_str()).copied().unwrap_or(0)
    }

    fn bump(&mut self, kind: CounterKind) {
        *self.counts.entry(kind.as_str().to_string()).or_insert(0) += 1;
    }
}

#[derive(Debug)]
pub struct DailyCounters {
    path: PathBuf,
    state: CounterState,
}

impl DailyCounters {
    pub fn open(path: impl Into<PathBuf>, now: DateTime<Local>) -> Self {
        let path = path.into();
        let today = local_date(now);

        let state = match read_json::<CounterState>(&path) {
            Ok(Some(state)) if state.date == today => state,
            Ok(_) => CounterState::fresh(today),
            Err(e) => {
                warn!(
                    "Counter state at {} unreadable, starting fresh: {}",
                    path.display(),
                    e
                );
                CounterState::fresh(today)
            }
        };

        Self { path, state }
    }

    pub fn increment(&mut self, kind: CounterKind, now: DateTime<Local>) {
        let today = local_date(now);
        if self.state.date != today {
            self.state = CounterState::fresh(today);
        }

        self.state.bump(kind);

        if let Err(e) = atomic_write_json(&self.path, &self.state) {
            error!(
                "Failed to persist counters to {}: {}",
                self.path.display(),
                e
            );
        }
    }

    /// Count `event` if it maps to a counter
    pub fn record_event(&mut self, event: &EventRecord, now: DateTime<Local>) {
        if let Some(kind) = CounterKind::for_event(event) {
            self.increment(kind, now);
        }
    }

    pub fn state(&self) -> &CounterState {
        &self.state
    }

    /// Rebuild one local day's counters from an events log
    pub fn replay<'a, I>(events: I, date: NaiveDate) -> CounterState
    where
        I: IntoIterator<Item = &'a EventRecord>,
    {
        let date_str = date.format("%Y-%m-%d").to_string();
        let mut state = CounterState::fresh(date_str.clone());

        for event in events {
            let Some(kind) = CounterKind::for_event(event) else {
                continue;
            };
            let same_day = Local
                .timestamp_opt(event.ts(), 0)
                .earliest()
                .is_some_and(|ts| local_date(ts) == date_str);
            if same_day {
                state.bump(kind);
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonlLog;
    use chrono::Duration;
    use rotation_types::{HeartbeatEvent, SkipEvent, VolumeDeadZoneEvent};
    use tempfile::tempdir;

    fn at(h: u32, min: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 5, 1, h, min, 0)
            .earliest()
            .unwrap()
    }

    fn skip(now: DateTime<Local>, reason: SkipReason) -> EventRecord {
        EventRecord::Skip(SkipEvent::new(now.timestamp(), reason, None))
    }

    #[test]
    fn test_event_mapping() {
        let now = at(10, 0);
        assert_eq!(
            CounterKind::for_event(&skip(now, SkipReason::LeaderMinReturnNotMet)),
            Some(CounterKind::LeaderFail)
        );
        assert_eq!(
            CounterKind::for_event(&skip(now, SkipReason::LeaderMissing)),
            Some(CounterKind::LagFail)
        );
        assert_eq!(
            CounterKind::for_event(&skip(now, SkipReason::RateLimitCooldownActive)),
            Some(CounterKind::RateLimitBlocked)
        );
        let dead_zone = EventRecord::VolumeDeadZone(VolumeDeadZoneEvent {
            ts: now.timestamp(),
            symbols: vec!["ARB".into()],
        });
        assert_eq!(
            CounterKind::for_event(&dead_zone),
            Some(CounterKind::VolumeDeadZoneHits)
        );
    }

    #[test]
    fn test_flattened_wire_shape() {
        let mut state = CounterState::fresh("2024-05-01".into());
        state.bump(CounterKind::GateHits);

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["date"], "2024-05-01");
        assert_eq!(value["gate_hits"], 1);
        assert_eq!(value["lag_fail"], 0);
    }

    #[test]
    fn test_increment_persists_and_rolls_over() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gate_stats.json");
        let now = at(10, 0);

        let mut counters = DailyCounters::open(&path, now);
        counters.increment(CounterKind::GateHits, now);
        counters.increment(CounterKind::GateHits, now);

        let reopened = DailyCounters::open(&path, now);
        assert_eq!(reopened.state().get(CounterKind::GateHits), 2);

        counters.increment(CounterKind::LagFail, now + Duration::days(1));
        assert_eq!(counters.state().get(CounterKind::GateHits), 0);
        assert_eq!(counters.state().get(CounterKind::LagFail), 1);
    }

    #[test]
    fn test_replay_matches_live_counts_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let log = JsonlLog::new(dir.path().join("events.jsonl"));
        let mut counters = DailyCounters::open(dir.path().join("gate_stats.json"), at(0, 0));

        let events = vec![
            skip(at(9, 0), SkipReason::VolatilityGate),
            skip(at(9, 15), SkipReason::NoLagCandidates),
            EventRecord::VolumeDeadZone(VolumeDeadZoneEvent {
                ts: at(9, 30).timestamp(),
                symbols: vec!["OP".into()],
            }),
            skip(at(9, 30), SkipReason::LeaderGapNotMet),
            EventRecord::Heartbeat(HeartbeatEvent {
                ts: at(9, 45).timestamp(),
                status: "alive".into(),
                last_ref_return: None,
                last_success_ts: None,
                last_success_candle_open_time: None,
                last_success_symbol: None,
                success_age_sec: None,
                uptime_sec: 0,
                cycles_evaluated: 0,
                signals_emitted: 0,
            }),
            skip(at(10, 0), SkipReason::RateLimitDailyCapReached),
        ];

        for event in &events {
            assert!(log.append(event));
            counters.record_event(event, Local.timestamp_opt(event.ts(), 0).unwrap());
        }

        let logged: Vec<EventRecord> = log.read_all().unwrap();
        let day = at(0, 0).date_naive();
        let first = DailyCounters::replay(&logged, day);
        let second = DailyCounters::replay(&logged, day);

        assert_eq!(first, second);
        assert_eq!(&first, counters.state());
        assert_eq!(first.get(CounterKind::VolumeDeadZoneHits), 1);
        assert_eq!(first.get(CounterKind::RateLimitBlocked), 1);

        let other_day = DailyCounters::replay(&logged, day + Duration::days(1));
        assert!(other_day.counts.values().all(|&c| c == 0));
    }
}
