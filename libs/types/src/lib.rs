//! # Rotation Monitor Types
//!
//! Record types shared by every crate in the workspace.
//!
//! ## Design Philosophy
//!
//! - **Typed Records**: Candles, metrics, signals and events are named structs, never loose maps
//! - **Closed Reason Taxonomy**: Every leader/lag/rate/skip outcome is an enum variant with a
//!   stable snake_case wire name, so logs stay machine-checkable
//! - **Append-Only Shapes**: `SignalDecision` and `EventRecord` serialize to one JSON object per
//!   line and deserialize back for replay
//!
//! ## Quick Start
//!
//! ```rust
//! use rotation_types::{Candle, EventRecord, SkipEvent, SkipReason};
//!
//! let candle = Candle::new(1_700_000_000_000, 100.0, 101.0, 99.5, 100.5, 12.0);
//! assert!(candle.is_valid());
//!
//! let event = EventRecord::Skip(SkipEvent::new(1_700_000_000, SkipReason::VolatilityGate, Some(0.02)));
//! let line = serde_json::to_string(&event).unwrap();
//! assert!(line.contains("\"type\":\"skip\""));
//! ```

pub mod candle;
pub mod events;
pub mod metrics;
pub mod reasons;

pub use candle::Candle;
pub use events::{
    EventRecord, FetchEvent, HeartbeatEvent, SignalDecision, SignalReasons, SkipEvent,
    VolumeDeadZoneEvent,
};
pub use metrics::{MetricRecord, MetricsSnapshot};
pub use reasons::{LagReason, LeaderReason, RateReason, SkipReason};
