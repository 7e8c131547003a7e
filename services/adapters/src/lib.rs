//! # Rotation Adapters
//!
//! Boundary between the rotation monitor and external services:
//!
//! - [`BinanceCandleSource`]: REST kline fetcher with client-side request
//!   pacing, exponential backoff and failure classification into
//!   [`FetchError`](rotation_strategy_shared::FetchError).
//! - [`TelegramNotifier`]: best-effort Bot API alert channel.
//!
//! Both implement the traits from `rotation-strategy-shared`, so the monitor
//! can be driven by test doubles instead.

pub mod backoff;
pub mod binance;
pub mod error;
pub mod rate_limit;
pub mod telegram;

pub use backoff::FetchBackoff;
pub use binance::BinanceCandleSource;
pub use error::{AdapterError, Result};
pub use rate_limit::RequestPacer;
pub use telegram::TelegramNotifier;
