//! Strategy traits and interfaces

use crate::error::FetchError;
use async_trait::async_trait;
use rotation_types::Candle;
use std::sync::Arc;

/// Source of closed OHLCV candles.
///
/// Implementations return candles ordered by strictly increasing `open_time`
/// and apply their own pacing and backoff.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch up to `limit` most recent candles of `interval` for `symbol_pair`
    async fn fetch_candles(
        &self,
        symbol_pair: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>, FetchError>;
}

/// Outbound text alert channel
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Deliver `text`; `false` when delivery failed or the channel is unconfigured
    async fn send(&self, text: &str) -> bool;
}

#[async_trait]
impl<T: CandleSource + ?Sized> CandleSource for Arc<T> {
    async fn fetch_candles(
        &self,
        symbol_pair: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>, FetchError> {
        (**self).fetch_candles(symbol_pair, interval, limit).await
    }
}

#[async_trait]
impl<T: AlertChannel + ?Sized> AlertChannel for Arc<T> {
    async fn send(&self, text: &str) -> bool {
        (**self).send(text).await
    }
}
