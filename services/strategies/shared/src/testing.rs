//! Testing utilities for strategies

use crate::error::FetchError;
use crate::traits::{AlertChannel, CandleSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use rotation_types::Candle;
use std::collections::HashMap;

/// Candle source answering from canned per-pair responses.
///
/// Pairs without a response fail with an HTTP 404.
#[derive(Debug, Default)]
pub struct MockCandleSource {
    responses: Mutex<HashMap<String, Result<Vec<Candle>, FetchError>>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl MockCandleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_candles(&self, symbol_pair: &str, candles: Vec<Candle>) {
        self.set_response(symbol_pair, Ok(candles));
    }

    pub fn set_error(&self, symbol_pair: &str, error: FetchError) {
        self.set_response(symbol_pair, Err(error));
    }

    pub fn set_response(&self, symbol_pair: &str, response: Result<Vec<Candle>, FetchError>) {
        self.responses
            .lock()
            .insert(symbol_pair.to_string(), response);
    }

    pub fn call_count(&self, symbol_pair: &str) -> u32 {
        self.calls.lock().get(symbol_pair).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl CandleSource for MockCandleSource {
    async fn fetch_candles(
        &self,
        symbol_pair: &str,
        _interval: &str,
        limit: u32,
    ) -> Result<Vec<Candle>, FetchError> {
        *self
            .calls
            .lock()
            .entry(symbol_pair.to_string())
            .or_insert(0) += 1;

        match self.responses.lock().get(symbol_pair) {
            Some(Ok(candles)) => {
                let skip = candles.len().saturating_sub(limit as usize);
                Ok(candles[skip..].to_vec())
            }
            Some(Err(err)) => Err(err.clone()),
            None => Err(FetchError::HttpStatus {
                status: 404,
                body: format!("no canned response for {}", symbol_pair),
            }),
        }
    }
}

/// Alert channel that records every message it is asked to send
#[derive(Debug)]
pub struct RecordingAlertChannel {
    sent: Mutex<Vec<String>>,
    deliver: bool,
}

impl RecordingAlertChannel {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            deliver: true,
        }
    }

    /// Channel that records messages but reports delivery failure
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            deliver: false,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

impl Default for RecordingAlertChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertChannel for RecordingAlertChannel {
    async fn send(&self, text: &str) -> bool {
        self.sent.lock().push(text.to_string());
        self.deliver
    }
}

/// Candles spaced 15 minutes apart with the given closes and volumes.
///
/// Open/high/low track the close; `volumes` shorter than `closes` repeats its
/// last value (or 1.0 when empty).
pub fn synthetic_candles(start_open_time: i64, closes: &[f64], volumes: &[f64]) -> Vec<Candle> {
    const STEP_MS: i64 = 15 * 60 * 1000;

    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let volume = volumes
                .get(i)
                .or_else(|| volumes.last())
                .copied()
                .unwrap_or(1.0);
            Candle::new(
                start_open_time + i as i64 * STEP_MS,
                close,
                close,
                close,
                close,
                volume,
            )
        })
        .collect()
}
