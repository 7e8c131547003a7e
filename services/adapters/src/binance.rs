//! Binance REST kline source
//!
//! `GET {base_url}/api/v3/klines?symbol=..&interval=..&limit=..`, paced by a
//! [`RequestPacer`] and guarded by a [`FetchBackoff`]. Every failure is mapped
//! to a [`FetchError`]; nothing here panics or propagates transport errors.

use crate::backoff::FetchBackoff;
use crate::error::{AdapterError, Result};
use crate::rate_limit::RequestPacer;
use async_trait::async_trait;
use parking_lot::Mutex;
use rotation_config::ExchangeConfig;
use rotation_strategy_shared::{CandleSource, FetchError};
use rotation_types::Candle;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const KLINES_PATH: &str = "/api/v3/klines";

/// Binance error code for "too many requests"
const TOO_MANY_REQUESTS_CODE: i64 = -1003;

/// Error bodies are truncated to this many characters
const MAX_ERROR_BODY_CHARS: usize = 120;

/// Kline rows carry at least open_time, open, high, low, close, volume
const MIN_ROW_FIELDS: usize = 6;

pub struct BinanceCandleSource {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    pacer: RequestPacer,
    backoff: Mutex<FetchBackoff>,
}

impl BinanceCandleSource {
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        if config.request_timeout_secs == 0 {
            return Err(AdapterError::InvalidConfig {
                field: "request_timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .pool_idle_timeout(Duration::from_secs(60))
            .build()?;

        let pacer = RequestPacer::new(config.requests_per_minute);
        debug!(
            "Binance candle source at {} ({} requests/min)",
            config.base_url,
            pacer.requests_per_minute()
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout,
            pacer,
            backoff: Mutex::new(FetchBackoff::new(
                Duration::from_secs(config.backoff_base_secs),
                Duration::from_secs(config.backoff_max_secs),
            )),
        })
    }

    pub fn klines_url(&self) -> String {
        format!("{}{}", self.base_url, KLINES_PATH)
    }

    /// Open a backoff window and hand the error back
    fn penalise(&self, symbol_pair: &str, error: FetchError) -> FetchError {
        let (delay, failures) = {
            let mut backoff = self.backoff.lock();
            let delay = backoff.record_failure(Instant::now());
            (delay, backoff.consecutive_failures())
        };
        warn!(
            "Kline fetch failed for {}: {} (backing off {}s, {} consecutive)",
            symbol_pair,
            error,
            delay.as_secs(),
            failures
        );
        error
    }

    async fn request(
        &self,
        symbol_pair: &str,
        interval: &str,
        limit: u32,
    ) -> std::result::Result<Value, FetchError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(self.klines_url())
            .query(&[
                ("symbol", symbol_pair),
                ("interval", interval),
                ("limit", limit.as_str()),
            ])
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status.as_u16() == 429 || status.as_u16() == 418 {
            return Err(FetchError::RateLimited {
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let body = response.text().await.map_err(classify_transport_error)?;

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl CandleSource for BinanceCandleSource {
    async fn fetch_candles(
        &self,
        symbol_pair: &str,
        interval: &str,
        limit: u32,
    ) -> std::result::Result<Vec<Candle>, FetchError> {
        let allowed = self.backoff.lock().check(Instant::now());
        if let Err(remaining) = allowed {
            return Err(FetchError::BackingOff {
                remaining_ms: remaining.as_millis() as u64,
            });
        }

        if !self.pacer.check() {
            debug!("Pacing kline request for {}", symbol_pair);
            self.pacer.wait().await;
        }

        let payload = match self.request(symbol_pair, interval, limit).await {
            Ok(payload) => payload,
            Err(error) => return Err(self.penalise(symbol_pair, error)),
        };

        if let Some(message) = rate_limit_error(&payload) {
            return Err(self.penalise(symbol_pair, FetchError::RateLimited { message }));
        }

        let rows = match payload.as_array() {
            Some(rows) => rows,
            None => {
                // Structurally wrong payload; not the exchange's fault, no backoff
                warn!("Unexpected kline payload for {}: not an array", symbol_pair);
                return Err(FetchError::Malformed(format!(
                    "expected array, got {}",
                    truncate_chars(&payload.to_string(), MAX_ERROR_BODY_CHARS)
                )));
            }
        };

        let candles = parse_kline_rows(rows);
        if candles.len() < rows.len() {
            debug!(
                "Dropped {} of {} kline rows for {}",
                rows.len() - candles.len(),
                rows.len(),
                symbol_pair
            );
        }

        self.backoff.lock().record_success();
        Ok(candles)
    }
}

impl std::fmt::Debug for BinanceCandleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceCandleSource")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("pacer", &self.pacer)
            .finish()
    }
}

fn classify_transport_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_decode() {
        FetchError::Malformed(error.to_string())
    } else {
        FetchError::Transport(error.to_string())
    }
}

/// `{"code": -1003, "msg": ...}` error objects
fn rate_limit_error(payload: &Value) -> Option<String> {
    let object = payload.as_object()?;
    if object.get("code").and_then(Value::as_i64) != Some(TOO_MANY_REQUESTS_CODE) {
        return None;
    }
    let message = object
        .get("msg")
        .and_then(Value::as_str)
        .unwrap_or("too many requests");
    Some(truncate_chars(message, MAX_ERROR_BODY_CHARS))
}

/// Parse kline rows into candles with strictly increasing `open_time`.
///
/// Short rows, non-numeric or non-finite fields, and rows that do not advance
/// `open_time` are dropped.
pub fn parse_kline_rows(rows: &[Value]) -> Vec<Candle> {
    let mut candles: Vec<Candle> = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(candle) = parse_kline_row(row) else {
            continue;
        };
        if let Some(last) = candles.last() {
            if candle.open_time <= last.open_time {
                continue;
            }
        }
        candles.push(candle);
    }

    candles
}

fn parse_kline_row(row: &Value) -> Option<Candle> {
    let fields = row.as_array()?;
    if fields.len() < MIN_ROW_FIELDS {
        return None;
    }

    let open_time = match &fields[0] {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.parse().ok()?,
        _ => return None,
    };

    let candle = Candle::new(
        open_time,
        numeric_field(&fields[1])?,
        numeric_field(&fields[2])?,
        numeric_field(&fields[3])?,
        numeric_field(&fields[4])?,
        numeric_field(&fields[5])?,
    );

    candle.is_valid().then_some(candle)
}

/// Binance sends prices and volumes as strings; accept numbers too
fn numeric_field(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.parse::<f64>().ok()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn config_for(url: &str) -> ExchangeConfig {
        ExchangeConfig {
            base_url: url.to_string(),
            request_timeout_secs: 5,
            requests_per_minute: 0,
            backoff_base_secs: 5,
            backoff_max_secs: 300,
        }
    }

    fn kline_body() -> String {
        json!([
            [1_700_000_000_000i64, "1.00", "1.10", "0.90", "1.05", "1000.0", 1_700_000_899_999i64],
            [1_700_000_900_000i64, "1.05", "1.20", "1.00", "1.15", "1500.5", 1_700_001_799_999i64],
        ])
        .to_string()
    }

    #[test]
    fn test_parse_rows_drops_bad_and_unordered() {
        let rows = vec![
            json!([1000, "1", "1", "1", "1.5", "10"]),
            json!([2000, 2.0, 2.0, 2.0, 2.5, 20.0]),
            json!([1500, "1", "1", "1", "1", "1"]),
            json!([3000, "1", "1", "1", "nope", "1"]),
            json!([4000, "1", "1", "1"]),
            json!(["5000", "1", "1", "1", "3.5", "5"]),
        ];

        let candles = parse_kline_rows(&rows);
        let times: Vec<i64> = candles.iter().map(|c| c.open_time).collect();
        assert_eq!(times, vec![1000, 2000, 5000]);
        assert_eq!(candles[1].close, 2.5);
        assert_eq!(candles[2].volume, 5.0);
    }

    #[tokio::test]
    async fn test_fetch_parses_klines() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/klines")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("symbol".into(), "ARBUSDT".into()),
                Matcher::UrlEncoded("interval".into(), "15m".into()),
                Matcher::UrlEncoded("limit".into(), "2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(kline_body())
            .create_async()
            .await;

        let source = BinanceCandleSource::new(&config_for(&server.url())).unwrap();
        let candles = source.fetch_candles("ARBUSDT", "15m", 2).await.unwrap();

        mock.assert_async().await;
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time, 1_700_000_000_000);
        assert_eq!(candles[1].close, 1.15);
        assert_eq!(candles[1].volume, 1500.5);
    }

    #[tokio::test]
    async fn test_http_429_is_rate_limited_and_backs_off() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/klines")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body("slow down")
            .expect(1)
            .create_async()
            .await;

        let source = BinanceCandleSource::new(&config_for(&server.url())).unwrap();

        let first = source.fetch_candles("OPUSDT", "15m", 10).await;
        assert!(matches!(first, Err(FetchError::RateLimited { .. })));

        // Second call is refused locally without hitting the server
        let second = source.fetch_candles("OPUSDT", "15m", 10).await;
        assert!(matches!(second, Err(FetchError::BackingOff { .. })));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_truncates_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v3/klines")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("x".repeat(500))
            .create_async()
            .await;

        let source = BinanceCandleSource::new(&config_for(&server.url())).unwrap();
        match source.fetch_candles("OPUSDT", "15m", 10).await {
            Err(FetchError::HttpStatus { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body.len(), MAX_ERROR_BODY_CHARS);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_binance_error_code_is_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v3/klines")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"code":-1003,"msg":"Too many requests"}"#)
            .create_async()
            .await;

        let source = BinanceCandleSource::new(&config_for(&server.url())).unwrap();
        match source.fetch_candles("OPUSDT", "15m", 10).await {
            Err(FetchError::RateLimited { message }) => assert_eq!(message, "Too many requests"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_array_payload_does_not_back_off() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/klines")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"unexpected":true}"#)
            .expect(2)
            .create_async()
            .await;

        let source = BinanceCandleSource::new(&config_for(&server.url())).unwrap();

        for _ in 0..2 {
            let result = source.fetch_candles("OPUSDT", "15m", 10).await;
            assert!(matches!(result, Err(FetchError::Malformed(_))));
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_undecodable_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v3/klines")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let source = BinanceCandleSource::new(&config_for(&server.url())).unwrap();
        let result = source.fetch_candles("OPUSDT", "15m", 10).await;
        assert!(matches!(result, Err(FetchError::Malformed(_))));

        let refused = source.fetch_candles("OPUSDT", "15m", 10).await;
        assert!(matches!(refused, Err(FetchError::BackingOff { .. })));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = config_for("http://localhost");
        config.request_timeout_secs = 0;
        assert!(matches!(
            BinanceCandleSource::new(&config),
            Err(AdapterError::InvalidConfig { .. })
        ));
    }
}
