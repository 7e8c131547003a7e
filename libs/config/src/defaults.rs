//! Default values for every configuration section
//!
//! Used by the `Default` impls in `rotation_config`; a config file only has
//! to name the values it changes.

/// Polling and candle defaults
pub mod monitor {
    pub const TIMEFRAME: &str = "15m";

    /// 120 fifteen-minute candles cover the 96-candle median lookback with headroom
    pub const CANDLE_LIMIT: u32 = 120;

    pub const POLL_INTERVAL_SECS: u64 = 30;

    pub const HEARTBEAT_INTERVAL_SECS: u64 = 300;

    /// Scoring needs two primary windows of candles
    pub const MIN_SCORING_CANDLES: u32 = 8;
}

/// Volatility gate defaults
pub mod gate {
    pub const REFERENCE_SYMBOL: &str = "BTC";
    pub const REFERENCE_PAIR: &str = "BTCUSDT";
    pub const ABS_RETURN_THRESHOLD: f64 = 0.01;
}

/// Watchlist defaults
pub mod watchlist {
    pub const QUOTE_ASSET: &str = "USDT";
    pub const SYMBOLS: &[&str] = &["ARB", "OP", "MATIC", "STRK", "MNT"];
}

/// Leader, laggard and volume-filter thresholds
pub mod selection {
    pub const LEADER_GAP: f64 = 0.01;
    pub const LEADER_MIN_RETURN: f64 = 0.02;
    pub const LAG_GAP: f64 = 0.015;
    pub const LAG_FLOOR_RETURN: f64 = -0.01;
    pub const LAG_VOL_FLOOR: f64 = 0.0;
    pub const VOLUME_DROP_RATIO: f64 = 0.5;
}

/// Alert rate-limit defaults
pub mod limits {
    pub const MAX_ALERTS_PER_DAY: u32 = 6;
    pub const COOLDOWN_MINUTES: u32 = 120;
}

/// Exchange adapter defaults
pub mod exchange {
    pub const BINANCE_BASE_URL: &str = "https://api.binance.com";

    /// Per-request timeout (seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;

    /// Client-side request quota, well under Binance's weight budget
    pub const REQUESTS_PER_MINUTE: u32 = 600;

    pub const BACKOFF_BASE_SECS: u64 = 5;
    pub const BACKOFF_MAX_SECS: u64 = 300;
}

/// Storage and logging defaults
pub mod storage {
    pub const DIR: &str = "./data/rotation";
    pub const RATE_STATE_FILE: &str = "rate_state.json";
    pub const COUNTERS_FILE: &str = "gate_stats.json";
    pub const SIGNALS_FILE: &str = "signals.jsonl";
    pub const EVENTS_FILE: &str = "events.jsonl";
    pub const LOG_LEVEL: &str = "info";
}
