//! Rotation Monitor Configuration Module
//!
//! Loads configuration from a TOML file with `ROTATION_`-prefixed environment
//! overrides. Nested keys are separated by `__`, e.g.
//! `ROTATION_LIMITS__MAX_PER_DAY=3` or `ROTATION_GATE__ABS_RETURN_THRESHOLD=0.015`.

use crate::defaults;
use anyhow::{ensure, Context, Result};
use config_crate::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Main monitor configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct RotationConfig {
    pub monitor: MonitorSettings,
    pub gate: GateConfig,
    pub watchlist: WatchlistConfig,
    pub volume: VolumeConfig,
    pub leader: LeaderConfig,
    pub lag: LagConfig,
    pub limits: AlertLimits,
    pub storage: StorageConfig,
    pub exchange: ExchangeConfig,
    pub alerts: AlertConfig,
    pub logging: LoggingConfig,
}

/// Polling cadence and candle request shape
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MonitorSettings {
    /// Exchange interval string, e.g. "15m"
    pub timeframe: String,
    pub candle_limit: u32,
    pub poll_interval_secs: u64,
    /// 0 disables heartbeats
    pub heartbeat_interval_secs: u64,
}

/// Market-wide volatility circuit breaker
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GateConfig {
    pub reference_symbol: String,
    pub reference_pair: String,
    /// Cycle proceeds only when |reference return| <= this
    pub abs_return_threshold: f64,
}

/// Symbols under watch and their exchange pairs
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct WatchlistConfig {
    pub symbols: Vec<String>,
    /// Either parallel to `symbols`, or a standalone list from which symbols are
    /// derived by stripping `quote_asset`. Empty means `symbol + quote_asset`.
    pub pairs: Vec<String>,
    pub quote_asset: String,
}

/// Volume dead-zone filter
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct VolumeConfig {
    /// Skip a symbol when primary-window volume < median * drop_ratio
    pub drop_ratio: f64,
}

/// Leader selection thresholds
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LeaderConfig {
    /// Minimum score margin over the runner-up
    pub gap: f64,
    /// Minimum primary-window return of the leader
    pub min_return: f64,
}

/// Laggard selection thresholds
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LagConfig {
    /// Laggard must trail the leader's return by at least this much
    pub gap: f64,
    /// Laggard return floor
    pub floor_return: f64,
    /// Minimum volume change confirming the laggard
    pub vol_floor: f64,
}

/// Alert rate limits
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AlertLimits {
    pub max_per_day: u32,
    pub cooldown_minutes: u32,
}

/// On-disk state location
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

/// Candle source settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub requests_per_minute: u32,
    pub backoff_base_secs: u64,
    pub backoff_max_secs: u64,
}

/// Outbound alert channel credentials
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AlertConfig {
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            timeframe: defaults::monitor::TIMEFRAME.to_string(),
            candle_limit: defaults::monitor::CANDLE_LIMIT,
            poll_interval_secs: defaults::monitor::POLL_INTERVAL_SECS,
            heartbeat_interval_secs: defaults::monitor::HEARTBEAT_INTERVAL_SECS,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            reference_symbol: defaults::gate::REFERENCE_SYMBOL.to_string(),
            reference_pair: defaults::gate::REFERENCE_PAIR.to_string(),
            abs_return_threshold: defaults::gate::ABS_RETURN_THRESHOLD,
        }
    }
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            symbols: defaults::watchlist::SYMBOLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            pairs: Vec::new(),
            quote_asset: defaults::watchlist::QUOTE_ASSET.to_string(),
        }
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            drop_ratio: defaults::selection::VOLUME_DROP_RATIO,
        }
    }
}

impl Default for LeaderConfig {
    fn default() -> Self {
        Self {
            gap: defaults::selection::LEADER_GAP,
            min_return: defaults::selection::LEADER_MIN_RETURN,
        }
    }
}

impl Default for LagConfig {
    fn default() -> Self {
        Self {
            gap: defaults::selection::LAG_GAP,
            floor_return: defaults::selection::LAG_FLOOR_RETURN,
            vol_floor: defaults::selection::LAG_VOL_FLOOR,
        }
    }
}

impl Default for AlertLimits {
    fn default() -> Self {
        Self {
            max_per_day: defaults::limits::MAX_ALERTS_PER_DAY,
            cooldown_minutes: defaults::limits::COOLDOWN_MINUTES,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(defaults::storage::DIR),
        }
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::exchange::BINANCE_BASE_URL.to_string(),
            request_timeout_secs: defaults::exchange::REQUEST_TIMEOUT_SECS,
            requests_per_minute: defaults::exchange::REQUESTS_PER_MINUTE,
            backoff_base_secs: defaults::exchange::BACKOFF_BASE_SECS,
            backoff_max_secs: defaults::exchange::BACKOFF_MAX_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::storage::LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

impl StorageConfig {
    pub fn rate_state_path(&self) -> PathBuf {
        self.dir.join(defaults::storage::RATE_STATE_FILE)
    }

    pub fn counters_path(&self) -> PathBuf {
        self.dir.join(defaults::storage::COUNTERS_FILE)
    }

    pub fn signals_path(&self) -> PathBuf {
        self.dir.join(defaults::storage::SIGNALS_FILE)
    }

    pub fn events_path(&self) -> PathBuf {
        self.dir.join(defaults::storage::EVENTS_FILE)
    }
}

impl AlertConfig {
    /// Credentials from the file, falling back to TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID
    pub fn telegram_credentials(&self) -> Option<(String, String)> {
        let token = self
            .telegram_bot_token
            .clone()
            .or_else(|| std::env::var("TELEGRAM_BOT_TOKEN").ok())
            .filter(|t| !t.is_empty())?;
        let chat_id = self
            .telegram_chat_id
            .clone()
            .or_else(|| std::env::var("TELEGRAM_CHAT_ID").ok())
            .filter(|c| !c.is_empty())?;
        Some((token, chat_id))
    }
}

/// `ROTATION_`-prefixed overrides; watchlist lists are comma separated
fn environment() -> Environment {
    Environment::with_prefix("ROTATION")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("watchlist.symbols")
        .with_list_parse_key("watchlist.pairs")
}

impl RotationConfig {
    /// Load configuration from a file (if given) with environment overrides,
    /// expand paths and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading rotation config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        } else {
            warn!("No config file given, using defaults and environment overrides");
        }

        builder = builder.add_source(environment());

        let config: RotationConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.finish()
    }

    /// Parse from TOML text without environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RotationConfig = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .context("Failed to parse configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.finish()
    }

    /// Serialize back to TOML, e.g. to write a starter config
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    fn finish(mut self) -> Result<Self> {
        self.expand_paths()?;
        self.validate()?;
        debug!("Configuration: {:?}", self);
        Ok(self)
    }

    /// Expand environment variables and `~` in path values
    pub fn expand_paths(&mut self) -> Result<()> {
        let raw = self.storage.dir.to_string_lossy().to_string();
        let expanded =
            shellexpand::full(&raw).context("Failed to expand storage directory path")?;
        self.storage.dir = PathBuf::from(expanded.as_ref());
        Ok(())
    }

    /// Reject configurations the monitor cannot run with
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.gate.reference_pair.is_empty(),
            "gate.reference_pair cannot be empty"
        );
        ensure!(
            self.gate.abs_return_threshold.is_finite() && self.gate.abs_return_threshold > 0.0,
            "gate.abs_return_threshold must be a positive number"
        );
        ensure!(
            !self.monitor.timeframe.is_empty(),
            "monitor.timeframe cannot be empty"
        );
        ensure!(
            self.monitor.candle_limit >= defaults::monitor::MIN_SCORING_CANDLES,
            "monitor.candle_limit must be at least {}",
            defaults::monitor::MIN_SCORING_CANDLES
        );
        ensure!(
            self.monitor.poll_interval_secs > 0,
            "monitor.poll_interval_secs must be greater than 0"
        );

        let pairs = self.symbol_pairs();
        ensure!(
            pairs.len() >= 2,
            "watchlist must resolve to at least 2 symbols, got {}",
            pairs.len()
        );

        for (name, value) in [
            ("leader.gap", self.leader.gap),
            ("leader.min_return", self.leader.min_return),
            ("lag.gap", self.lag.gap),
            ("lag.floor_return", self.lag.floor_return),
            ("lag.vol_floor", self.lag.vol_floor),
        ] {
            ensure!(value.is_finite(), "{} must be a finite number", name);
        }
        ensure!(
            self.volume.drop_ratio.is_finite() && self.volume.drop_ratio >= 0.0,
            "volume.drop_ratio must be non-negative"
        );
        ensure!(
            self.limits.max_per_day > 0,
            "limits.max_per_day must be greater than 0"
        );

        ensure!(
            self.exchange.base_url.starts_with("http://")
                || self.exchange.base_url.starts_with("https://"),
            "exchange.base_url must start with http:// or https://"
        );
        ensure!(
            self.exchange.request_timeout_secs > 0,
            "exchange.request_timeout_secs must be greater than 0"
        );
        ensure!(
            self.exchange.requests_per_minute > 0,
            "exchange.requests_per_minute must be greater than 0"
        );
        ensure!(
            self.exchange.backoff_base_secs > 0
                && self.exchange.backoff_base_secs <= self.exchange.backoff_max_secs,
            "exchange backoff must satisfy 0 < backoff_base_secs <= backoff_max_secs"
        );

        Ok(())
    }

    /// Watchlist resolved to `(symbol, exchange pair)` in watchlist order.
    ///
    /// Duplicate symbols keep their first pair.
    pub fn symbol_pairs(&self) -> Vec<(String, String)> {
        let watchlist = &self.watchlist;
        let quote = watchlist.quote_asset.as_str();

        let resolved: Vec<(String, String)> = if watchlist.pairs.is_empty() {
            watchlist
                .symbols
                .iter()
                .map(|symbol| (symbol.clone(), format!("{}{}", symbol, quote)))
                .collect()
        } else if watchlist.pairs.len() == watchlist.symbols.len() {
            watchlist
                .symbols
                .iter()
                .cloned()
                .zip(watchlist.pairs.iter().cloned())
                .collect()
        } else {
            watchlist
                .pairs
                .iter()
                .map(|pair| {
                    let symbol = pair
                        .strip_suffix(quote)
                        .filter(|s| !s.is_empty())
                        .unwrap_or(pair);
                    (symbol.to_string(), pair.clone())
                })
                .collect()
        };

        let mut seen = HashSet::new();
        resolved
            .into_iter()
            .filter(|(symbol, _)| seen.insert(symbol.clone()))
            .collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.poll_interval_secs)
    }
}
