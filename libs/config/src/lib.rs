//! # Rotation Monitor Configuration
//!
//! Every threshold, interval and path the monitor uses comes from here; the
//! detection core never hard-codes them.
//!
//! ## Features
//!
//! - **Layered Loading**: TOML file, then `ROTATION_`-prefixed environment overrides
//! - **Sectioned Defaults**: every section deserializes from a partial file
//! - **Startup Validation**: unusable values are rejected before the loop starts
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rotation_config::RotationConfig;
//!
//! let config = RotationConfig::load(Some("configs/rotation.toml".as_ref()))?;
//! for (symbol, pair) in config.symbol_pairs() {
//!     println!("{symbol} -> {pair}");
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod defaults;
pub mod rotation_config;

pub use rotation_config::{
    AlertConfig, AlertLimits, ExchangeConfig, GateConfig, LagConfig, LeaderConfig, LoggingConfig,
    MonitorSettings, RotationConfig, StorageConfig, VolumeConfig, WatchlistConfig,
};
