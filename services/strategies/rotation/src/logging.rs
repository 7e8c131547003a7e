//! Standardized emoji logging for the rotation monitor
//!
//! Keeps log markers consistent across the monitor loop so signal, skip and
//! network lines are easy to grep.

use tracing_subscriber::{fmt, EnvFilter};

/// Standard emoji set for rotation logging
pub struct LogEmoji;

impl LogEmoji {
    pub const SIGNAL: &'static str = "🔄"; // Rotation detected
    pub const SKIP: &'static str = "⏭️"; // Cycle ended without a signal
    pub const GATE: &'static str = "🚧"; // Volatility gate
    pub const CHART: &'static str = "📊"; // Metrics/statistics
    pub const NETWORK: &'static str = "🌐"; // Fetch/connection
    pub const HEARTBEAT: &'static str = "💓";
}

#[macro_export]
macro_rules! log_signal {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SIGNAL, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_skip {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SKIP, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_network {
    ($($arg:tt)*) => {
        tracing::warn!("{} {}", $crate::logging::LogEmoji::NETWORK, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_metrics {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::CHART, format!($($arg)*))
    };
}

/// Install the global subscriber. `RUST_LOG` overrides `level`.
pub fn init_logging(level: &str, json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let builder = fmt().with_env_filter(filter).with_target(true);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
