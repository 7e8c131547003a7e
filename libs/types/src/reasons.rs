//! Closed reason taxonomy for selection, rate limiting and skips
//!
//! These strings are both log text and the machine-checkable skip taxonomy of
//! the events log, so they are enums with fixed wire names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of leader selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderReason {
    LeaderSelected,
    NotEnoughSymbols,
    LeaderGapNotMet,
    LeaderMinReturnNotMet,
}

impl LeaderReason {
    pub fn as_str(self) -> &'static str {
        match self {
            LeaderReason::LeaderSelected => "leader_selected",
            LeaderReason::NotEnoughSymbols => "not_enough_symbols",
            LeaderReason::LeaderGapNotMet => "leader_gap_not_met",
            LeaderReason::LeaderMinReturnNotMet => "leader_min_return_not_met",
        }
    }

    /// Skip reason for a rejection; `None` for `LeaderSelected`
    pub fn skip_reason(self) -> Option<SkipReason> {
        match self {
            LeaderReason::LeaderSelected => None,
            LeaderReason::NotEnoughSymbols => Some(SkipReason::NotEnoughSymbols),
            LeaderReason::LeaderGapNotMet => Some(SkipReason::LeaderGapNotMet),
            LeaderReason::LeaderMinReturnNotMet => Some(SkipReason::LeaderMinReturnNotMet),
        }
    }
}

/// Outcome of laggard selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LagReason {
    LagsSelected,
    LeaderMissing,
    NoLagCandidates,
}

impl LagReason {
    pub fn as_str(self) -> &'static str {
        match self {
            LagReason::LagsSelected => "lags_selected",
            LagReason::LeaderMissing => "leader_missing",
            LagReason::NoLagCandidates => "no_lag_candidates",
        }
    }

    pub fn skip_reason(self) -> Option<SkipReason> {
        match self {
            LagReason::LagsSelected => None,
            LagReason::LeaderMissing => Some(SkipReason::LeaderMissing),
            LagReason::NoLagCandidates => Some(SkipReason::NoLagCandidates),
        }
    }
}

/// Outcome of the alert rate limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateReason {
    RateLimitOk,
    DailyCapReached,
    CooldownActive,
}

impl RateReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RateReason::RateLimitOk => "rate_limit_ok",
            RateReason::DailyCapReached => "daily_cap_reached",
            RateReason::CooldownActive => "cooldown_active",
        }
    }

    pub fn skip_reason(self) -> Option<SkipReason> {
        match self {
            RateReason::RateLimitOk => None,
            RateReason::DailyCapReached => Some(SkipReason::RateLimitDailyCapReached),
            RateReason::CooldownActive => Some(SkipReason::RateLimitCooldownActive),
        }
    }
}

/// Why a detection cycle ended without a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    VolatilityGate,
    NotEnoughSymbols,
    LeaderGapNotMet,
    LeaderMinReturnNotMet,
    LeaderMissing,
    NoLagCandidates,
    RateLimitDailyCapReached,
    RateLimitCooldownActive,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::VolatilityGate => "volatility_gate",
            SkipReason::NotEnoughSymbols => "not_enough_symbols",
            SkipReason::LeaderGapNotMet => "leader_gap_not_met",
            SkipReason::LeaderMinReturnNotMet => "leader_min_return_not_met",
            SkipReason::LeaderMissing => "leader_missing",
            SkipReason::NoLagCandidates => "no_lag_candidates",
            SkipReason::RateLimitDailyCapReached => "rate_limit_daily_cap_reached",
            SkipReason::RateLimitCooldownActive => "rate_limit_cooldown_active",
        }
    }
}

macro_rules! impl_display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

impl_display_as_str!(LeaderReason, LagReason, RateReason, SkipReason);
