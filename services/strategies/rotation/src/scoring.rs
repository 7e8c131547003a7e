//! Per-symbol momentum and volume scoring
//!
//! Windows are counted in candles; on the 15m timeframe the primary window of
//! 4 candles covers one hour.

use crate::error::ScoringError;
use crate::indicators::{clip, compute_return, median, rolling_sum, safe_div};
use rotation_types::candle::{closes, volumes};
use rotation_types::{Candle, MetricRecord};

/// Minimum history: two full primary windows
pub const MIN_CANDLES: usize = 8;

pub const PRIMARY_WINDOW: usize = 4;
pub const RECENT_WINDOW: usize = 2;
pub const VOLUME_WINDOW: usize = 4;

/// Candles considered for the rolling-volume median (one day of 15m candles)
pub const MEDIAN_LOOKBACK: usize = 96;

pub const VOLUME_WEIGHT: f64 = 0.3;
pub const VOLUME_CHANGE_MIN: f64 = -1.0;
pub const VOLUME_CHANGE_MAX: f64 = 3.0;

/// Score one symbol's candles (oldest first)
pub fn compute_metrics(candles: &[Candle]) -> Result<MetricRecord, ScoringError> {
    if candles.len() < MIN_CANDLES {
        return Err(ScoringError::InsufficientHistory {
            have: candles.len(),
            need: MIN_CANDLES,
        });
    }

    let closes = closes(candles);
    let volumes = volumes(candles);

    let ret_primary =
        compute_return(&closes, PRIMARY_WINDOW).ok_or(ScoringError::ZeroReferenceClose)?;
    let ret_recent = compute_return(&closes, RECENT_WINDOW);

    let n = volumes.len();
    let vol_primary: f64 = volumes[n - VOLUME_WINDOW..].iter().sum();
    let vol_prior: f64 = volumes[n - 2 * VOLUME_WINDOW..n - VOLUME_WINDOW].iter().sum();
    let vol_chg = if vol_prior != 0.0 {
        safe_div(vol_primary, vol_prior, 0.0) - 1.0
    } else {
        0.0
    };

    let lookback = &volumes[n.saturating_sub(MEDIAN_LOOKBACK)..];
    let vol_median = median(&rolling_sum(lookback, VOLUME_WINDOW));

    let score = ret_primary + VOLUME_WEIGHT * clip(vol_chg, VOLUME_CHANGE_MIN, VOLUME_CHANGE_MAX);

    Ok(MetricRecord {
        ret_recent,
        ret_primary,
        vol_primary,
        vol_prior,
        vol_chg,
        vol_median,
        score,
        last_close: closes[n - 1],
    })
}

/// Primary-window volume has dried up relative to its rolling median.
///
/// Without a median there is nothing to compare against, so never skip.
pub fn in_volume_dead_zone(record: &MetricRecord, drop_ratio: f64) -> bool {
    match record.vol_median {
        Some(median) => record.vol_primary < median * drop_ratio,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotation_strategy_shared::synthetic_candles;

    #[test]
    fn test_insufficient_history() {
        let candles = synthetic_candles(0, &[1.0; 7], &[1.0]);
        assert_eq!(
            compute_metrics(&candles),
            Err(ScoringError::InsufficientHistory { have: 7, need: 8 })
        );
    }

    #[test]
    fn test_zero_reference_close_invalidates() {
        let closes = [1.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let candles = synthetic_candles(0, &closes, &[1.0]);
        assert_eq!(
            compute_metrics(&candles),
            Err(ScoringError::ZeroReferenceClose)
        );
    }

    #[test]
    fn test_metrics_for_volume_pickup() {
        let closes = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.02];
        let volumes = [10.0, 10.0, 10.0, 10.0, 12.0, 12.0, 12.0, 12.0];
        let record = compute_metrics(&synthetic_candles(0, &closes, &volumes)).unwrap();

        assert!((record.ret_primary - 0.02).abs() < 1e-9);
        assert!((record.ret_recent.unwrap() - 0.02).abs() < 1e-9);
        assert_eq!(record.vol_primary, 48.0);
        assert_eq!(record.vol_prior, 40.0);
        assert!((record.vol_chg - 0.2).abs() < 1e-9);
        assert_eq!(record.vol_median, Some(44.0));
        assert!((record.score - 0.08).abs() < 1e-9);
        assert_eq!(record.last_close, 1.02);
    }

    #[test]
    fn test_volume_change_is_clipped_in_score() {
        let closes = [1.0; 8];
        let volumes = [1.0, 1.0, 1.0, 1.0, 10.0, 10.0, 10.0, 10.0];
        let record = compute_metrics(&synthetic_candles(0, &closes, &volumes)).unwrap();

        assert!((record.vol_chg - 9.0).abs() < 1e-9);
        assert!((record.score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_zero_prior_volume() {
        let closes = [1.0; 8];
        let volumes = [0.0, 0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 5.0];
        let record = compute_metrics(&synthetic_candles(0, &closes, &volumes)).unwrap();
        assert_eq!(record.vol_chg, 0.0);
    }

    #[test]
    fn test_volume_dead_zone() {
        let closes = [1.0; 8];
        let volumes = [10.0, 10.0, 10.0, 10.0, 1.0, 1.0, 1.0, 1.0];
        let mut record = compute_metrics(&synthetic_candles(0, &closes, &volumes)).unwrap();

        // Rolling sums 40, 31, 22, 13, 4 → median 22; primary volume 4
        assert_eq!(record.vol_median, Some(22.0));
        assert!(in_volume_dead_zone(&record, 0.5));
        assert!(!in_volume_dead_zone(&record, 0.1));

        record.vol_median = None;
        assert!(!in_volume_dead_zone(&record, 0.5));
    }
}
