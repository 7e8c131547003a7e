//! Property-based tests for the scoring primitives

use proptest::prelude::*;
use rotation_config::LeaderConfig;
use rotation_strategy::indicators::{compute_return, median, rolling_sum};
use rotation_strategy::select_leader;
use rotation_types::{MetricRecord, MetricsSnapshot};

fn record(score: f64) -> MetricRecord {
    MetricRecord {
        ret_recent: None,
        ret_primary: score,
        vol_primary: 1.0,
        vol_prior: 1.0,
        vol_chg: 0.0,
        vol_median: None,
        score,
        last_close: 1.0,
    }
}

proptest! {
    #[test]
    fn test_rolling_sum_matches_naive(
        values in prop::collection::vec(0.0f64..1_000_000.0, 0..200),
        window in 0usize..20,
    ) {
        let sums = rolling_sum(&values, window);

        if window == 0 || values.len() < window {
            prop_assert!(sums.is_empty());
        } else {
            prop_assert_eq!(sums.len(), values.len() - window + 1);
            // Incremental updates accumulate rounding error across the whole run
            let scale = values.iter().map(|v| v.abs()).sum::<f64>().max(1.0);
            let tolerance = 1e-12 * scale * values.len() as f64;
            for (i, sum) in sums.iter().enumerate() {
                let naive: f64 = values[i..i + window].iter().sum();
                prop_assert!((sum - naive).abs() <= tolerance,
                    "position {}: incremental {} vs naive {}", i, sum, naive);
            }
        }
    }

    #[test]
    fn test_compute_return_definition(
        closes in prop::collection::vec(prop_oneof![Just(0.0f64), 0.01f64..10_000.0], 0..40),
        periods in 0usize..10,
    ) {
        let result = compute_return(&closes, periods);

        if closes.len() <= periods {
            prop_assert!(result.is_none());
        } else {
            let reference = closes[closes.len() - periods - 1];
            if reference == 0.0 {
                prop_assert!(result.is_none());
            } else {
                let expected = closes[closes.len() - 1] / reference - 1.0;
                prop_assert_eq!(result, Some(expected));
            }
        }
    }

    #[test]
    fn test_median_is_bounded(values in prop::collection::vec(-1e6f64..1e6, 1..100)) {
        let m = median(&values).unwrap();
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(m >= min && m <= max);
    }

    #[test]
    fn test_leader_selection_is_deterministic(
        scores in prop::collection::vec(-0.5f64..0.5, 2..12),
    ) {
        let snapshot: MetricsSnapshot = scores
            .iter()
            .enumerate()
            .map(|(i, &s)| (format!("S{}", i), record(s)))
            .collect();
        let config = LeaderConfig { gap: 0.0, min_return: -1.0 };

        let first = select_leader(&snapshot, &config);
        let second = select_leader(&snapshot, &config);
        prop_assert_eq!(&first, &second);

        // Leader is the earliest symbol holding the maximum score
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let expected = scores.iter().position(|&s| s == max).unwrap();
        let pick = first.unwrap();
        prop_assert_eq!(pick.symbol, format!("S{}", expected));
    }
}
