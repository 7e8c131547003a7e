//! Numeric primitives for candle scoring

/// Clamp `value` to `[low, high]`
pub fn clip(value: f64, low: f64, high: f64) -> f64 {
    value.max(low).min(high)
}

/// `numerator / denominator`, or `default` when the denominator is exactly zero
pub fn safe_div(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator == 0.0 {
        default
    } else {
        numerator / denominator
    }
}

/// Sums of every `window`-sized run of `values`, oldest first.
///
/// Empty when `window` is zero or longer than `values`.
pub fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }

    let mut sums = Vec::with_capacity(values.len() - window + 1);
    let mut running: f64 = values[..window].iter().sum();
    sums.push(running);

    for i in window..values.len() {
        running += values[i] - values[i - window];
        sums.push(running);
    }

    sums
}

/// Median; mean of the two middle values for even lengths
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Return of the last close over the close `periods` candles earlier.
///
/// `None` without enough history or when the earlier close is zero.
pub fn compute_return(closes: &[f64], periods: usize) -> Option<f64> {
    if closes.len() <= periods {
        return None;
    }

    let reference = closes[closes.len() - periods - 1];
    if reference == 0.0 {
        return None;
    }

    let last = closes[closes.len() - 1];
    Some(last / reference - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip() {
        assert_eq!(clip(5.0, -1.0, 3.0), 3.0);
        assert_eq!(clip(-2.0, -1.0, 3.0), -1.0);
        assert_eq!(clip(0.5, -1.0, 3.0), 0.5);
    }

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(1.0, 0.0, 7.0), 7.0);
        assert_eq!(safe_div(1.0, 4.0, 7.0), 0.25);
    }

    #[test]
    fn test_rolling_sum() {
        assert_eq!(rolling_sum(&[1.0, 2.0, 3.0, 4.0], 2), vec![3.0, 5.0, 7.0]);
        assert_eq!(rolling_sum(&[1.0, 2.0, 3.0], 3), vec![6.0]);
        assert!(rolling_sum(&[1.0, 2.0], 3).is_empty());
        assert!(rolling_sum(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_compute_return() {
        let closes = [1.0, 2.0, 4.0];
        assert_eq!(compute_return(&closes, 1), Some(1.0));
        assert_eq!(compute_return(&closes, 2), Some(3.0));
        assert_eq!(compute_return(&closes, 3), None);
        assert_eq!(compute_return(&[0.0, 1.0], 1), None);
    }
}
