//! Market-wide volatility gate on the reference symbol

use rotation_types::Candle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateCheck {
    pub open: bool,
    /// Last-candle return of the reference symbol, when computable
    pub ret: Option<f64>,
}

/// Open iff the reference symbol's last-candle return is within `threshold`.
///
/// Fails closed with fewer than two candles or a zero previous close.
pub fn volatility_gate(candles: &[Candle], threshold: f64) -> GateCheck {
    let closed = GateCheck {
        open: false,
        ret: None,
    };

    let [.., prev, last] = candles else {
        return closed;
    };
    if prev.close == 0.0 {
        return closed;
    }

    let ret = last.close / prev.close - 1.0;
    GateCheck {
        open: ret.abs() <= threshold,
        ret: Some(ret),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotation_strategy_shared::synthetic_candles;

    #[test]
    fn test_calm_market_opens_gate() {
        let candles = synthetic_candles(0, &[100.0, 100.2], &[1.0]);
        let check = volatility_gate(&candles, 0.01);
        assert!(check.open);
        assert!((check.ret.unwrap() - 0.002).abs() < 1e-9);
    }

    #[test]
    fn test_volatile_market_closes_gate() {
        let candles = synthetic_candles(0, &[100.0, 98.0], &[1.0]);
        let check = volatility_gate(&candles, 0.01);
        assert!(!check.open);
        assert!((check.ret.unwrap() + 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_fails_closed() {
        let single = synthetic_candles(0, &[100.0], &[1.0]);
        assert_eq!(
            volatility_gate(&single, 0.01),
            GateCheck {
                open: false,
                ret: None
            }
        );

        let zero_prev = synthetic_candles(0, &[0.0, 1.0], &[1.0]);
        assert!(!volatility_gate(&zero_prev, 0.01).open);
    }
}
