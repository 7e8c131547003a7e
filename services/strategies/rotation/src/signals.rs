//! Leader and laggard selection

use rotation_config::{LagConfig, LeaderConfig};
use rotation_types::{LagReason, LeaderReason, MetricsSnapshot};

/// Accepted leader with the margin it won by
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderPick {
    pub symbol: String,
    pub runner_up: String,
    pub score_gap: f64,
}

/// Pick the top-scoring symbol if it clearly beats the runner-up.
///
/// Ranking is a stable sort by score, so ties keep snapshot (watchlist) order.
pub fn select_leader(
    snapshot: &MetricsSnapshot,
    config: &LeaderConfig,
) -> Result<LeaderPick, LeaderReason> {
    if snapshot.len() < 2 {
        return Err(LeaderReason::NotEnoughSymbols);
    }

    let mut ranked: Vec<_> = snapshot.iter().collect();
    ranked.sort_by(|(_, a), (_, b)| b.score.total_cmp(&a.score));

    let (leader, top) = ranked[0];
    let (runner_up, second) = ranked[1];
    let score_gap = top.score - second.score;

    if score_gap < config.gap {
        return Err(LeaderReason::LeaderGapNotMet);
    }
    if top.ret_primary < config.min_return {
        return Err(LeaderReason::LeaderMinReturnNotMet);
    }

    Ok(LeaderPick {
        symbol: leader.to_string(),
        runner_up: runner_up.to_string(),
        score_gap,
    })
}

/// Symbols trailing the leader by at least the lag gap, above the return floor,
/// with volume confirming. Sorted lexicographically.
pub fn select_lags(
    snapshot: &MetricsSnapshot,
    leader: &str,
    config: &LagConfig,
) -> Result<Vec<String>, LagReason> {
    let leader_metrics = snapshot.get(leader).ok_or(LagReason::LeaderMissing)?;
    let ceiling = leader_metrics.ret_primary - config.gap;

    let mut lags: Vec<String> = snapshot
        .iter()
        .filter(|(symbol, _)| *symbol != leader)
        .filter(|(_, m)| {
            m.ret_primary <= ceiling
                && m.ret_primary >= config.floor_return
                && m.vol_chg >= config.vol_floor
        })
        .map(|(symbol, _)| symbol.to_string())
        .collect();

    if lags.is_empty() {
        return Err(LagReason::NoLagCandidates);
    }

    lags.sort();
    Ok(lags)
}

/// Cooldown key: leader, then laggards in sorted order
pub fn signal_key(leader: &str, lags: &[String]) -> String {
    let mut sorted: Vec<&str> = lags.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    format!("{}|{}", leader, sorted.join(","))
}
