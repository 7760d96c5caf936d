use crate::domain::entities::trader::{Trader, TraderStatus};
use crate::domain::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Stat a leaderboard is ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardMetric {
    #[default]
    TotalPnl,
    Pnl7d,
    Pnl30d,
    WinRate,
    RMultipleAvg,
}

impl LeaderboardMetric {
    pub fn value(&self, trader: &Trader) -> f64 {
        let stats = &trader.stats;
        match self {
            LeaderboardMetric::TotalPnl => stats.total_pnl,
            LeaderboardMetric::Pnl7d => stats.pnl_7d,
            LeaderboardMetric::Pnl30d => stats.pnl_30d,
            LeaderboardMetric::WinRate => stats.win_rate,
            LeaderboardMetric::RMultipleAvg => stats.r_multiple_avg,
        }
    }
}

impl FromStr for LeaderboardMetric {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total_pnl" => Ok(LeaderboardMetric::TotalPnl),
            "pnl_7d" => Ok(LeaderboardMetric::Pnl7d),
            "pnl_30d" => Ok(LeaderboardMetric::Pnl30d),
            "win_rate" => Ok(LeaderboardMetric::WinRate),
            "r_multiple_avg" => Ok(LeaderboardMetric::RMultipleAvg),
            other => Err(ValidationError::UnknownVariant {
                field: "metric".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub trader_id: String,
    pub handle: String,
    pub display_name: String,
    pub value: f64,
}

/// Rank active traders by `metric`, best first.
///
/// Ties are broken by handle so the ordering is stable across calls.
/// Suspended traders and non-finite values are left out.
pub fn rank(traders: &[Trader], metric: LeaderboardMetric, limit: usize) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<(&Trader, f64)> = traders
        .iter()
        .filter(|t| t.status == TraderStatus::Active)
        .map(|t| (t, metric.value(t)))
        .filter(|(_, v)| v.is_finite())
        .collect();

    ranked.sort_by(|(a, va), (b, vb)| {
        vb.partial_cmp(va)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.handle.cmp(&b.handle))
    });

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (t, value))| LeaderboardEntry {
            rank: i + 1,
            trader_id: t.id.clone(),
            handle: t.handle.clone(),
            display_name: t.display_name.clone(),
            value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn trader(id: &str, total_pnl: f64, win_rate: f64) -> Trader {
        let mut t = Trader::new(id, format!("@{}", id), id.to_uppercase(), Utc::now()).unwrap();
        t.stats.total_pnl = total_pnl;
        t.stats.win_rate = win_rate;
        t
    }

    #[test]
    fn test_rank_by_total_pnl_descending() {
        let traders = vec![trader("a", 10.0, 0.9), trader("b", 50.0, 0.1), trader("c", -5.0, 0.5)];
        let board = rank(&traders, LeaderboardMetric::TotalPnl, 10);
        let ids: Vec<_> = board.iter().map(|e| e.trader_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[2].rank, 3);
    }

    #[test]
    fn test_rank_by_win_rate_and_limit() {
        let traders = vec![trader("a", 10.0, 0.9), trader("b", 50.0, 0.1), trader("c", -5.0, 0.5)];
        let board = rank(&traders, LeaderboardMetric::WinRate, 2);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].trader_id, "a");
        assert_eq!(board[1].trader_id, "c");
    }

    #[test]
    fn test_ties_break_by_handle_and_suspended_excluded() {
        let mut suspended = trader("z", 100.0, 1.0);
        suspended.status = TraderStatus::Suspended;
        let traders = vec![trader("m", 5.0, 0.0), trader("k", 5.0, 0.0), suspended];
        let board = rank(&traders, LeaderboardMetric::TotalPnl, 10);
        let ids: Vec<_> = board.iter().map(|e| e.trader_id.as_str()).collect();
        assert_eq!(ids, vec!["k", "m"]);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("pnl_30d".parse::<LeaderboardMetric>().unwrap(), LeaderboardMetric::Pnl30d);
        assert!("sharpe".parse::<LeaderboardMetric>().is_err());
    }
}
