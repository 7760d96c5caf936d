//! Trader directory and leaderboard. Profiles are public; nothing here writes.

use crate::domain::entities::trader::Trader;
use crate::domain::errors::StoreError;
use crate::domain::repositories::platform_repository::TraderRepository;
use crate::domain::services::leaderboard::{self, LeaderboardEntry, LeaderboardMetric};
use std::sync::Arc;

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

pub struct TraderService {
    traders: Arc<dyn TraderRepository>,
}

impl TraderService {
    pub fn new(traders: Arc<dyn TraderRepository>) -> Self {
        Self { traders }
    }

    pub async fn get(&self, id: &str) -> Result<Trader, StoreError> {
        self.traders
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("trader {}", id)))
    }

    pub async fn list(&self) -> Result<Vec<Trader>, StoreError> {
        Ok(self.traders.list().await?)
    }

    /// Ranked traders; `limit` is clamped to `1..=MAX_LEADERBOARD_LIMIT`.
    pub async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let limit = limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .clamp(1, MAX_LEADERBOARD_LIMIT);
        let traders = self.traders.list().await?;
        Ok(leaderboard::rank(&traders, metric, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::memory::MemoryStore;
    use chrono::Utc;

    async fn seeded() -> TraderService {
        let store = Arc::new(MemoryStore::new());
        for (id, pnl) in [("trader_olof", 12.0), ("trader_mira", 30.0), ("trader_sam", -4.0)] {
            let mut trader =
                Trader::new(id, format!("@{}", id.trim_start_matches("trader_")), id, Utc::now())
                    .unwrap();
            trader.stats.total_pnl = pnl;
            store.upsert(&trader).await.unwrap();
        }
        TraderService::new(store)
    }

    #[tokio::test]
    async fn test_get_unknown_trader_is_not_found() {
        let service = seeded().await;
        assert!(service.get("trader_olof").await.is_ok());
        assert!(matches!(
            service.get("nobody").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_leaderboard_limit_is_clamped() {
        let service = seeded().await;
        let board = service
            .leaderboard(LeaderboardMetric::TotalPnl, Some(0))
            .await
            .unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].trader_id, "trader_mira");

        let board = service
            .leaderboard(LeaderboardMetric::TotalPnl, None)
            .await
            .unwrap();
        assert_eq!(board.len(), 3);
        assert_eq!(board[2].trader_id, "trader_sam");
    }
}
