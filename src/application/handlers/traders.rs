use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::application::state::AppState;
use crate::domain::entities::trader::Trader;
use crate::domain::services::leaderboard::{LeaderboardEntry, LeaderboardMetric};

/// Query parameters for the leaderboard endpoint
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    /// total_pnl (default), pnl_7d, pnl_30d, win_rate, r_multiple_avg
    pub metric: Option<String>,
    /// Number of entries (default 10, max 100)
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TraderListResponse {
    pub traders: Vec<Trader>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub metric: LeaderboardMetric,
    pub entries: Vec<LeaderboardEntry>,
}

pub async fn list_traders(
    State(state): State<AppState>,
) -> Result<Json<TraderListResponse>, ApiError> {
    let traders = state.traders.list().await?;
    Ok(Json(TraderListResponse {
        count: traders.len(),
        traders,
    }))
}

pub async fn get_trader(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Trader>, ApiError> {
    Ok(Json(state.traders.get(&id).await?))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    params: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::invalid_argument(rejection.body_text()))?;
    let metric = match params.metric.as_deref() {
        Some(raw) => raw.parse::<LeaderboardMetric>()?,
        None => LeaderboardMetric::default(),
    };
    let entries = state.traders.leaderboard(metric, params.limit).await?;
    Ok(Json(LeaderboardResponse { metric, entries }))
}
