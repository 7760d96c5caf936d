//! Trader Entity
//!
//! Public profile of a trader together with the aggregate performance stats
//! that feed the leaderboard. Profiles are written by platform tooling only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraderStatus {
    #[default]
    Active,
    Suspended,
}

impl TraderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraderStatus::Active => "active",
            TraderStatus::Suspended => "suspended",
        }
    }
}

/// Aggregate performance of a trader's ideas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraderStats {
    pub ideas_open: u32,
    pub ideas_closed: u32,
    /// Fraction of closed ideas that ended in profit (0.0-1.0)
    pub win_rate: f64,
    pub total_pnl: f64,
    pub pnl_7d: f64,
    pub pnl_30d: f64,
    pub r_multiple_avg: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraderLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trader {
    pub id: String,
    pub handle: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub status: TraderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub stats: TraderStats,
    #[serde(default)]
    pub links: TraderLinks,
}

impl Trader {
    /// Create a new trader profile
    ///
    /// # Errors
    /// Returns an error if:
    /// - ID is empty or longer than 100 characters
    /// - ID contains invalid characters (only lowercase alphanumeric, _, - allowed)
    /// - handle does not start with '@'
    pub fn new(
        id: impl Into<String>,
        handle: impl Into<String>,
        display_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, String> {
        let id = id.into();
        let handle = handle.into();

        if id.is_empty() || id.len() > 100 {
            return Err("Trader ID must be between 1 and 100 characters".to_string());
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(format!("Trader ID contains invalid characters: {}", id));
        }
        if !handle.starts_with('@') || handle.len() < 2 {
            return Err(format!("Handle must start with '@': {}", handle));
        }

        Ok(Self {
            id,
            handle,
            display_name: display_name.into(),
            bio: String::new(),
            avatar_url: None,
            status: TraderStatus::Active,
            created_at,
            stats: TraderStats::default(),
            links: TraderLinks::default(),
        })
    }
}
