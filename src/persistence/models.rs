//! Database Models
//!
//! Row shapes of the SQLite tables and their conversions to domain entities.
//! List and object fields are stored as JSON text.

use crate::domain::entities::account::{Account, AuditEntry, AuditEventType};
use crate::domain::entities::idea::{Idea, IdeaStatus, Side, Visibility};
use crate::domain::entities::trader::{Trader, TraderStatus};
use crate::domain::errors::RepositoryError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use sqlx::FromRow;

/// Idea record in database
#[derive(Debug, Clone, FromRow)]
pub struct IdeaRecord {
    pub id: String,
    pub trader_id: String,
    pub title: String,
    pub thesis: String,
    pub symbols: String, // JSON array
    pub side: String,
    pub entry: f64,
    pub targets: String, // JSON array
    pub stop: f64,
    pub risk: f64,
    pub timeframe: Option<String>,
    pub status: String,
    pub visibility: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// Trader record in database
#[derive(Debug, Clone, FromRow)]
pub struct TraderRecord {
    pub id: String,
    pub handle: String,
    pub display_name: String,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub stats: String, // JSON object
    pub links: String, // JSON object
}

/// Account record in database
#[derive(Debug, Clone, FromRow)]
pub struct AccountRecord {
    pub uid: String,
    pub admin: bool,
    pub updated_at: DateTime<Utc>,
}

/// Audit record in database
#[derive(Debug, Clone, FromRow)]
pub struct AuditRecord {
    pub id: i64,
    pub event_type: String,
    pub actor: String,
    pub subject: String,
    pub details: String, // JSON string
    pub timestamp: DateTime<Utc>,
}

fn corrupt(id: &str, reason: impl ToString) -> RepositoryError {
    RepositoryError::Corrupt {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

fn from_json<T: DeserializeOwned>(id: &str, column: &str, raw: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(raw).map_err(|e| corrupt(id, format!("{}: {}", column, e)))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Backend(e.to_string()))
}

impl TryFrom<IdeaRecord> for Idea {
    type Error = RepositoryError;

    fn try_from(record: IdeaRecord) -> Result<Self, Self::Error> {
        let id = record.id.as_str();
        let side: Side = record.side.parse().map_err(|e| corrupt(id, e))?;
        let status: IdeaStatus = record.status.parse().map_err(|e| corrupt(id, e))?;
        let visibility: Visibility = record.visibility.parse().map_err(|e| corrupt(id, e))?;
        let version = u64::try_from(record.version).map_err(|e| corrupt(id, e))?;
        let symbols = from_json(id, "symbols", &record.symbols)?;
        let targets = from_json(id, "targets", &record.targets)?;

        Ok(Idea {
            id: record.id,
            trader_id: record.trader_id,
            title: record.title,
            thesis: record.thesis,
            symbols,
            side,
            entry: record.entry,
            targets,
            stop: record.stop,
            risk: record.risk,
            timeframe: record.timeframe,
            status,
            visibility,
            version,
            created_at: record.created_at,
            updated_at: record.updated_at,
            approved_by: record.approved_by,
            approved_at: record.approved_at,
        })
    }
}

impl TryFrom<TraderRecord> for Trader {
    type Error = RepositoryError;

    fn try_from(record: TraderRecord) -> Result<Self, Self::Error> {
        let id = record.id.as_str();
        let status = match record.status.as_str() {
            "active" => TraderStatus::Active,
            "suspended" => TraderStatus::Suspended,
            other => return Err(corrupt(id, format!("unknown trader status '{}'", other))),
        };
        let stats = from_json(id, "stats", &record.stats)?;
        let links = from_json(id, "links", &record.links)?;

        Ok(Trader {
            id: record.id,
            handle: record.handle,
            display_name: record.display_name,
            bio: record.bio,
            avatar_url: record.avatar_url,
            status,
            created_at: record.created_at,
            stats,
            links,
        })
    }
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Account {
            uid: record.uid,
            admin: record.admin,
            updated_at: record.updated_at,
        }
    }
}

impl TryFrom<AuditRecord> for AuditEntry {
    type Error = RepositoryError;

    fn try_from(record: AuditRecord) -> Result<Self, Self::Error> {
        let id = record.id.to_string();
        let event_type = AuditEventType::parse(&record.event_type)
            .ok_or_else(|| corrupt(&id, format!("unknown event type '{}'", record.event_type)))?;
        let details = from_json(&id, "details", &record.details)?;

        Ok(AuditEntry {
            event_type,
            actor: record.actor,
            subject: record.subject,
            details,
            timestamp: record.timestamp,
        })
    }
}
