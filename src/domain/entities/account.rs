//! Account and audit records.
//!
//! An [`Account`] is the claims registry entry from which session tokens are
//! issued; it is the only place the `admin` flag is decided. Every change to
//! it, and every admin review of an idea, leaves an [`AuditEntry`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub uid: String,
    pub admin: bool,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(uid: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            uid: uid.into(),
            admin: false,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventType {
    #[serde(rename = "claims.admin_set")]
    AdminClaimSet,
    #[serde(rename = "claims.token_issued")]
    TokenIssued,
    #[serde(rename = "idea.reviewed")]
    IdeaReviewed,
    #[serde(rename = "idea.deleted")]
    IdeaDeleted,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::AdminClaimSet => "claims.admin_set",
            AuditEventType::TokenIssued => "claims.token_issued",
            AuditEventType::IdeaReviewed => "idea.reviewed",
            AuditEventType::IdeaDeleted => "idea.deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "claims.admin_set" => Some(AuditEventType::AdminClaimSet),
            "claims.token_issued" => Some(AuditEventType::TokenIssued),
            "idea.reviewed" => Some(AuditEventType::IdeaReviewed),
            "idea.deleted" => Some(AuditEventType::IdeaDeleted),
            _ => None,
        }
    }
}

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub event_type: AuditEventType,
    /// Who performed the action (uid, or "platform" for operator tooling)
    pub actor: String,
    /// What the action was performed on (account uid or idea id)
    pub subject: String,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        event_type: AuditEventType,
        actor: impl Into<String>,
        subject: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            event_type,
            actor: actor.into(),
            subject: subject.into(),
            details,
            timestamp: Utc::now(),
        }
    }
}
