//! Claims issuance
//!
//! The account registry is the single source of the `admin` claim. Setting it
//! and issuing tokens from it are operator actions (CLI only) and each one is
//! written to the audit log.

use crate::auth::{AuthError, IdentityResolver};
use crate::domain::entities::account::{Account, AuditEntry, AuditEventType};
use crate::domain::errors::RepositoryError;
use crate::domain::repositories::platform_repository::{AccountRepository, AuditRepository};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Actor recorded for operator tooling.
pub const PLATFORM_ACTOR: &str = "platform";

#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    #[error("Invalid uid: '{0}'")]
    InvalidUid(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub struct ClaimsIssuer {
    accounts: Arc<dyn AccountRepository>,
    audits: Arc<dyn AuditRepository>,
}

impl ClaimsIssuer {
    pub fn new(accounts: Arc<dyn AccountRepository>, audits: Arc<dyn AuditRepository>) -> Self {
        Self { accounts, audits }
    }

    /// Set or clear the admin claim for `uid`, creating the account if needed.
    pub async fn set_admin(&self, uid: &str, admin: bool, actor: &str) -> Result<Account, ClaimsError> {
        validate_uid(uid)?;
        let now = Utc::now();
        let mut account = self
            .accounts
            .get(uid)
            .await?
            .unwrap_or_else(|| Account::new(uid, now));
        let previous = account.admin;
        account.admin = admin;
        account.updated_at = now;

        self.accounts.upsert(&account).await?;
        self.audits
            .append(&AuditEntry::new(
                AuditEventType::AdminClaimSet,
                actor,
                uid,
                serde_json::json!({ "admin": admin, "previous": previous }),
            ))
            .await?;

        info!("Admin claim for {} set to {} by {}", uid, admin, actor);
        Ok(account)
    }

    /// Sign a session token for `uid` carrying the registry's current flag.
    ///
    /// Unknown uids get a non-admin account on first issuance.
    pub async fn issue_token(
        &self,
        resolver: &IdentityResolver,
        uid: &str,
        actor: &str,
    ) -> Result<String, ClaimsError> {
        validate_uid(uid)?;
        let account = match self.accounts.get(uid).await? {
            Some(account) => account,
            None => {
                let account = Account::new(uid, Utc::now());
                self.accounts.upsert(&account).await?;
                account
            }
        };

        let token = resolver.sign(&account.uid, account.admin)?;
        self.audits
            .append(&AuditEntry::new(
                AuditEventType::TokenIssued,
                actor,
                uid,
                serde_json::json!({ "admin": account.admin }),
            ))
            .await?;

        info!("Issued session token for {} (admin: {})", uid, account.admin);
        Ok(token)
    }
}

fn validate_uid(uid: &str) -> Result<(), ClaimsError> {
    let valid = !uid.is_empty()
        && uid.len() <= 128
        && uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ClaimsError::InvalidUid(uid.to_string()))
    }
}
