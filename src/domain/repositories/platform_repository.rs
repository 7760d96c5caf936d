//! Repositories for platform-owned collections: traders, accounts (the claims
//! registry), audits and prices. None of these carry per-document policy.

use crate::domain::entities::account::{Account, AuditEntry};
use crate::domain::entities::market::PriceQuote;
use crate::domain::entities::trader::Trader;
use crate::domain::errors::RepositoryResult;
use async_trait::async_trait;

#[async_trait]
pub trait TraderRepository: Send + Sync {
    async fn get(&self, id: &str) -> RepositoryResult<Option<Trader>>;
    async fn list(&self) -> RepositoryResult<Vec<Trader>>;
    async fn upsert(&self, trader: &Trader) -> RepositoryResult<()>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get(&self, uid: &str) -> RepositoryResult<Option<Account>>;
    async fn upsert(&self, account: &Account) -> RepositoryResult<()>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> RepositoryResult<()>;

    /// Most recent entries first.
    async fn recent(&self, limit: usize) -> RepositoryResult<Vec<AuditEntry>>;
}

#[async_trait]
pub trait PriceRepository: Send + Sync {
    async fn upsert(&self, quote: &PriceQuote) -> RepositoryResult<()>;
}
