//! Database Repository
//!
//! SQLite implementations of the domain repository traits.

use super::models::*;
use super::DbPool;
use crate::domain::entities::account::{Account, AuditEntry};
use crate::domain::entities::idea::{Idea, IdeaFilter};
use crate::domain::entities::market::PriceQuote;
use crate::domain::entities::trader::Trader;
use crate::domain::errors::{RepositoryError, RepositoryResult};
use crate::domain::repositories::idea_repository::{IdeaRepository, WriteOutcome};
use crate::domain::repositories::platform_repository::{
    AccountRepository, AuditRepository, PriceRepository, TraderRepository,
};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, error};

fn query_failed(what: &str, e: sqlx::Error) -> RepositoryError {
    error!("Failed to {}: {}", what, e);
    RepositoryError::Backend(format!("Failed to {}: {}", what, e))
}

fn version_param(version: u64) -> RepositoryResult<i64> {
    i64::try_from(version).map_err(|_| RepositoryError::Backend(format!("version {} out of range", version)))
}

/// Idea repository
pub struct SqliteIdeaRepository {
    pool: DbPool,
}

impl SqliteIdeaRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdeaRepository for SqliteIdeaRepository {
    async fn get(&self, id: &str) -> RepositoryResult<Option<Idea>> {
        let record = sqlx::query_as::<_, IdeaRecord>("SELECT * FROM ideas WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed("get idea", e))?;

        record.map(Idea::try_from).transpose()
    }

    async fn query(&self, filter: &IdeaFilter) -> RepositoryResult<Vec<Idea>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM ideas WHERE 1 = 1");
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(visibility) = filter.visibility {
            builder.push(" AND visibility = ").push_bind(visibility.as_str());
        }
        if let Some(trader_id) = &filter.trader_id {
            builder.push(" AND trader_id = ").push_bind(trader_id.clone());
        }
        builder.push(" ORDER BY updated_at DESC, id ASC");

        let records = builder
            .build_query_as::<IdeaRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed("query ideas", e))?;

        records.into_iter().map(Idea::try_from).collect()
    }

    async fn insert(&self, idea: &Idea) -> RepositoryResult<WriteOutcome> {
        let rows_affected = sqlx::query(
            r#"
            INSERT INTO ideas (
                id, trader_id, title, thesis, symbols, side, entry, targets, stop,
                risk, timeframe, status, visibility, version, created_at, updated_at,
                approved_by, approved_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&idea.id)
        .bind(&idea.trader_id)
        .bind(&idea.title)
        .bind(&idea.thesis)
        .bind(to_json(&idea.symbols)?)
        .bind(idea.side.as_str())
        .bind(idea.entry)
        .bind(to_json(&idea.targets)?)
        .bind(idea.stop)
        .bind(idea.risk)
        .bind(&idea.timeframe)
        .bind(idea.status.as_str())
        .bind(idea.visibility.as_str())
        .bind(version_param(idea.version)?)
        .bind(idea.created_at)
        .bind(idea.updated_at)
        .bind(&idea.approved_by)
        .bind(idea.approved_at)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("insert idea", e))?
        .rows_affected();

        if rows_affected == 0 {
            debug!("Insert of idea {} rejected, id taken", idea.id);
            return Ok(WriteOutcome::Rejected);
        }
        debug!("Created idea: {} for {}", idea.id, idea.trader_id);
        Ok(WriteOutcome::Applied)
    }

    async fn replace(&self, idea: &Idea, expected_version: u64) -> RepositoryResult<WriteOutcome> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE ideas
            SET trader_id = ?1, title = ?2, thesis = ?3, symbols = ?4, side = ?5,
                entry = ?6, targets = ?7, stop = ?8, risk = ?9, timeframe = ?10,
                status = ?11, visibility = ?12, version = ?13, updated_at = ?14,
                approved_by = ?15, approved_at = ?16
            WHERE id = ?17 AND version = ?18
            "#,
        )
        .bind(&idea.trader_id)
        .bind(&idea.title)
        .bind(&idea.thesis)
        .bind(to_json(&idea.symbols)?)
        .bind(idea.side.as_str())
        .bind(idea.entry)
        .bind(to_json(&idea.targets)?)
        .bind(idea.stop)
        .bind(idea.risk)
        .bind(&idea.timeframe)
        .bind(idea.status.as_str())
        .bind(idea.visibility.as_str())
        .bind(version_param(idea.version)?)
        .bind(idea.updated_at)
        .bind(&idea.approved_by)
        .bind(idea.approved_at)
        .bind(&idea.id)
        .bind(version_param(expected_version)?)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("update idea", e))?
        .rows_affected();

        if rows_affected == 0 {
            debug!("Update of idea {} rejected at version {}", idea.id, expected_version);
            return Ok(WriteOutcome::Rejected);
        }
        debug!("Updated idea: {} to version {}", idea.id, idea.version);
        Ok(WriteOutcome::Applied)
    }

    async fn delete(&self, id: &str, expected_version: u64) -> RepositoryResult<WriteOutcome> {
        let rows_affected = sqlx::query("DELETE FROM ideas WHERE id = ?1 AND version = ?2")
            .bind(id)
            .bind(version_param(expected_version)?)
            .execute(&self.pool)
            .await
            .map_err(|e| query_failed("delete idea", e))?
            .rows_affected();

        if rows_affected == 0 {
            return Ok(WriteOutcome::Rejected);
        }
        debug!("Deleted idea: {}", id);
        Ok(WriteOutcome::Applied)
    }

    async fn upsert(&self, idea: &Idea) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO ideas (
                id, trader_id, title, thesis, symbols, side, entry, targets, stop,
                risk, timeframe, status, visibility, version, created_at, updated_at,
                approved_by, approved_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
        )
        .bind(&idea.id)
        .bind(&idea.trader_id)
        .bind(&idea.title)
        .bind(&idea.thesis)
        .bind(to_json(&idea.symbols)?)
        .bind(idea.side.as_str())
        .bind(idea.entry)
        .bind(to_json(&idea.targets)?)
        .bind(idea.stop)
        .bind(idea.risk)
        .bind(&idea.timeframe)
        .bind(idea.status.as_str())
        .bind(idea.visibility.as_str())
        .bind(version_param(idea.version)?)
        .bind(idea.created_at)
        .bind(idea.updated_at)
        .bind(&idea.approved_by)
        .bind(idea.approved_at)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("upsert idea", e))?;

        Ok(())
    }
}

/// Trader repository
pub struct SqliteTraderRepository {
    pool: DbPool,
}

impl SqliteTraderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TraderRepository for SqliteTraderRepository {
    async fn get(&self, id: &str) -> RepositoryResult<Option<Trader>> {
        let record = sqlx::query_as::<_, TraderRecord>("SELECT * FROM traders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed("get trader", e))?;

        record.map(Trader::try_from).transpose()
    }

    async fn list(&self) -> RepositoryResult<Vec<Trader>> {
        let records = sqlx::query_as::<_, TraderRecord>("SELECT * FROM traders ORDER BY handle ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed("list traders", e))?;

        records.into_iter().map(Trader::try_from).collect()
    }

    async fn upsert(&self, trader: &Trader) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO traders (
                id, handle, display_name, bio, avatar_url, status, created_at, stats, links
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&trader.id)
        .bind(&trader.handle)
        .bind(&trader.display_name)
        .bind(&trader.bio)
        .bind(&trader.avatar_url)
        .bind(trader.status.as_str())
        .bind(trader.created_at)
        .bind(to_json(&trader.stats)?)
        .bind(to_json(&trader.links)?)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("upsert trader", e))?;

        debug!("Upserted trader: {}", trader.id);
        Ok(())
    }
}

/// Account repository
pub struct SqliteAccountRepository {
    pool: DbPool,
}

impl SqliteAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn get(&self, uid: &str) -> RepositoryResult<Option<Account>> {
        let record = sqlx::query_as::<_, AccountRecord>("SELECT * FROM accounts WHERE uid = ?1")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_failed("get account", e))?;

        Ok(record.map(Account::from))
    }

    async fn upsert(&self, account: &Account) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (uid, admin, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(uid) DO UPDATE SET admin = excluded.admin, updated_at = excluded.updated_at
            "#,
        )
        .bind(&account.uid)
        .bind(account.admin)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("upsert account", e))?;

        Ok(())
    }
}

/// Audit repository
pub struct SqliteAuditRepository {
    pool: DbPool,
}

impl SqliteAuditRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for SqliteAuditRepository {
    async fn append(&self, entry: &AuditEntry) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audits (event_type, actor, subject, details, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(entry.event_type.as_str())
        .bind(&entry.actor)
        .bind(&entry.subject)
        .bind(to_json(&entry.details)?)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("append audit entry", e))?;

        debug!("Audit: {} {} -> {}", entry.event_type.as_str(), entry.actor, entry.subject);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> RepositoryResult<Vec<AuditEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records =
            sqlx::query_as::<_, AuditRecord>("SELECT * FROM audits ORDER BY id DESC LIMIT ?1")
                .bind(limit)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| query_failed("read audit log", e))?;

        records.into_iter().map(AuditEntry::try_from).collect()
    }
}

/// Price repository
pub struct SqlitePriceRepository {
    pool: DbPool,
}

impl SqlitePriceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceRepository for SqlitePriceRepository {
    async fn upsert(&self, quote: &PriceQuote) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO prices (symbol, market, price, as_of, source)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&quote.symbol)
        .bind(quote.market.as_str())
        .bind(quote.price)
        .bind(quote.as_of)
        .bind(&quote.source)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("upsert price", e))?;

        Ok(())
    }
}
