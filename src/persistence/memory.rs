//! In-memory store
//!
//! Implements every repository trait over `tokio::sync::RwLock`-guarded maps.
//! Conditional writes check the version under the same write guard that
//! applies them, so the compare-and-swap is atomic.

use crate::domain::entities::account::{Account, AuditEntry};
use crate::domain::entities::idea::{Idea, IdeaFilter};
use crate::domain::entities::market::PriceQuote;
use crate::domain::entities::trader::Trader;
use crate::domain::errors::RepositoryResult;
use crate::domain::repositories::idea_repository::{IdeaRepository, WriteOutcome};
use crate::domain::repositories::platform_repository::{
    AccountRepository, AuditRepository, PriceRepository, TraderRepository,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    ideas: RwLock<HashMap<String, Idea>>,
    traders: RwLock<HashMap<String, Trader>>,
    accounts: RwLock<HashMap<String, Account>>,
    audits: RwLock<Vec<AuditEntry>>,
    prices: RwLock<HashMap<String, PriceQuote>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdeaRepository for MemoryStore {
    async fn get(&self, id: &str) -> RepositoryResult<Option<Idea>> {
        Ok(self.ideas.read().await.get(id).cloned())
    }

    async fn query(&self, filter: &IdeaFilter) -> RepositoryResult<Vec<Idea>> {
        let ideas = self.ideas.read().await;
        let mut matched: Vec<Idea> = ideas.values().filter(|i| filter.matches(i)).cloned().collect();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(matched)
    }

    async fn insert(&self, idea: &Idea) -> RepositoryResult<WriteOutcome> {
        let mut ideas = self.ideas.write().await;
        if ideas.contains_key(&idea.id) {
            return Ok(WriteOutcome::Rejected);
        }
        ideas.insert(idea.id.clone(), idea.clone());
        Ok(WriteOutcome::Applied)
    }

    async fn replace(&self, idea: &Idea, expected_version: u64) -> RepositoryResult<WriteOutcome> {
        let mut ideas = self.ideas.write().await;
        match ideas.get_mut(&idea.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = idea.clone();
                Ok(WriteOutcome::Applied)
            }
            _ => Ok(WriteOutcome::Rejected),
        }
    }

    async fn delete(&self, id: &str, expected_version: u64) -> RepositoryResult<WriteOutcome> {
        let mut ideas = self.ideas.write().await;
        match ideas.get(id) {
            Some(stored) if stored.version == expected_version => {
                ideas.remove(id);
                Ok(WriteOutcome::Applied)
            }
            _ => Ok(WriteOutcome::Rejected),
        }
    }

    async fn upsert(&self, idea: &Idea) -> RepositoryResult<()> {
        self.ideas.write().await.insert(idea.id.clone(), idea.clone());
        Ok(())
    }
}

#[async_trait]
impl TraderRepository for MemoryStore {
    async fn get(&self, id: &str) -> RepositoryResult<Option<Trader>> {
        Ok(self.traders.read().await.get(id).cloned())
    }

    async fn list(&self) -> RepositoryResult<Vec<Trader>> {
        let mut traders: Vec<Trader> = self.traders.read().await.values().cloned().collect();
        traders.sort_by(|a, b| a.handle.cmp(&b.handle));
        Ok(traders)
    }

    async fn upsert(&self, trader: &Trader) -> RepositoryResult<()> {
        self.traders
            .write()
            .await
            .insert(trader.id.clone(), trader.clone());
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn get(&self, uid: &str) -> RepositoryResult<Option<Account>> {
        Ok(self.accounts.read().await.get(uid).cloned())
    }

    async fn upsert(&self, account: &Account) -> RepositoryResult<()> {
        self.accounts
            .write()
            .await
            .insert(account.uid.clone(), account.clone());
        Ok(())
    }
}

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn append(&self, entry: &AuditEntry) -> RepositoryResult<()> {
        self.audits.write().await.push(entry.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> RepositoryResult<Vec<AuditEntry>> {
        let audits = self.audits.read().await;
        Ok(audits.iter().rev().take(limit).cloned().collect())
    }
}

#[async_trait]
impl PriceRepository for MemoryStore {
    async fn upsert(&self, quote: &PriceQuote) -> RepositoryResult<()> {
        self.prices
            .write()
            .await
            .insert(quote.symbol.clone(), quote.clone());
        Ok(())
    }
}
