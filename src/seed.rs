//! Seed tooling
//!
//! Fills a store with deterministic demo data: traders, ideas drawn from a
//! crypto (70%) and an equity instrument pool, and one price per seeded
//! symbol. It also writes the fixtures the access rule scenario runs
//! against (`idea_draft_1`, `idea_submitted_1`, `idea_approved_1` owned by
//! `trader_olof`) and the accounts `trader_olof` and `admin_alexa`.
//!
//! Seed writes are platform writes and bypass the idea policy.

use crate::application::services::claims_service::{ClaimsError, ClaimsIssuer, PLATFORM_ACTOR};
use crate::domain::entities::idea::{Idea, IdeaStatus, Side, Visibility};
use crate::domain::entities::market::{Market, PriceQuote};
use crate::domain::entities::trader::{Trader, TraderLinks};
use crate::domain::errors::RepositoryError;
use crate::domain::repositories::idea_repository::IdeaRepository;
use crate::domain::repositories::platform_repository::{PriceRepository, TraderRepository};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub const SEED: u64 = 42042;
pub const TRADER_COUNT: usize = 10;
pub const IDEA_COUNT: usize = 28;

pub const SCENARIO_TRADER: &str = "trader_olof";
pub const SCENARIO_ADMIN: &str = "admin_alexa";

const CRYPTO: &[(&str, f64)] = &[
    ("BTC", 65000.0),
    ("ETH", 3200.0),
    ("SOL", 160.0),
    ("AVAX", 40.0),
    ("LINK", 18.0),
    ("MATIC", 0.8),
    ("BNB", 550.0),
    ("DOGE", 0.12),
    ("ADA", 0.45),
    ("XRP", 0.55),
];

const EQUITY: &[(&str, f64)] = &[
    ("AAPL", 200.0),
    ("MSFT", 450.0),
    ("NVDA", 950.0),
    ("AMZN", 180.0),
    ("GOOGL", 175.0),
    ("META", 520.0),
    ("TSLA", 250.0),
];

const FIRST_NAMES: &[&str] = &[
    "Olivia", "Liam", "Maja", "Noah", "Freja", "Elias", "Astrid", "Hugo", "Ines", "Mateo",
    "Sofia", "Kenji", "Amara", "Lukas",
];

const LAST_NAMES: &[&str] = &[
    "Lindqvist", "Okafor", "Moreau", "Tanaka", "Berg", "Costa", "Novak", "Haddad", "Keller",
    "Silva", "Andersen",
];

const TAGS: &[&str] = &["momentum", "swing", "mean-revert", "news", "breakout", "range"];

const THESES: &[&str] = &[
    "Higher lows into resistance with volume building.",
    "Funding reset and open interest flushed; looking for continuation.",
    "Reclaimed the weekly level after a failed breakdown.",
    "Earnings drift plus sector rotation favour this side.",
    "Range extremes have held three times; fading the move.",
    "Momentum divergence on the daily suggests exhaustion.",
    "Catalyst next week is underpriced by options.",
];

/// Everything the random part of a seed run writes.
#[derive(Debug, Clone)]
pub struct SeedData {
    pub traders: Vec<Trader>,
    pub ideas: Vec<Idea>,
    pub prices: Vec<PriceQuote>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub traders: usize,
    pub ideas: usize,
    pub prices: usize,
    pub accounts: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Invalid seed fixture: {0}")]
    InvalidFixture(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Claims(#[from] ClaimsError),
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

fn suffix(rng: &mut StdRng, len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

fn make_traders(rng: &mut StdRng, count: usize, now: DateTime<Utc>) -> Result<Vec<Trader>, SeedError> {
    let mut traders = Vec::with_capacity(count);
    for _ in 0..count {
        let first = pick(rng, FIRST_NAMES);
        let last = pick(rng, LAST_NAMES);
        let name = format!("{} {}", first, last);
        let id = slugify(&format!("{}-{}", name, suffix(rng, 4)));
        let handle_base = slugify(&format!("{}{}", first, &last[..1]));
        let handle = format!("@{}", handle_base);

        let mut trader = Trader::new(id, handle, name, now).map_err(SeedError::InvalidFixture)?;
        trader.bio = pick(rng, THESES).to_string();
        trader.avatar_url = Some(format!(
            "https://api.dicebear.com/8.x/identicon/svg?seed={}",
            trader.id
        ));
        trader.links = TraderLinks {
            twitter: Some(format!("https://x.com/{}", handle_base)),
        };

        let stats = &mut trader.stats;
        stats.ideas_closed = rng.gen_range(0..40);
        stats.win_rate = round_to(rng.gen_range(0.35..0.70), 2);
        stats.total_pnl = round_to(rng.gen_range(-15.0..85.0), 2);
        stats.pnl_30d = round_to(stats.total_pnl * rng.gen_range(0.1..0.6), 2);
        stats.pnl_7d = round_to(stats.pnl_30d * rng.gen_range(0.1..0.5), 2);
        stats.r_multiple_avg = round_to(rng.gen_range(-0.5..2.5), 2);
        traders.push(trader);
    }
    Ok(traders)
}

fn make_ideas(
    rng: &mut StdRng,
    traders: &[Trader],
    count: usize,
    now: DateTime<Utc>,
) -> Vec<(Idea, Market)> {
    let mut ideas = Vec::with_capacity(count);
    for _ in 0..count {
        let trader = pick(rng, traders);
        let (market, pool) = if rng.gen_bool(0.7) {
            (Market::Crypto, CRYPTO)
        } else {
            (Market::Equity, EQUITY)
        };
        let (symbol, base_price) = *pick(rng, pool);
        let side = if rng.gen_bool(0.5) { Side::Long } else { Side::Short };

        let entry = round_to(base_price * (1.0 + rng.gen_range(-0.12..=0.12)), 6);
        let stop_distance = rng.gen_range(0.05..=0.15);
        let target_distance = rng.gen_range(0.08..=0.30);
        let (stop, target) = match side {
            Side::Long => (entry * (1.0 - stop_distance), entry * (1.0 + target_distance)),
            Side::Short => (entry * (1.0 + stop_distance), entry * (1.0 - target_distance)),
        };
        let (stop, target) = (round_to(stop, 6), round_to(target, 6));

        let roll: f64 = rng.gen();
        let status = if roll < 0.6 {
            IdeaStatus::Approved
        } else if roll < 0.85 {
            IdeaStatus::Submitted
        } else {
            IdeaStatus::Draft
        };
        let visibility = if status == IdeaStatus::Approved && rng.gen_bool(0.8) {
            Visibility::Public
        } else {
            Visibility::Private
        };

        let opened_at = now - Duration::days(rng.gen_range(0..=6));
        let tag = pick(rng, TAGS);
        let id = slugify(&format!("{}-{}-{}", symbol, trader.id, suffix(rng, 6)));

        let idea = Idea {
            id,
            trader_id: trader.id.clone(),
            title: format!("{} {} {}", symbol, side.as_str().to_uppercase(), tag),
            thesis: pick(rng, THESES).to_string(),
            symbols: vec![symbol.to_string()],
            side,
            entry,
            targets: vec![target],
            stop,
            risk: round_to((entry - stop).abs() / entry * 100.0, 2),
            timeframe: Some(pick(rng, &["4h", "1d", "1w"]).to_string()),
            status,
            visibility,
            version: 1,
            created_at: opened_at,
            updated_at: opened_at,
            approved_by: (status == IdeaStatus::Approved).then(|| SCENARIO_ADMIN.to_string()),
            approved_at: (status == IdeaStatus::Approved).then_some(opened_at),
        };
        ideas.push((idea, market));
    }
    ideas
}

/// First seen entry price per symbol.
fn initial_prices(ideas: &[(Idea, Market)], now: DateTime<Utc>) -> Vec<PriceQuote> {
    let mut prices: BTreeMap<String, PriceQuote> = BTreeMap::new();
    for (idea, market) in ideas {
        for symbol in &idea.symbols {
            prices.entry(symbol.clone()).or_insert_with(|| PriceQuote {
                symbol: symbol.clone(),
                market: *market,
                price: idea.entry,
                as_of: now,
                source: "seed".to_string(),
            });
        }
    }
    prices.into_values().collect()
}

/// Deterministic demo data for `seed`.
pub fn generate(seed: u64, now: DateTime<Utc>) -> Result<SeedData, SeedError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut traders = make_traders(&mut rng, TRADER_COUNT, now)?;
    let ideas = make_ideas(&mut rng, &traders, IDEA_COUNT, now);
    let prices = initial_prices(&ideas, now);

    for trader in &mut traders {
        trader.stats.ideas_open = ideas
            .iter()
            .filter(|(idea, _)| idea.trader_id == trader.id && idea.status != IdeaStatus::Rejected)
            .count() as u32;
    }

    Ok(SeedData {
        traders,
        ideas: ideas.into_iter().map(|(idea, _)| idea).collect(),
        prices,
    })
}

fn scenario_idea(id: &str, status: IdeaStatus, visibility: Visibility, now: DateTime<Utc>) -> Idea {
    Idea {
        id: id.to_string(),
        trader_id: SCENARIO_TRADER.to_string(),
        title: format!("Scenario {}", status),
        thesis: "Fixture for the access rule scenario".to_string(),
        symbols: vec!["BTC-USD".to_string()],
        side: Side::Long,
        entry: 65000.0,
        targets: vec![70000.0],
        stop: 62000.0,
        risk: round_to(3000.0 / 65000.0 * 100.0, 2),
        timeframe: Some("1d".to_string()),
        status,
        visibility,
        version: 1,
        created_at: now,
        updated_at: now,
        approved_by: (status == IdeaStatus::Approved).then(|| SCENARIO_ADMIN.to_string()),
        approved_at: (status == IdeaStatus::Approved).then_some(now),
    }
}

/// Fixture profile and ideas owned by `trader_olof`.
pub fn scenario_fixtures(now: DateTime<Utc>) -> Result<(Trader, Vec<Idea>), SeedError> {
    let mut trader = Trader::new(SCENARIO_TRADER, "@olof", "Olof", now).map_err(SeedError::InvalidFixture)?;
    trader.bio = "Scenario trader".to_string();

    let ideas = vec![
        scenario_idea("idea_draft_1", IdeaStatus::Draft, Visibility::Private, now),
        scenario_idea("idea_submitted_1", IdeaStatus::Submitted, Visibility::Private, now),
        scenario_idea("idea_approved_1", IdeaStatus::Approved, Visibility::Public, now),
    ];
    Ok((trader, ideas))
}

/// Writes seed data through the repository traits.
pub struct Seeder {
    ideas: Arc<dyn IdeaRepository>,
    traders: Arc<dyn TraderRepository>,
    prices: Arc<dyn PriceRepository>,
    claims: ClaimsIssuer,
}

impl Seeder {
    pub fn new(
        ideas: Arc<dyn IdeaRepository>,
        traders: Arc<dyn TraderRepository>,
        prices: Arc<dyn PriceRepository>,
        claims: ClaimsIssuer,
    ) -> Self {
        Self {
            ideas,
            traders,
            prices,
            claims,
        }
    }

    /// Write demo data and scenario fixtures. Re-running overwrites the same
    /// documents.
    pub async fn run(&self) -> Result<SeedReport, SeedError> {
        let now = Utc::now();
        let data = generate(SEED, now)?;
        let (scenario_trader, scenario_ideas) = scenario_fixtures(now)?;

        let mut report = SeedReport::default();
        for trader in data.traders.iter().chain(std::iter::once(&scenario_trader)) {
            self.traders.upsert(trader).await?;
            report.traders += 1;
        }
        for idea in data.ideas.iter().chain(scenario_ideas.iter()) {
            self.ideas.upsert(idea).await?;
            report.ideas += 1;
        }
        for quote in &data.prices {
            self.prices.upsert(quote).await?;
            report.prices += 1;
        }

        self.claims
            .set_admin(SCENARIO_TRADER, false, PLATFORM_ACTOR)
            .await?;
        self.claims
            .set_admin(SCENARIO_ADMIN, true, PLATFORM_ACTOR)
            .await?;
        report.accounts = 2;

        info!(
            "✓ Seed complete: {} traders, {} ideas, {} prices, {} accounts",
            report.traders, report.ideas, report.prices, report.accounts
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::platform_repository::AccountRepository;
    use crate::persistence::memory::MemoryStore;

    #[test]
    fn test_generate_is_deterministic() {
        let now = Utc::now();
        let a = generate(SEED, now).unwrap();
        let b = generate(SEED, now).unwrap();
        let ids = |d: &SeedData| d.ideas.iter().map(|i| i.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(a.traders, b.traders);
        assert_eq!(a.traders.len(), TRADER_COUNT);
        assert_eq!(a.ideas.len(), IDEA_COUNT);
    }

    #[test]
    fn test_generated_ideas_pass_validation() {
        let data = generate(SEED, Utc::now()).unwrap();
        for idea in &data.ideas {
            assert!(idea.validate().is_ok(), "{} invalid", idea.id);
            let stop_pct = (idea.entry - idea.stop).abs() / idea.entry;
            assert!((0.049..=0.151).contains(&stop_pct), "{} stop {}", idea.id, stop_pct);
            if idea.status != IdeaStatus::Approved {
                assert_eq!(idea.visibility, Visibility::Private);
            }
        }
    }

    #[test]
    fn test_one_price_per_symbol() {
        let data = generate(SEED, Utc::now()).unwrap();
        let mut symbols: Vec<_> = data.ideas.iter().map(|i| i.symbols[0].clone()).collect();
        symbols.sort();
        symbols.dedup();
        assert_eq!(data.prices.len(), symbols.len());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Maja Berg-x7k2"), "maja-berg-x7k2");
        assert_eq!(slugify("  BTC / trader  "), "btc-trader");
    }

    #[tokio::test]
    async fn test_run_writes_fixtures_and_accounts() {
        let store = Arc::new(MemoryStore::new());
        let seeder = Seeder::new(
            store.clone(),
            store.clone(),
            store.clone(),
            ClaimsIssuer::new(store.clone(), store.clone()),
        );
        let report = seeder.run().await.unwrap();
        assert_eq!(report.traders, TRADER_COUNT + 1);
        assert_eq!(report.ideas, IDEA_COUNT + 3);
        assert_eq!(report.accounts, 2);

        let draft = IdeaRepository::get(store.as_ref(), "idea_draft_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(draft.status, IdeaStatus::Draft);
        assert!(AccountRepository::get(store.as_ref(), SCENARIO_ADMIN)
            .await
            .unwrap()
            .unwrap()
            .admin);
        assert!(!AccountRepository::get(store.as_ref(), SCENARIO_TRADER)
            .await
            .unwrap()
            .unwrap()
            .admin);
    }
}
