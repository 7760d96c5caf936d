//! Persistence Layer
//!
//! SQLite storage for the league's collections, accessed asynchronously via sqlx.
//! [`memory::MemoryStore`] implements the same repository traits in process.
//!
//! # Database Schema
//!
//! ## ideas
//! - id: Document id (client chosen or generated)
//! - trader_id: Owning trader
//! - title, thesis: Text
//! - symbols, targets: JSON arrays
//! - side: "long" or "short"
//! - entry, stop, risk: Real
//! - status: "draft", "submitted", "approved", "rejected"
//! - visibility: "public" or "private"
//! - version: Integer, bumped by one on every write
//! - created_at, updated_at, approved_at: Timestamps
//!
//! ## traders
//! - id, handle, display_name, bio, avatar_url, status
//! - stats, links: JSON objects
//!
//! ## accounts
//! - uid: Principal id
//! - admin: Boolean claim
//!
//! ## audits
//! - id: Serial
//! - event_type: "claims.admin_set", "idea.reviewed", ...
//! - actor, subject: Who acted on what
//! - details: JSON details
//!
//! ## prices
//! - symbol: Primary key
//! - market: "CRYPTO" or "EQUITY"
//! - price, as_of, source

pub mod memory;
pub mod models;
pub mod repository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Database connection pool
pub type DbPool = SqlitePool;

/// Database initialization error
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),
}

/// Initialize the database connection pool and run migrations
///
/// An in-memory URL (`sqlite::memory:`) is limited to a single connection,
/// since every SQLite connection would otherwise open its own empty database.
///
/// # Errors
/// Returns error if the connection fails or a migration fails
pub async fn init_database(config: &DatabaseConfig) -> Result<DbPool, DatabaseError> {
    info!("Initializing database: {}", config.url);

    // Ensure data directory exists
    if let Some(db_path) = config.url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::ConnectionError(sqlx::Error::Configuration(Box::new(e)))
                })?;
            }
        }
    }

    let mut options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
    if !config.log_queries {
        options = options.disable_statement_logging();
    }

    let max_connections = if config.is_in_memory() {
        if config.max_connections > 1 {
            warn!(
                "In-memory database requested with {} connections, using 1",
                config.max_connections
            );
        }
        1
    } else {
        config.max_connections.max(1)
    };

    let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
    if config.is_in_memory() {
        // The database lives only as long as its connection.
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }
    let pool = pool_options.connect_with(options).await?;

    run_migrations(&pool).await?;

    info!("✓ Database initialized successfully");

    Ok(pool)
}

/// Run database migrations
async fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    info!("Running database migrations...");

    let tables: [(&str, &str); 5] = [
        (
            "ideas",
            r#"
            CREATE TABLE IF NOT EXISTS ideas (
                id TEXT PRIMARY KEY,
                trader_id TEXT NOT NULL,
                title TEXT NOT NULL,
                thesis TEXT NOT NULL DEFAULT '',
                symbols TEXT NOT NULL,
                side TEXT NOT NULL CHECK(side IN ('long', 'short')),
                entry REAL NOT NULL,
                targets TEXT NOT NULL,
                stop REAL NOT NULL,
                risk REAL NOT NULL DEFAULT 0.0,
                timeframe TEXT,
                status TEXT NOT NULL CHECK(status IN ('draft', 'submitted', 'approved', 'rejected')),
                visibility TEXT NOT NULL CHECK(visibility IN ('public', 'private')),
                version INTEGER NOT NULL DEFAULT 1,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                approved_by TEXT,
                approved_at DATETIME
            )
            "#,
        ),
        (
            "traders",
            r#"
            CREATE TABLE IF NOT EXISTS traders (
                id TEXT PRIMARY KEY,
                handle TEXT NOT NULL,
                display_name TEXT NOT NULL,
                bio TEXT NOT NULL DEFAULT '',
                avatar_url TEXT,
                status TEXT NOT NULL CHECK(status IN ('active', 'suspended')),
                created_at DATETIME NOT NULL,
                stats TEXT NOT NULL,
                links TEXT NOT NULL
            )
            "#,
        ),
        (
            "accounts",
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                uid TEXT PRIMARY KEY,
                admin BOOLEAN NOT NULL DEFAULT 0,
                updated_at DATETIME NOT NULL
            )
            "#,
        ),
        (
            "audits",
            r#"
            CREATE TABLE IF NOT EXISTS audits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                actor TEXT NOT NULL,
                subject TEXT NOT NULL,
                details TEXT NOT NULL,
                timestamp DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        ),
        (
            "prices",
            r#"
            CREATE TABLE IF NOT EXISTS prices (
                symbol TEXT PRIMARY KEY,
                market TEXT NOT NULL CHECK(market IN ('CRYPTO', 'EQUITY')),
                price REAL NOT NULL,
                as_of DATETIME NOT NULL,
                source TEXT NOT NULL
            )
            "#,
        ),
    ];

    for (name, ddl) in tables {
        sqlx::query(ddl).execute(pool).await.map_err(|e| {
            DatabaseError::MigrationError(format!("Failed to create {} table: {}", name, e))
        })?;
    }

    // Create indexes for the listing queries
    for ddl in [
        "CREATE INDEX IF NOT EXISTS idx_ideas_status ON ideas(status)",
        "CREATE INDEX IF NOT EXISTS idx_ideas_trader_id ON ideas(trader_id)",
        "CREATE INDEX IF NOT EXISTS idx_ideas_updated_at ON ideas(updated_at)",
        "CREATE INDEX IF NOT EXISTS idx_audits_timestamp ON audits(timestamp)",
    ] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;
    }

    info!("✓ Database migrations completed successfully");

    Ok(())
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://data/alpha_league.db")
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Enable query logging
    pub log_queries: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/alpha_league.db".to_string(),
            max_connections: 5,
            log_queries: cfg!(debug_assertions),
        }
    }
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            log_queries: false,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }

    /// Load from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let url = lookup("DATABASE_URL").unwrap_or(defaults.url);

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(value) if value > 0 => value,
                _ => {
                    warn!(
                        "Invalid DATABASE_MAX_CONNECTIONS '{}', using default: {}",
                        raw, defaults.max_connections
                    );
                    defaults.max_connections
                }
            },
            None => defaults.max_connections,
        };

        let log_queries = lookup("DATABASE_LOG_QUERIES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.log_queries);

        Self {
            url,
            max_connections,
            log_queries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_init() {
        let pool = init_database(&DatabaseConfig::in_memory()).await;
        assert!(pool.is_ok());
    }

    #[tokio::test]
    async fn test_migrations() {
        let pool = init_database(&DatabaseConfig::in_memory()).await.unwrap();

        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('ideas', 'traders', 'accounts', 'audits', 'prices')"
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(result.0, 5);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        assert!(run_migrations(&pool).await.is_ok());
    }

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.url, "sqlite://data/alpha_league.db");
        assert_eq!(config.max_connections, 5);
        assert!(!config.is_in_memory());
        assert!(DatabaseConfig::in_memory().is_in_memory());
    }

    #[test]
    fn test_database_config_from_lookup() {
        let config = DatabaseConfig::from_lookup(|name| match name {
            "DATABASE_URL" => Some("sqlite://tmp/league.db".to_string()),
            "DATABASE_MAX_CONNECTIONS" => Some("zero".to_string()),
            _ => None,
        });
        assert_eq!(config.url, "sqlite://tmp/league.db");
        assert_eq!(config.max_connections, 5);
    }
}
