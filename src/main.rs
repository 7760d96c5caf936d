use alpha_league::application::handlers::router;
use alpha_league::application::services::claims_service::{ClaimsIssuer, PLATFORM_ACTOR};
use alpha_league::application::services::idea_service::IdeaService;
use alpha_league::application::services::trader_service::TraderService;
use alpha_league::application::state::AppState;
use alpha_league::auth::IdentityResolver;
use alpha_league::config::AppConfig;
use alpha_league::persistence::repository::{
    SqliteAccountRepository, SqliteAuditRepository, SqliteIdeaRepository, SqlitePriceRepository,
    SqliteTraderRepository,
};
use alpha_league::persistence::{init_database, DbPool};
use alpha_league::rate_limit::{create_rate_limiter, RateLimiterConfig};
use alpha_league::secrets::load_signing_secret;
use alpha_league::seed::Seeder;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "alpha-league",
    about = "Trade idea service with owner/admin access rules"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,

    /// Write demo traders, ideas, prices and the scenario fixtures.
    Seed,

    /// Set the admin claim for a uid.
    GrantAdmin {
        uid: String,

        /// Clear the claim instead of setting it.
        #[arg(long)]
        revoke: bool,
    },

    /// Print a session token for a uid.
    IssueToken { uid: String },
}

/// SQLite-backed repositories over one pool.
struct Stores {
    ideas: Arc<SqliteIdeaRepository>,
    traders: Arc<SqliteTraderRepository>,
    accounts: Arc<SqliteAccountRepository>,
    audits: Arc<SqliteAuditRepository>,
    prices: Arc<SqlitePriceRepository>,
}

impl Stores {
    fn new(pool: DbPool) -> Self {
        Self {
            ideas: Arc::new(SqliteIdeaRepository::new(pool.clone())),
            traders: Arc::new(SqliteTraderRepository::new(pool.clone())),
            accounts: Arc::new(SqliteAccountRepository::new(pool.clone())),
            audits: Arc::new(SqliteAuditRepository::new(pool.clone())),
            prices: Arc::new(SqlitePriceRepository::new(pool)),
        }
    }

    fn claims(&self) -> ClaimsIssuer {
        ClaimsIssuer::new(self.accounts.clone(), self.audits.clone())
    }

    fn seeder(&self) -> Seeder {
        Seeder::new(
            self.ideas.clone(),
            self.traders.clone(),
            self.prices.clone(),
            self.claims(),
        )
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alpha_league=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let pool = init_database(&config.database).await?;
    let stores = Stores::new(pool);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, stores).await?,
        Command::Seed => {
            let report = stores.seeder().run().await?;
            println!(
                "Seeded {} traders, {} ideas, {} prices, {} accounts",
                report.traders, report.ideas, report.prices, report.accounts
            );
        }
        Command::GrantAdmin { uid, revoke } => {
            let account = stores.claims().set_admin(&uid, !revoke, PLATFORM_ACTOR).await?;
            println!("{} admin={}", account.uid, account.admin);
        }
        Command::IssueToken { uid } => {
            let secret = load_signing_secret()?;
            let resolver = IdentityResolver::new(&secret, config.token_ttl_seconds);
            let token = stores
                .claims()
                .issue_token(&resolver, &uid, PLATFORM_ACTOR)
                .await?;
            println!("{}", token);
        }
    }

    Ok(())
}

async fn serve(config: AppConfig, stores: Stores) -> Result<(), Box<dyn std::error::Error>> {
    info!("Alpha League idea service starting...");

    let secret = load_signing_secret()?;
    let resolver = Arc::new(IdentityResolver::new(&secret, config.token_ttl_seconds));
    drop(secret);

    if config.seed_on_start {
        let report = stores.seeder().run().await?;
        info!("Seeded on start: {} ideas", report.ideas);
    }

    let state = AppState {
        ideas: Arc::new(IdeaService::new(stores.ideas.clone(), stores.audits.clone())),
        traders: Arc::new(TraderService::new(stores.traders.clone())),
        resolver,
        rate_limiter: create_rate_limiter(RateLimiterConfig {
            requests_per_minute: config.rate_limit_per_minute,
        }),
    };

    let addr = config.socket_addr()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, router(state));

    let shutdown_signal = async move {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal"),
                Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("Received SIGTERM signal");
                }
                Err(e) => error!("Failed to install SIGTERM handler: {}", e),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    };

    info!("Server started successfully. Press Ctrl+C to stop.");
    server.with_graceful_shutdown(shutdown_signal).await?;

    info!("Shutdown complete");
    Ok(())
}
