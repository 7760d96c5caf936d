use crate::persistence::DatabaseConfig;
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid bind address '{0}'")]
    InvalidBindAddress(String),
}

/// Service configuration
///
/// The token signing secret is not part of it; see [`crate::secrets`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub token_ttl_seconds: u64,    // Lifetime of issued session tokens
    pub rate_limit_per_minute: u32, // Per principal (all anonymous callers share one bucket)
    pub seed_on_start: bool,        // Seed fixtures when `serve` starts
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 3000,
            database: DatabaseConfig::default(),
            token_ttl_seconds: 3600,
            rate_limit_per_minute: 120,
            seed_on_start: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppConfig {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Invalid values are logged and replaced by their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppConfig {
        let mut config = AppConfig::default();
        config.database = DatabaseConfig::from_lookup(&lookup);

        if let Some(bind_addr) = lookup("BIND_ADDR") {
            if bind_addr.trim().is_empty() {
                tracing::warn!("Empty BIND_ADDR, using default: {}", config.bind_addr);
            } else {
                config.bind_addr = bind_addr.trim().to_string();
            }
        }

        if let Some(port) = lookup("PORT") {
            match port.parse::<u16>() {
                Ok(value) if value > 0 => config.port = value,
                _ => {
                    tracing::warn!("Invalid PORT '{}', using default: {}", port, config.port);
                }
            }
        }

        if let Some(ttl) = lookup("TOKEN_TTL_SECONDS") {
            match ttl.parse::<u64>() {
                Ok(value) if (60..=86_400).contains(&value) => {
                    config.token_ttl_seconds = value;
                }
                Ok(value) => {
                    tracing::warn!(
                        "Invalid TOKEN_TTL_SECONDS value: {} (must be between 60 and 86400), using default: {}",
                        value, config.token_ttl_seconds
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse TOKEN_TTL_SECONDS '{}': {}, using default: {}",
                        ttl,
                        e,
                        config.token_ttl_seconds
                    );
                }
            }
        }

        if let Some(limit) = lookup("RATE_LIMIT_PER_MINUTE") {
            match limit.parse::<u32>() {
                Ok(value) if (1..=10_000).contains(&value) => {
                    config.rate_limit_per_minute = value;
                }
                Ok(value) => {
                    tracing::warn!(
                        "Invalid RATE_LIMIT_PER_MINUTE value: {} (must be between 1 and 10000), using default: {}",
                        value, config.rate_limit_per_minute
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse RATE_LIMIT_PER_MINUTE '{}': {}, using default: {}",
                        limit,
                        e,
                        config.rate_limit_per_minute
                    );
                }
            }
        }

        if let Some(enabled) = lookup("SEED_ON_START") {
            config.seed_on_start = enabled.to_lowercase() == "true" || enabled == "1";
        }

        config
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.bind_addr, self.port);
        raw.parse().map_err(|_| ConfigError::InvalidBindAddress(raw))
    }
}
