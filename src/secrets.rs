//! Token signing secret
//!
//! Loads the HS256 secret used to sign and verify session tokens. The secret
//! is held in a `Zeroizing<String>` so it is wiped from memory when dropped.
//!
//! Lookup order:
//! 1. `JWT_SECRET_FILE`: path to a file whose trimmed contents are the secret
//! 2. `JWT_SECRET`: the secret itself

use std::env;
use std::path::Path;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Minimum secret length (256 bits of entropy when random)
pub const MIN_SECRET_LENGTH: usize = 32;

/// Error type for secret loading operations
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret not configured: set {0}")]
    NotConfigured(String),

    #[error("Failed to read secret file {path}: {reason}")]
    FileUnreadable { path: String, reason: String },

    #[error("Secret validation failed: {0}")]
    ValidationFailed(String),
}

/// Load and validate the token signing secret from the environment.
pub fn load_signing_secret() -> Result<Zeroizing<String>, SecretError> {
    let secret = match env::var("JWT_SECRET_FILE") {
        Ok(path) => {
            let secret = load_from_file(Path::new(&path))?;
            info!("✓ Loaded token signing secret from {}", path);
            secret
        }
        Err(_) => {
            let secret = load_from_env("JWT_SECRET")?;
            warn!("Loading token signing secret from JWT_SECRET; prefer JWT_SECRET_FILE in production");
            secret
        }
    };

    validate_secret_strength(&secret, MIN_SECRET_LENGTH)?;
    Ok(secret)
}

fn load_from_file(path: &Path) -> Result<Zeroizing<String>, SecretError> {
    let raw = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
        SecretError::FileUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    })?);
    let secret = Zeroizing::new(raw.trim().to_string());
    if secret.is_empty() {
        return Err(SecretError::ValidationFailed(format!(
            "{} is empty",
            path.display()
        )));
    }
    Ok(secret)
}

/// Load a secret from environment variable (wrapped in Zeroizing)
fn load_from_env(env_var_name: &str) -> Result<Zeroizing<String>, SecretError> {
    env::var(env_var_name)
        .map(Zeroizing::new)
        .map_err(|_| SecretError::NotConfigured(env_var_name.to_string()))
}

/// Validate that a secret meets minimum security requirements
pub fn validate_secret_strength(secret: &str, min_length: usize) -> Result<(), SecretError> {
    if secret.len() < min_length {
        return Err(SecretError::ValidationFailed(format!(
            "Secret too short: {} characters (minimum: {})",
            secret.len(),
            min_length
        )));
    }

    // Check for obviously weak secrets
    let weak_patterns = ["secret", "password", "changeme", "example", "12345"];
    let secret_lower = secret.to_lowercase();

    for pattern in &weak_patterns {
        if secret_lower.contains(pattern) {
            return Err(SecretError::ValidationFailed(format!(
                "Secret contains weak pattern: {}",
                pattern
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_secret_strength() {
        assert!(validate_secret_strength("short", 32).is_err());
        assert!(validate_secret_strength("my_jwt_secret_abcdefghijklmnopqrstuv", 32).is_err());

        let strong_key = "q7Lm2xVb9RtK4wNc8ZpH3sJd6FgY1aEu";
        assert!(validate_secret_strength(strong_key, 32).is_ok());
    }

    #[test]
    fn test_load_from_file_trims_contents() {
        let path = env::temp_dir().join(format!("alpha_league_secret_{}", std::process::id()));
        std::fs::write(&path, "  q7Lm2xVb9RtK4wNc8ZpH3sJd6FgY1aEu\n").unwrap();
        let secret = load_from_file(&path).unwrap();
        assert_eq!(*secret, "q7Lm2xVb9RtK4wNc8ZpH3sJd6FgY1aEu");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = load_from_file(Path::new("/nonexistent/alpha_league/secret"));
        assert!(matches!(result, Err(SecretError::FileUnreadable { .. })));
    }

    #[test]
    fn test_load_from_env_missing() {
        let result = load_from_env("ALPHA_LEAGUE_NONEXISTENT_VAR");
        assert!(matches!(result, Err(SecretError::NotConfigured(_))));
    }
}
