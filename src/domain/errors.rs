use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the idea store and trader directory.
///
/// `AccessDenied` is deliberately uniform: it is returned both when a
/// principal lacks permission and when a protected document does not exist,
/// so callers cannot learn whether a document exists.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum StoreError {
    #[error("permission denied")]
    AccessDenied,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Stable machine-readable code, mirrored in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::AccessDenied => "permission-denied",
            StoreError::NotFound(_) => "not-found",
            StoreError::Validation(_) => "invalid-argument",
            StoreError::Conflict(_) => "conflict",
            StoreError::Backend(_) => "internal",
        }
    }
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        StoreError::Backend(error.to_string())
    }
}

/// Failures of a persistence backend, independent of policy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Invalid document id: {0}")]
    InvalidId(String),

    #[error("{field} is required")]
    MissingField { field: String },

    #[error("{field} must be a finite number, got '{value}'")]
    NotANumber { field: String, value: String },

    #[error("At least one target is required")]
    NoTargets,

    #[error("Long idea requires stop < entry < every target")]
    LongLevelsOutOfOrder,

    #[error("Short idea requires stop > entry > every target")]
    ShortLevelsOutOfOrder,

    #[error("Skin-in-the-game acknowledgement is required")]
    CommitmentNotAcknowledged,

    #[error("Unknown value '{value}' for {field}")]
    UnknownVariant { field: String, value: String },

    #[error("Value must be finite")]
    MustBeFinite,
}

impl From<ValidationError> for String {
    fn from(error: ValidationError) -> Self {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_codes() {
        assert_eq!(StoreError::AccessDenied.code(), "permission-denied");
        assert_eq!(StoreError::NotFound("x".into()).code(), "not-found");
        assert_eq!(
            StoreError::Validation(ValidationError::NoTargets).code(),
            "invalid-argument"
        );
        assert_eq!(StoreError::Conflict("v".into()).code(), "conflict");
        assert_eq!(StoreError::Backend("db".into()).code(), "internal");
    }

    #[test]
    fn test_access_denied_message_does_not_leak_identifiers() {
        assert_eq!(StoreError::AccessDenied.to_string(), "permission denied");
    }

    #[test]
    fn test_repository_error_maps_to_backend() {
        let err: StoreError = RepositoryError::Backend("disk full".into()).into();
        assert!(matches!(err, StoreError::Backend(msg) if msg.contains("disk full")));
    }
}
