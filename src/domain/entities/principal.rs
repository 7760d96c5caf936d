//! Principal Entity
//!
//! The actor attempting an operation. Derived per request from the session
//! credential and never persisted. The `admin` flag comes verbatim from the
//! signed token claims; it is never inferred from request content.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    uid: Option<String>,
    admin: bool,
}

impl Principal {
    /// An unauthenticated caller. Never an admin.
    pub fn anonymous() -> Self {
        Self {
            uid: None,
            admin: false,
        }
    }

    /// An authenticated account holder without the admin claim.
    pub fn user(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            admin: false,
        }
    }

    /// An authenticated account holder carrying the admin claim.
    pub fn admin(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            admin: true,
        }
    }

    pub fn from_claims(uid: impl Into<String>, admin: bool) -> Self {
        Self {
            uid: Some(uid.into()),
            admin,
        }
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn is_authenticated(&self) -> bool {
        self.uid.is_some()
    }

    /// True when this principal is the given trader.
    pub fn owns(&self, trader_id: &str) -> bool {
        self.uid.as_deref() == Some(trader_id)
    }

    /// Key used for per-caller bookkeeping such as rate limiting.
    pub fn key(&self) -> String {
        self.uid.clone().unwrap_or_else(|| "anonymous".to_string())
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.uid, self.admin) {
            (None, _) => write!(f, "anonymous"),
            (Some(uid), true) => write!(f, "{} (admin)", uid),
            (Some(uid), false) => write!(f, "{}", uid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_is_never_admin() {
        let p = Principal::anonymous();
        assert!(!p.is_admin());
        assert!(!p.is_authenticated());
        assert!(!p.owns(""));
        assert_eq!(p.key(), "anonymous");
    }

    #[test]
    fn test_owns_matches_uid_exactly() {
        let p = Principal::user("trader_olof");
        assert!(p.owns("trader_olof"));
        assert!(!p.owns("trader_olof2"));
        assert!(!p.is_admin());
    }

    #[test]
    fn test_display() {
        assert_eq!(Principal::admin("admin_alexa").to_string(), "admin_alexa (admin)");
        assert_eq!(Principal::anonymous().to_string(), "anonymous");
    }
}
