//! Idea access and lifecycle policy.
//!
//! Pure decision logic: given a [`Principal`], an [`Operation`], the stored
//! document (if any) and the proposed document (for writes), decide whether the
//! operation may take effect. Nothing here touches storage, so every rule is
//! unit-testable in isolation.
//!
//! # Rules
//!
//! | Operation | Anonymous | Owner | Other user | Admin |
//! |-----------|-----------|-------|------------|-------|
//! | Read | public + approved | always | public + approved | always |
//! | List, `status == approved` | always | always | always | always |
//! | List, other filters | every candidate readable | same | same | always |
//! | Create | denied | `trader_id == uid`, draft/submitted | denied | `trader_id == uid` |
//! | Update | denied | unless stored status is approved | denied | always |
//! | Delete | denied | denied | denied | always |
//!
//! Status locks are evaluated against the *stored* document, so a single write
//! cannot both leave `approved` and edit the idea. `trader_id` never changes
//! after creation, whoever asks.
//!
//! A query pinned to `status == approved` is open to everyone. Its result may
//! include approved private ideas that a single-document read by the same
//! caller would refuse.
//!
//! Denials carry a [`DenyReason`] for logs only; callers must surface every
//! denial as the same access-denied error.

use crate::domain::entities::idea::{Idea, IdeaFilter, IdeaStatus};
use crate::domain::entities::principal::Principal;
use tracing::{debug, warn};

/// Operation attempted against the idea collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation<'a> {
    Read,
    List(&'a IdeaFilter),
    Create,
    Update,
    Delete,
}

impl Operation<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::List(_) => "list",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// Why a request was denied. Never shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Document is neither public+approved nor owned by the caller
    NotReadable,
    /// A candidate of a list query would not be readable
    QueryNotReadable,
    /// The target document does not exist and the caller is not an admin
    MissingDocument,
    Unauthenticated,
    /// Payload `trader_id` differs from the caller's uid
    OwnerMismatch,
    NotOwner,
    /// Stored document is approved; only admins may change it
    ApprovedLock,
    /// Owner tried to move the idea into an admin-only status
    StatusReserved,
    /// Payload tried to change the immutable `trader_id`
    IdentityChange,
    AdminOnly,
    /// Required document missing from the request (programming error upstream)
    MalformedRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Policy seam used by the idea store.
pub trait IdeaPolicy: Send + Sync {
    /// Decide a single-document operation.
    ///
    /// `existing` is the stored snapshot (`None` when absent), `proposed` the
    /// document that would be written (create/update only).
    fn evaluate(
        &self,
        principal: &Principal,
        operation: Operation<'_>,
        existing: Option<&Idea>,
        proposed: Option<&Idea>,
    ) -> Decision;

    /// Decide a query over its full candidate set.
    ///
    /// Queries pinned to `status == approved` are always allowed. Any other
    /// query is all-or-nothing: if a candidate would be unreadable the whole
    /// query is denied.
    fn evaluate_query(
        &self,
        principal: &Principal,
        filter: &IdeaFilter,
        candidates: &[Idea],
    ) -> Decision {
        let operation = Operation::List(filter);
        if filter.status == Some(IdeaStatus::Approved) {
            return log_decision(principal, operation, None, Decision::Allow);
        }
        for candidate in candidates {
            if !self.evaluate(principal, operation, Some(candidate), None).is_allowed() {
                return log_decision(
                    principal,
                    operation,
                    Some(&candidate.id),
                    Decision::Deny(DenyReason::QueryNotReadable),
                );
            }
        }
        Decision::Allow
    }
}

/// The Alpha League rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIdeaPolicy;

impl DefaultIdeaPolicy {
    fn can_read(principal: &Principal, idea: &Idea) -> Decision {
        if idea.is_publicly_readable() || principal.owns(&idea.trader_id) || principal.is_admin() {
            Decision::Allow
        } else {
            Decision::Deny(DenyReason::NotReadable)
        }
    }

    fn can_create(principal: &Principal, proposed: &Idea) -> Decision {
        if !principal.is_authenticated() {
            return Decision::Deny(DenyReason::Unauthenticated);
        }
        // Admins are held to the same ownership rule on create.
        if !principal.owns(&proposed.trader_id) {
            return Decision::Deny(DenyReason::OwnerMismatch);
        }
        if !principal.is_admin() && !proposed.status.is_owner_assignable() {
            return Decision::Deny(DenyReason::StatusReserved);
        }
        Decision::Allow
    }

    fn can_update(principal: &Principal, existing: &Idea, proposed: &Idea) -> Decision {
        if proposed.trader_id != existing.trader_id {
            return Decision::Deny(DenyReason::IdentityChange);
        }
        if principal.is_admin() {
            return Decision::Allow;
        }
        if !principal.owns(&existing.trader_id) {
            return Decision::Deny(DenyReason::NotOwner);
        }
        if existing.status == IdeaStatus::Approved {
            return Decision::Deny(DenyReason::ApprovedLock);
        }
        if proposed.status != existing.status && !proposed.status.is_owner_assignable() {
            return Decision::Deny(DenyReason::StatusReserved);
        }
        Decision::Allow
    }

    fn decide(
        principal: &Principal,
        operation: Operation<'_>,
        existing: Option<&Idea>,
        proposed: Option<&Idea>,
    ) -> Decision {
        match operation {
            Operation::Read | Operation::List(_) => match existing {
                Some(idea) => Self::can_read(principal, idea),
                None if principal.is_admin() => Decision::Allow,
                None => Decision::Deny(DenyReason::MissingDocument),
            },
            Operation::Create => match proposed {
                Some(idea) => Self::can_create(principal, idea),
                None => Decision::Deny(DenyReason::MalformedRequest),
            },
            Operation::Update => match (existing, proposed) {
                (Some(existing), Some(proposed)) => Self::can_update(principal, existing, proposed),
                (None, _) if principal.is_admin() => Decision::Allow,
                (None, _) => Decision::Deny(DenyReason::MissingDocument),
                (Some(_), None) => Decision::Deny(DenyReason::MalformedRequest),
            },
            Operation::Delete => {
                if principal.is_admin() {
                    Decision::Allow
                } else if existing.is_none() {
                    Decision::Deny(DenyReason::MissingDocument)
                } else {
                    Decision::Deny(DenyReason::AdminOnly)
                }
            }
        }
    }
}

impl IdeaPolicy for DefaultIdeaPolicy {
    fn evaluate(
        &self,
        principal: &Principal,
        operation: Operation<'_>,
        existing: Option<&Idea>,
        proposed: Option<&Idea>,
    ) -> Decision {
        let decision = Self::decide(principal, operation, existing, proposed);
        // Per-candidate list checks are summarised by evaluate_query.
        if matches!(operation, Operation::List(_)) {
            return decision;
        }
        let id = existing.or(proposed).map(|idea| idea.id.as_str());
        log_decision(principal, operation, id, decision)
    }
}

fn log_decision(
    principal: &Principal,
    operation: Operation<'_>,
    id: Option<&str>,
    decision: Decision,
) -> Decision {
    match decision {
        Decision::Allow => debug!(
            principal = %principal,
            operation = operation.name(),
            idea = id.unwrap_or("-"),
            "policy allowed"
        ),
        Decision::Deny(reason) => warn!(
            principal = %principal,
            operation = operation.name(),
            idea = id.unwrap_or("-"),
            reason = ?reason,
            "policy denied"
        ),
    }
    decision
}
