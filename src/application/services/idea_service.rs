//! Idea Store
//!
//! Every read and write of the `ideas` collection goes through here. The flow
//! for a write is always the same:
//!
//! 1. fetch the stored snapshot
//! 2. build the proposed document
//! 3. ask the policy
//! 4. validate content
//! 5. write with a compare-and-swap on the snapshot's version
//!
//! A lost race in step 5 surfaces as `Conflict`, never as a silent overwrite.

use crate::domain::entities::account::{AuditEntry, AuditEventType};
use crate::domain::entities::idea::{
    Idea, IdeaFilter, IdeaPatch, IdeaStatus, NewIdea, ReviewDecision,
};
use crate::domain::entities::principal::Principal;
use crate::domain::errors::{StoreError, ValidationError};
use crate::domain::repositories::idea_repository::{IdeaRepository, WriteOutcome};
use crate::domain::repositories::platform_repository::AuditRepository;
use crate::domain::services::policy::{Decision, DefaultIdeaPolicy, IdeaPolicy, Operation};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};

const GENERATED_ID_LENGTH: usize = 20;
const MAX_ID_LENGTH: usize = 128;

pub struct IdeaService {
    ideas: Arc<dyn IdeaRepository>,
    audits: Arc<dyn AuditRepository>,
    policy: Arc<dyn IdeaPolicy>,
}

impl IdeaService {
    pub fn new(ideas: Arc<dyn IdeaRepository>, audits: Arc<dyn AuditRepository>) -> Self {
        Self::with_policy(ideas, audits, Arc::new(DefaultIdeaPolicy))
    }

    pub fn with_policy(
        ideas: Arc<dyn IdeaRepository>,
        audits: Arc<dyn AuditRepository>,
        policy: Arc<dyn IdeaPolicy>,
    ) -> Self {
        Self {
            ideas,
            audits,
            policy,
        }
    }

    fn enforce(
        &self,
        principal: &Principal,
        operation: Operation<'_>,
        existing: Option<&Idea>,
        proposed: Option<&Idea>,
    ) -> Result<(), StoreError> {
        match self.policy.evaluate(principal, operation, existing, proposed) {
            Decision::Allow => Ok(()),
            Decision::Deny(_) => Err(StoreError::AccessDenied),
        }
    }

    pub async fn get(&self, principal: &Principal, id: &str) -> Result<Idea, StoreError> {
        let existing = self.ideas.get(id).await?;
        self.enforce(principal, Operation::Read, existing.as_ref(), None)?;
        existing.ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Run a query. Either every matching document is readable by
    /// `principal` and all are returned, or the query fails as a whole.
    pub async fn list(
        &self,
        principal: &Principal,
        filter: &IdeaFilter,
    ) -> Result<Vec<Idea>, StoreError> {
        let candidates = self.ideas.query(filter).await?;
        match self.policy.evaluate_query(principal, filter, &candidates) {
            Decision::Allow => Ok(candidates),
            Decision::Deny(_) => Err(StoreError::AccessDenied),
        }
    }

    pub async fn create(&self, principal: &Principal, new_idea: NewIdea) -> Result<Idea, StoreError> {
        let id = match &new_idea.id {
            Some(id) => {
                validate_id(id)?;
                id.clone()
            }
            None => generate_id(),
        };
        let proposed = Idea::from_new(id, new_idea, Utc::now());

        self.enforce(principal, Operation::Create, None, Some(&proposed))?;
        proposed.validate()?;

        match self.ideas.insert(&proposed).await? {
            WriteOutcome::Applied => {
                info!(
                    "Idea {} created by {} ({})",
                    proposed.id,
                    principal,
                    proposed.status
                );
                Ok(proposed)
            }
            WriteOutcome::Rejected => {
                // Only disclose the collision to callers who may see the stored idea.
                let stored = self.ideas.get(&proposed.id).await?;
                let readable = stored.as_ref().is_some_and(|s| {
                    self.policy
                        .evaluate(principal, Operation::Read, Some(s), None)
                        .is_allowed()
                });
                if readable {
                    Err(StoreError::Conflict(format!("idea {} already exists", proposed.id)))
                } else {
                    Err(StoreError::AccessDenied)
                }
            }
        }
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &str,
        patch: IdeaPatch,
    ) -> Result<Idea, StoreError> {
        let Some(existing) = self.ideas.get(id).await? else {
            self.enforce(principal, Operation::Update, None, None)?;
            return Err(StoreError::NotFound(id.to_string()));
        };

        let now = Utc::now();
        let mut proposed = existing.patched(&patch, now);
        let status_changed = proposed.status != existing.status;
        if status_changed {
            proposed.stamp_approval(principal.uid(), now);
        }
        self.enforce(principal, Operation::Update, Some(&existing), Some(&proposed))?;

        if let Some(expected) = patch.expected_version {
            if expected != existing.version {
                return Err(StoreError::Conflict(format!(
                    "idea {} is at version {}, expected {}",
                    id, existing.version, expected
                )));
            }
        }
        proposed.validate()?;

        self.replace(&proposed, existing.version).await?;
        if status_changed {
            let decision = match proposed.status {
                IdeaStatus::Approved => Some(ReviewDecision::Approve),
                IdeaStatus::Rejected => Some(ReviewDecision::Reject),
                _ => None,
            };
            if let Some(decision) = decision {
                self.audit_review(principal, &existing, &proposed, decision).await?;
            }
        }
        info!("Idea {} updated by {} to version {}", id, principal, proposed.version);
        Ok(proposed)
    }

    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<(), StoreError> {
        let existing = self.ideas.get(id).await?;
        self.enforce(principal, Operation::Delete, existing.as_ref(), None)?;
        let Some(existing) = existing else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        match self.ideas.delete(id, existing.version).await? {
            WriteOutcome::Applied => {}
            WriteOutcome::Rejected => {
                return Err(StoreError::Conflict(format!("idea {} changed concurrently", id)))
            }
        }

        self.audit(AuditEntry::new(
            AuditEventType::IdeaDeleted,
            principal.key(),
            id,
            serde_json::json!({
                "trader_id": existing.trader_id,
                "status": existing.status,
                "version": existing.version,
            }),
        ))
        .await?;
        info!("Idea {} deleted by {}", id, principal);
        Ok(())
    }

    /// Admin approve/reject action.
    ///
    /// Approval stamps `approved_by`/`approved_at`; rejection clears them.
    pub async fn review(
        &self,
        principal: &Principal,
        id: &str,
        decision: ReviewDecision,
    ) -> Result<Idea, StoreError> {
        let existing = self.ideas.get(id).await?;
        if !principal.is_admin() {
            warn!("Review of {} by non-admin {} denied", id, principal);
            return Err(StoreError::AccessDenied);
        }
        let Some(existing) = existing else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        let now = Utc::now();
        let mut proposed = existing.patched(&IdeaPatch::default(), now);
        proposed.status = match decision {
            ReviewDecision::Approve => IdeaStatus::Approved,
            ReviewDecision::Reject => IdeaStatus::Rejected,
        };
        proposed.stamp_approval(principal.uid(), now);
        self.enforce(principal, Operation::Update, Some(&existing), Some(&proposed))?;

        self.replace(&proposed, existing.version).await?;
        self.audit_review(principal, &existing, &proposed, decision).await?;
        info!("Idea {} reviewed by {}: {:?}", id, principal, decision);
        Ok(proposed)
    }

    async fn replace(&self, proposed: &Idea, expected_version: u64) -> Result<(), StoreError> {
        match self.ideas.replace(proposed, expected_version).await? {
            WriteOutcome::Applied => Ok(()),
            WriteOutcome::Rejected => Err(StoreError::Conflict(format!(
                "idea {} changed concurrently",
                proposed.id
            ))),
        }
    }

    async fn audit_review(
        &self,
        principal: &Principal,
        existing: &Idea,
        proposed: &Idea,
        decision: ReviewDecision,
    ) -> Result<(), StoreError> {
        self.audit(AuditEntry::new(
            AuditEventType::IdeaReviewed,
            principal.key(),
            &proposed.id,
            serde_json::json!({
                "decision": decision,
                "previous_status": existing.status,
                "version": proposed.version,
            }),
        ))
        .await
    }

    async fn audit(&self, entry: AuditEntry) -> Result<(), StoreError> {
        self.audits.append(&entry).await.map_err(StoreError::from)
    }
}

fn validate_id(id: &str) -> Result<(), ValidationError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_ID_LENGTH
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidId(id.to_string()))
    }
}

fn generate_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_ID_LENGTH)
        .map(char::from)
        .collect();
    format!("idea_{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::idea::{Side, Visibility};
    use crate::persistence::memory::MemoryStore;

    fn service() -> (IdeaService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (IdeaService::new(store.clone(), store.clone()), store)
    }

    fn new_idea(trader_id: &str, status: IdeaStatus) -> NewIdea {
        NewIdea {
            id: None,
            trader_id: trader_id.to_string(),
            title: "ETH reclaim".to_string(),
            thesis: "Weekly level reclaimed".to_string(),
            symbols: vec!["ETH-USD".to_string()],
            side: Side::Long,
            entry: 3000.0,
            targets: vec![3300.0, 3600.0],
            stop: 2850.0,
            risk: 5.0,
            timeframe: Some("1w".to_string()),
            status,
            visibility: Visibility::Public,
        }
    }

    fn olof() -> Principal {
        Principal::user("trader_olof")
    }

    fn alexa() -> Principal {
        Principal::admin("admin_alexa")
    }

    #[tokio::test]
    async fn test_create_generates_id_and_starts_at_version_one() {
        let (service, _) = service();
        let idea = service
            .create(&olof(), new_idea("trader_olof", IdeaStatus::Draft))
            .await
            .unwrap();
        assert!(idea.id.starts_with("idea_"));
        assert_eq!(idea.id.len(), "idea_".len() + GENERATED_ID_LENGTH);
        assert_eq!(idea.version, 1);
    }

    #[tokio::test]
    async fn test_create_for_someone_else_denied_even_for_admin() {
        let (service, _) = service();
        let err = service
            .create(&olof(), new_idea("someone_else", IdeaStatus::Draft))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::AccessDenied);
        let err = service
            .create(&alexa(), new_idea("trader_olof", IdeaStatus::Draft))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::AccessDenied);
    }

    #[tokio::test]
    async fn test_create_checks_policy_before_content() {
        let (service, _) = service();
        let mut invalid = new_idea("someone_else", IdeaStatus::Draft);
        invalid.stop = 5000.0;
        assert_eq!(
            service.create(&olof(), invalid.clone()).await.unwrap_err(),
            StoreError::AccessDenied
        );
        invalid.trader_id = "trader_olof".into();
        assert_eq!(
            service.create(&olof(), invalid).await.unwrap_err(),
            StoreError::Validation(ValidationError::LongLevelsOutOfOrder)
        );
    }

    #[tokio::test]
    async fn test_create_duplicate_id_discloses_only_to_readers() {
        let (service, _) = service();
        let mut draft = new_idea("trader_olof", IdeaStatus::Draft);
        draft.id = Some("idea_fixed".into());
        draft.visibility = Visibility::Private;
        service.create(&olof(), draft.clone()).await.unwrap();

        assert!(matches!(
            service.create(&olof(), draft.clone()).await,
            Err(StoreError::Conflict(_))
        ));

        let mut intruder = draft;
        intruder.trader_id = "trader_mira".into();
        assert_eq!(
            service
                .create(&Principal::user("trader_mira"), intruder)
                .await
                .unwrap_err(),
            StoreError::AccessDenied
        );
    }

    #[tokio::test]
    async fn test_create_rejects_bad_client_id() {
        let (service, _) = service();
        let mut idea = new_idea("trader_olof", IdeaStatus::Draft);
        idea.id = Some("../ideas".into());
        assert!(matches!(
            service.create(&olof(), idea).await,
            Err(StoreError::Validation(ValidationError::InvalidId(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_honours_expected_version() {
        let (service, _) = service();
        let idea = service
            .create(&olof(), new_idea("trader_olof", IdeaStatus::Draft))
            .await
            .unwrap();

        let updated = service
            .update(&olof(), &idea.id, IdeaPatch::thesis("Edited"))
            .await
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.thesis, "Edited");

        let stale = IdeaPatch {
            expected_version: Some(1),
            ..IdeaPatch::thesis("Stale")
        };
        assert!(matches!(
            service.update(&olof(), &idea.id, stale).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_of_missing_idea() {
        let (service, _) = service();
        assert_eq!(
            service
                .update(&olof(), "nope", IdeaPatch::thesis("x"))
                .await
                .unwrap_err(),
            StoreError::AccessDenied
        );
        assert_eq!(
            service
                .update(&alexa(), "nope", IdeaPatch::thesis("x"))
                .await
                .unwrap_err(),
            StoreError::NotFound("nope".into())
        );
    }

    #[tokio::test]
    async fn test_review_is_admin_only_and_stamps_approval() {
        let (service, store) = service();
        let idea = service
            .create(&olof(), new_idea("trader_olof", IdeaStatus::Submitted))
            .await
            .unwrap();

        assert_eq!(
            service
                .review(&olof(), &idea.id, ReviewDecision::Approve)
                .await
                .unwrap_err(),
            StoreError::AccessDenied
        );

        let approved = service
            .review(&alexa(), &idea.id, ReviewDecision::Approve)
            .await
            .unwrap();
        assert_eq!(approved.status, IdeaStatus::Approved);
        assert_eq!(approved.approved_by.as_deref(), Some("admin_alexa"));
        assert!(approved.approved_at.is_some());

        // Approved ideas are locked for the owner.
        assert_eq!(
            service
                .update(&olof(), &idea.id, IdeaPatch::thesis("Edit"))
                .await
                .unwrap_err(),
            StoreError::AccessDenied
        );

        let rejected = service
            .review(&alexa(), &idea.id, ReviewDecision::Reject)
            .await
            .unwrap();
        assert_eq!(rejected.status, IdeaStatus::Rejected);
        assert!(rejected.approved_by.is_none());

        let audits = store.recent(10).await.unwrap();
        assert_eq!(audits.len(), 2);
        assert!(audits
            .iter()
            .all(|a| a.event_type == AuditEventType::IdeaReviewed));
    }

    #[tokio::test]
    async fn test_admin_status_patch_stamps_approval() {
        let (service, store) = service();
        let idea = service
            .create(&olof(), new_idea("trader_olof", IdeaStatus::Submitted))
            .await
            .unwrap();

        let approved = service
            .update(&alexa(), &idea.id, IdeaPatch::status(IdeaStatus::Approved))
            .await
            .unwrap();
        assert_eq!(approved.approved_by.as_deref(), Some("admin_alexa"));
        assert!(approved.approved_at.is_some());

        let audits = store.recent(1).await.unwrap();
        assert_eq!(audits[0].event_type, AuditEventType::IdeaReviewed);
        assert_eq!(audits[0].details["decision"], "approve");

        // Edits that keep the status leave the stamp alone.
        let edited = service
            .update(&alexa(), &idea.id, IdeaPatch::thesis("Admin note"))
            .await
            .unwrap();
        assert_eq!(edited.approved_at, approved.approved_at);
    }

    #[tokio::test]
    async fn test_admin_status_patch_out_of_approved_clears_stamp() {
        let (service, store) = service();
        let idea = service
            .create(&olof(), new_idea("trader_olof", IdeaStatus::Submitted))
            .await
            .unwrap();
        service
            .review(&alexa(), &idea.id, ReviewDecision::Approve)
            .await
            .unwrap();

        let reopened = service
            .update(&alexa(), &idea.id, IdeaPatch::status(IdeaStatus::Draft))
            .await
            .unwrap();
        assert_eq!(reopened.status, IdeaStatus::Draft);
        assert!(reopened.approved_by.is_none());
        assert!(reopened.approved_at.is_none());

        // Reopening is an edit, not a review.
        assert_eq!(store.recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_admin_only_and_audited() {
        let (service, store) = service();
        let idea = service
            .create(&olof(), new_idea("trader_olof", IdeaStatus::Draft))
            .await
            .unwrap();

        assert_eq!(
            service.delete(&olof(), &idea.id).await.unwrap_err(),
            StoreError::AccessDenied
        );
        service.delete(&alexa(), &idea.id).await.unwrap();
        assert_eq!(
            service.delete(&alexa(), &idea.id).await.unwrap_err(),
            StoreError::NotFound(idea.id.clone())
        );

        let audits = store.recent(1).await.unwrap();
        assert_eq!(audits[0].event_type, AuditEventType::IdeaDeleted);
        assert_eq!(audits[0].actor, "admin_alexa");
    }

    #[tokio::test]
    async fn test_list_is_all_or_nothing() {
        let (service, _) = service();
        service
            .create(&olof(), new_idea("trader_olof", IdeaStatus::Draft))
            .await
            .unwrap();

        let anon = Principal::anonymous();
        assert_eq!(
            service.list(&anon, &IdeaFilter::default()).await.unwrap_err(),
            StoreError::AccessDenied
        );
        assert!(service
            .list(&anon, &IdeaFilter::approved())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            service
                .list(&olof(), &IdeaFilter::by_trader("trader_olof"))
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
