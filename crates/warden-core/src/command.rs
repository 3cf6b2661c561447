//! # Transition Command
//!
//! The one write path of the engine: load snapshots, refuse stale
//! expectations, authorize the edge, and commit it with a compare-and-swap
//! on the packed status word. The caller states which status it believes the
//! entity has; if the store has moved on, the command reports the conflict
//! and the caller re-reads and retries.
//!
//! Denials and conflicts are outcomes, not errors. The error channel is
//! reserved for undecodable input and storage faults.

use serde::{Deserialize, Serialize};

use crate::service::CapabilityService;
use crate::status::Status;
use crate::storage::{SnapshotStore, SwapOutcome};
use crate::transition::DenialReason;
use crate::types::{ContentCounts, EntityId, Viewer, WardenError};

/// Outcome of one transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// The transition was committed; `stored` is the new status word.
    Applied {
        /// The status word now in the store.
        stored: u32,
    },
    /// The transition is not allowed.
    Denied(DenialReason),
    /// Someone else transitioned first; `actual` is the current word.
    Conflict {
        /// The status found in place of the expected one.
        actual: u32,
    },
}

/// Authorize and commit one phase change.
///
/// `expected_raw` is the status word the caller last read; if the store no
/// longer holds that word the command conflicts without authorizing, so a
/// stale caller is never judged against a state it did not claim.
/// `target_raw` is the full replacement word (scope bits may change alongside
/// the phase, but a scope-only rewrite is not a transition). `counts` is
/// consulted for project activation rules only.
pub fn apply_transition<S: SnapshotStore + ?Sized>(
    store: &S,
    service: &CapabilityService,
    viewer: &Viewer,
    entity_id: EntityId,
    expected_raw: u32,
    target_raw: u32,
    counts: &ContentCounts,
) -> Result<TransitionOutcome, WardenError> {
    let entity = store
        .entity(entity_id)?
        .ok_or(WardenError::EntityNotFound(entity_id))?;
    // A stale expectation conflicts before authorization; the swap below
    // re-checks it at commit time.
    if entity.status != expected_raw {
        return Ok(TransitionOutcome::Conflict {
            actual: entity.status,
        });
    }
    let project = store
        .project(entity.project)?
        .ok_or(WardenError::ProjectNotFound(entity.project))?;
    let membership = store.membership(&viewer.user, entity.project)?;

    let expected = Status::decode(expected_raw)?;
    let target = Status::decode(target_raw)?;
    if expected.phase == target.phase {
        return Ok(TransitionOutcome::Denied(DenialReason::InvalidEdge));
    }

    let decision = service.check_transition_for(
        viewer,
        Some(&entity),
        &project,
        membership.as_ref(),
        target.phase,
        counts,
    )?;
    if let Err(reason) = decision {
        return Ok(TransitionOutcome::Denied(reason));
    }

    match store.swap_status(entity_id, expected_raw, target_raw)? {
        SwapOutcome::Swapped => Ok(TransitionOutcome::Applied { stored: target_raw }),
        SwapOutcome::Conflict { actual } => Ok(TransitionOutcome::Conflict { actual }),
        SwapOutcome::Missing => Err(WardenError::EntityNotFound(entity_id)),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{Phase, ScopeFlags};
    use crate::storage::MemoryStore;
    use crate::types::{
        EntityKind, GovernedEntity, Membership, Project, ProjectId, ProjectType, RoleBits, UserRef,
    };

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .put_project(&Project::new(
                ProjectId(1),
                UserRef::new("owner@example.org"),
                ProjectType::Topic,
                5,
            ))
            .expect("put project");
        store
            .put_entity(&GovernedEntity::with_status(
                EntityId(10),
                EntityKind::Post,
                UserRef::new("ana@example.org"),
                ProjectId(1),
                Phase::Draft.threshold(),
            ))
            .expect("put entity");
        store
            .put_membership(&Membership::new(
                UserRef::new("ana@example.org"),
                ProjectId(1),
                RoleBits::MEMBER,
            ))
            .expect("put membership");
        store
    }

    #[test]
    fn author_submission_is_applied() {
        let store = seeded();
        let service = CapabilityService::new();
        let viewer = Viewer::new(UserRef::new("ana@example.org"));

        let outcome = apply_transition(
            &store,
            &service,
            &viewer,
            EntityId(10),
            Phase::Draft.threshold(),
            Phase::Review.threshold(),
            &ContentCounts::empty(),
        )
        .expect("command");
        assert_eq!(
            outcome,
            TransitionOutcome::Applied {
                stored: Phase::Review.threshold()
            }
        );
        let entity = store.entity(EntityId(10)).expect("read").expect("present");
        assert_eq!(entity.status, Phase::Review.threshold());
    }

    #[test]
    fn foreign_draft_submission_is_denied() {
        let store = seeded();
        store
            .put_membership(&Membership::new(
                UserRef::new("bo@example.org"),
                ProjectId(1),
                RoleBits::MEMBER,
            ))
            .expect("put membership");
        let service = CapabilityService::new();
        let viewer = Viewer::new(UserRef::new("bo@example.org"));

        let outcome = apply_transition(
            &store,
            &service,
            &viewer,
            EntityId(10),
            Phase::Draft.threshold(),
            Phase::Review.threshold(),
            &ContentCounts::empty(),
        )
        .expect("command");
        assert_eq!(
            outcome,
            TransitionOutcome::Denied(DenialReason::NotAllowedForRelation)
        );
        // Nothing moved.
        let entity = store.entity(EntityId(10)).expect("read").expect("present");
        assert_eq!(entity.status, Phase::Draft.threshold());
    }

    #[test]
    fn stale_expectation_is_a_conflict() {
        let store = seeded();
        let service = CapabilityService::new();
        let owner = Viewer::new(UserRef::new("owner@example.org"));

        let outcome = apply_transition(
            &store,
            &service,
            &owner,
            EntityId(10),
            Phase::Review.threshold(),
            Phase::Draft.threshold(),
            &ContentCounts::empty(),
        )
        .expect("command");
        assert_eq!(
            outcome,
            TransitionOutcome::Conflict {
                actual: Phase::Draft.threshold()
            }
        );
    }

    #[test]
    fn stale_claim_conflicts_before_authorization() {
        let store = seeded();
        store
            .swap_status(
                EntityId(10),
                Phase::Draft.threshold(),
                Phase::Confirmed.threshold(),
            )
            .expect("seed phase");
        let service = CapabilityService::new();
        let author = Viewer::new(UserRef::new("ana@example.org"));

        // Draft to review is a legal author edge, but the post has moved on;
        // the verdict must be the conflict, not a denial.
        let outcome = apply_transition(
            &store,
            &service,
            &author,
            EntityId(10),
            Phase::Draft.threshold(),
            Phase::Review.threshold(),
            &ContentCounts::empty(),
        )
        .expect("command");
        assert_eq!(
            outcome,
            TransitionOutcome::Conflict {
                actual: Phase::Confirmed.threshold()
            }
        );
        let entity = store.entity(EntityId(10)).expect("read").expect("present");
        assert_eq!(entity.status, Phase::Confirmed.threshold());
    }

    #[test]
    fn scope_only_rewrite_is_not_a_transition() {
        let store = seeded();
        let service = CapabilityService::new();
        let owner = Viewer::new(UserRef::new("owner@example.org"));

        let outcome = apply_transition(
            &store,
            &service,
            &owner,
            EntityId(10),
            Phase::Draft.threshold(),
            Phase::Draft.threshold() | ScopeFlags::PUBLIC.bits(),
            &ContentCounts::empty(),
        )
        .expect("command");
        assert_eq!(outcome, TransitionOutcome::Denied(DenialReason::InvalidEdge));
    }

    #[test]
    fn scope_bits_may_ride_along_with_a_phase_change() {
        let store = seeded();
        let service = CapabilityService::new();
        let viewer = Viewer::new(UserRef::new("ana@example.org"));
        let target = Phase::Review.threshold() | ScopeFlags::TEAM.bits();

        let outcome = apply_transition(
            &store,
            &service,
            &viewer,
            EntityId(10),
            Phase::Draft.threshold(),
            target,
            &ContentCounts::empty(),
        )
        .expect("command");
        assert_eq!(outcome, TransitionOutcome::Applied { stored: target });
    }

    #[test]
    fn unknown_entity_is_an_error() {
        let store = seeded();
        let service = CapabilityService::new();
        let viewer = Viewer::new(UserRef::new("ana@example.org"));

        let result = apply_transition(
            &store,
            &service,
            &viewer,
            EntityId(404),
            Phase::Draft.threshold(),
            Phase::Review.threshold(),
            &ContentCounts::empty(),
        );
        assert!(matches!(result, Err(WardenError::EntityNotFound(EntityId(404)))));
    }

    #[test]
    fn orphaned_entity_is_an_error() {
        let store = seeded();
        store
            .put_entity(&GovernedEntity::with_status(
                EntityId(11),
                EntityKind::Post,
                UserRef::new("ana@example.org"),
                ProjectId(9),
                Phase::Draft.threshold(),
            ))
            .expect("put entity");
        let service = CapabilityService::new();
        let viewer = Viewer::new(UserRef::new("ana@example.org"));

        let result = apply_transition(
            &store,
            &service,
            &viewer,
            EntityId(11),
            Phase::Draft.threshold(),
            Phase::Review.threshold(),
            &ContentCounts::empty(),
        );
        assert!(matches!(
            result,
            Err(WardenError::ProjectNotFound(ProjectId(9)))
        ));
    }

    #[test]
    fn undecodable_target_is_an_error() {
        let store = seeded();
        let service = CapabilityService::new();
        let viewer = Viewer::new(UserRef::new("ana@example.org"));

        let result = apply_transition(
            &store,
            &service,
            &viewer,
            EntityId(10),
            Phase::Draft.threshold(),
            Phase::Draft.threshold() | Phase::Review.threshold(),
            &ContentCounts::empty(),
        );
        assert!(matches!(
            result,
            Err(WardenError::InvalidStatusEncoding { .. })
        ));
    }

    #[test]
    fn admin_approves_like_the_owner() {
        let store = seeded();
        store
            .swap_status(
                EntityId(10),
                Phase::Draft.threshold(),
                Phase::Review.threshold(),
            )
            .expect("seed phase");
        let service = CapabilityService::new();
        let admin = Viewer::admin(UserRef::new("root@example.org"));

        let outcome = apply_transition(
            &store,
            &service,
            &admin,
            EntityId(10),
            Phase::Review.threshold(),
            Phase::Confirmed.threshold(),
            &ContentCounts::empty(),
        )
        .expect("command");
        assert_eq!(
            outcome,
            TransitionOutcome::Applied {
                stored: Phase::Confirmed.threshold()
            }
        );
    }

    #[test]
    fn project_head_transition_goes_through_activation() {
        let store = seeded();
        store
            .put_entity(&GovernedEntity::with_status(
                EntityId(1),
                EntityKind::Project,
                UserRef::new("owner@example.org"),
                ProjectId(1),
                Phase::New.threshold(),
            ))
            .expect("put entity");
        let service = CapabilityService::new();
        let owner = Viewer::new(UserRef::new("owner@example.org"));

        // Team of five is no small team; the skip to draft is refused.
        let skipped = apply_transition(
            &store,
            &service,
            &owner,
            EntityId(1),
            Phase::New.threshold(),
            Phase::Draft.threshold(),
            &ContentCounts::empty(),
        )
        .expect("command");
        assert_eq!(
            skipped,
            TransitionOutcome::Denied(DenialReason::CriteriaNotMet)
        );

        let demoed = apply_transition(
            &store,
            &service,
            &owner,
            EntityId(1),
            Phase::New.threshold(),
            Phase::Demo.threshold(),
            &ContentCounts::empty(),
        )
        .expect("command");
        assert_eq!(
            demoed,
            TransitionOutcome::Applied {
                stored: Phase::Demo.threshold()
            }
        );
        let project = store.project(ProjectId(1)).expect("read").expect("present");
        assert_eq!(project.status, Phase::Demo.threshold());
    }
}
