//! # Workflow Transitions (content kinds)
//!
//! Fixed directed graphs over [`Phase`] with edge-level authorization, one
//! per content kind. Posts and events share a graph with an editorial review
//! stage; images use a reduced graph without review. Project phase changes
//! are not handled here; they go through the activation engine.
//!
//! In the edge guards, "creator" always means the creator of the ENTITY, not
//! the project-level creator role. Authors drive their own drafts; the
//! project owner approves, rejects, publishes, and archives.

use serde::{Deserialize, Serialize};

use crate::relation::Relation;
use crate::status::Phase;
use crate::types::EntityKind;

/// Team sizes up to this value count as a small team and unlock the
/// draft-to-confirmed shortcut that bypasses review.
pub const SMALL_TEAM_MAX: u32 = 3;

// =============================================================================
// DENIAL REASONS
// =============================================================================

/// Why a requested transition is not allowed. A value, not an error; denial
/// is a normal outcome of asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// The edge exists but not for this viewer.
    NotAllowedForRelation,
    /// No such edge in the workflow graph (including self-loops).
    InvalidEdge,
    /// The edge exists for this viewer but its conditions are unmet.
    CriteriaNotMet,
}

impl DenialReason {
    /// Get the reason name as used on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DenialReason::NotAllowedForRelation => "not_allowed_for_relation",
            DenialReason::InvalidEdge => "invalid_edge",
            DenialReason::CriteriaNotMet => "criteria_not_met",
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// TRANSITION CONTEXT
// =============================================================================

/// Per-request facts that edge guards need beyond the relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TransitionContext {
    /// The viewer created the entity under decision.
    pub is_entity_creator: bool,
    /// Current team size of the owning project.
    pub team_size: u32,
}

impl TransitionContext {
    /// Build a context.
    #[must_use]
    pub const fn new(is_entity_creator: bool, team_size: u32) -> Self {
        Self {
            is_entity_creator,
            team_size,
        }
    }
}

// =============================================================================
// EDGE TABLES
// =============================================================================

/// Authorization condition on a workflow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    /// The entity creator or the project owner.
    CreatorOrOwner,
    /// The project owner alone.
    OwnerOnly,
    /// Creator or owner, and the team is small enough to skip review.
    SmallTeam,
}

impl Guard {
    fn check(self, relation: Relation, ctx: &TransitionContext) -> Result<(), DenialReason> {
        let creator_or_owner = ctx.is_entity_creator || relation == Relation::Owner;
        match self {
            Guard::CreatorOrOwner => {
                if creator_or_owner {
                    Ok(())
                } else {
                    Err(DenialReason::NotAllowedForRelation)
                }
            }
            Guard::OwnerOnly => {
                if relation == Relation::Owner {
                    Ok(())
                } else {
                    Err(DenialReason::NotAllowedForRelation)
                }
            }
            Guard::SmallTeam => {
                if !creator_or_owner {
                    Err(DenialReason::NotAllowedForRelation)
                } else if ctx.team_size > SMALL_TEAM_MAX {
                    Err(DenialReason::CriteriaNotMet)
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// One directed workflow edge.
#[derive(Debug, Clone, Copy)]
struct Edge {
    from: Phase,
    to: Phase,
    guard: Guard,
}

const fn edge(from: Phase, to: Phase, guard: Guard) -> Edge {
    Edge { from, to, guard }
}

/// Post and event workflow. Trash edges are implicit: every non-trash phase
/// may move to trash (creator or owner).
const POST_EDGES: &[Edge] = &[
    edge(Phase::New, Phase::Draft, Guard::CreatorOrOwner),
    edge(Phase::Draft, Phase::Review, Guard::CreatorOrOwner),
    edge(Phase::Draft, Phase::Confirmed, Guard::SmallTeam),
    edge(Phase::Review, Phase::Confirmed, Guard::OwnerOnly),
    edge(Phase::Review, Phase::Draft, Guard::OwnerOnly),
    edge(Phase::Confirmed, Phase::Released, Guard::OwnerOnly),
    edge(Phase::Released, Phase::Archived, Guard::OwnerOnly),
    edge(Phase::Trash, Phase::Draft, Guard::CreatorOrOwner),
];

/// Image workflow: no review stage and no team-size condition on
/// draft-to-confirmed.
const IMAGE_EDGES: &[Edge] = &[
    edge(Phase::New, Phase::Draft, Guard::CreatorOrOwner),
    edge(Phase::Draft, Phase::Confirmed, Guard::CreatorOrOwner),
    edge(Phase::Confirmed, Phase::Released, Guard::OwnerOnly),
    edge(Phase::Released, Phase::Archived, Guard::OwnerOnly),
    edge(Phase::Trash, Phase::Draft, Guard::CreatorOrOwner),
];

fn edges_for(kind: EntityKind) -> &'static [Edge] {
    match kind {
        EntityKind::Post | EntityKind::Event => POST_EDGES,
        EntityKind::Image => IMAGE_EDGES,
        // Project phases go through the activation engine; no edges here.
        EntityKind::Project => &[],
    }
}

// =============================================================================
// TRANSITION VALIDATOR
// =============================================================================

/// Pure edge checks over the content workflow graphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionValidator;

impl TransitionValidator {
    /// Create a validator handle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// All phases this viewer may move the entity to right now.
    ///
    /// Only edges whose guard passes are returned; the result never contains
    /// `from` itself. Trash comes last when reachable.
    #[must_use]
    pub fn legal_transitions(
        &self,
        kind: EntityKind,
        from: Phase,
        relation: Relation,
        ctx: &TransitionContext,
    ) -> Vec<Phase> {
        let mut targets = Vec::new();
        for edge in edges_for(kind) {
            if edge.from == from && edge.guard.check(relation, ctx).is_ok() {
                targets.push(edge.to);
            }
        }
        if from != Phase::Trash
            && !edges_for(kind).is_empty()
            && Guard::CreatorOrOwner.check(relation, ctx).is_ok()
        {
            targets.push(Phase::Trash);
        }
        targets
    }

    /// Check one edge. `Ok(())` means the transition may be committed.
    pub fn can_transition(
        &self,
        kind: EntityKind,
        from: Phase,
        to: Phase,
        relation: Relation,
        ctx: &TransitionContext,
    ) -> Result<(), DenialReason> {
        if from == to {
            return Err(DenialReason::InvalidEdge);
        }
        if edges_for(kind).is_empty() {
            return Err(DenialReason::InvalidEdge);
        }
        // Trash is reachable from every non-trash phase.
        if to == Phase::Trash {
            return Guard::CreatorOrOwner.check(relation, ctx);
        }
        match edges_for(kind)
            .iter()
            .find(|e| e.from == from && e.to == to)
        {
            Some(edge) => edge.guard.check(relation, ctx),
            None => Err(DenialReason::InvalidEdge),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    const V: TransitionValidator = TransitionValidator::new();

    fn author() -> TransitionContext {
        TransitionContext::new(true, 10)
    }

    fn bystander() -> TransitionContext {
        TransitionContext::new(false, 10)
    }

    #[test]
    fn author_submits_draft_for_review() {
        let result = V.can_transition(
            EntityKind::Post,
            Phase::Draft,
            Phase::Review,
            Relation::Member,
            &author(),
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn member_cannot_submit_someone_elses_draft() {
        let result = V.can_transition(
            EntityKind::Post,
            Phase::Draft,
            Phase::Review,
            Relation::Member,
            &bystander(),
        );
        assert_eq!(result, Err(DenialReason::NotAllowedForRelation));
    }

    #[test]
    fn creator_role_alone_does_not_drive_foreign_drafts() {
        let result = V.can_transition(
            EntityKind::Post,
            Phase::Draft,
            Phase::Review,
            Relation::Creator,
            &bystander(),
        );
        assert_eq!(result, Err(DenialReason::NotAllowedForRelation));
    }

    #[test]
    fn only_owner_approves_review() {
        let approve = |relation| {
            V.can_transition(
                EntityKind::Post,
                Phase::Review,
                Phase::Confirmed,
                relation,
                &author(),
            )
        };
        assert_eq!(approve(Relation::Owner), Ok(()));
        // Even the entity creator cannot approve their own submission.
        assert_eq!(
            approve(Relation::Member),
            Err(DenialReason::NotAllowedForRelation)
        );
        assert_eq!(
            approve(Relation::Creator),
            Err(DenialReason::NotAllowedForRelation)
        );
    }

    #[test]
    fn owner_rejects_back_to_draft() {
        let result = V.can_transition(
            EntityKind::Post,
            Phase::Review,
            Phase::Draft,
            Relation::Owner,
            &bystander(),
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn small_team_skips_review() {
        let small = TransitionContext::new(true, SMALL_TEAM_MAX);
        let result = V.can_transition(
            EntityKind::Post,
            Phase::Draft,
            Phase::Confirmed,
            Relation::Member,
            &small,
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn large_team_cannot_skip_review() {
        let large = TransitionContext::new(true, SMALL_TEAM_MAX + 1);
        let result = V.can_transition(
            EntityKind::Post,
            Phase::Draft,
            Phase::Confirmed,
            Relation::Member,
            &large,
        );
        assert_eq!(result, Err(DenialReason::CriteriaNotMet));
    }

    #[test]
    fn self_transition_is_an_invalid_edge() {
        for phase in Phase::iter() {
            let result = V.can_transition(
                EntityKind::Post,
                phase,
                phase,
                Relation::Owner,
                &author(),
            );
            assert_eq!(result, Err(DenialReason::InvalidEdge), "{phase}");
        }
    }

    #[test]
    fn unknown_edges_are_invalid() {
        let result = V.can_transition(
            EntityKind::Post,
            Phase::New,
            Phase::Released,
            Relation::Owner,
            &author(),
        );
        assert_eq!(result, Err(DenialReason::InvalidEdge));
    }

    #[test]
    fn trash_reachable_from_every_live_phase_for_the_creator() {
        for from in Phase::iter().filter(|p| *p != Phase::Trash) {
            let result = V.can_transition(
                EntityKind::Post,
                from,
                Phase::Trash,
                Relation::Member,
                &author(),
            );
            assert_eq!(result, Ok(()), "{from}");
        }
    }

    #[test]
    fn bystanders_cannot_trash() {
        let result = V.can_transition(
            EntityKind::Post,
            Phase::Draft,
            Phase::Trash,
            Relation::Member,
            &bystander(),
        );
        assert_eq!(result, Err(DenialReason::NotAllowedForRelation));
    }

    #[test]
    fn restore_from_trash_goes_to_draft() {
        let result = V.can_transition(
            EntityKind::Post,
            Phase::Trash,
            Phase::Draft,
            Relation::Owner,
            &bystander(),
        );
        assert_eq!(result, Ok(()));
        let sideways = V.can_transition(
            EntityKind::Post,
            Phase::Trash,
            Phase::Confirmed,
            Relation::Owner,
            &bystander(),
        );
        assert_eq!(sideways, Err(DenialReason::InvalidEdge));
    }

    #[test]
    fn images_have_no_review_stage() {
        let result = V.can_transition(
            EntityKind::Image,
            Phase::Draft,
            Phase::Review,
            Relation::Owner,
            &author(),
        );
        assert_eq!(result, Err(DenialReason::InvalidEdge));
    }

    #[test]
    fn image_draft_to_confirmed_ignores_team_size() {
        let huge = TransitionContext::new(true, 500);
        let result = V.can_transition(
            EntityKind::Image,
            Phase::Draft,
            Phase::Confirmed,
            Relation::Member,
            &huge,
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn legal_transitions_for_author_from_draft() {
        let small = TransitionContext::new(true, 2);
        let targets = V.legal_transitions(EntityKind::Post, Phase::Draft, Relation::Member, &small);
        assert_eq!(
            targets,
            vec![Phase::Review, Phase::Confirmed, Phase::Trash]
        );
    }

    #[test]
    fn legal_transitions_respect_team_size() {
        let targets =
            V.legal_transitions(EntityKind::Post, Phase::Draft, Relation::Member, &author());
        assert_eq!(targets, vec![Phase::Review, Phase::Trash]);
    }

    #[test]
    fn legal_transitions_never_contain_the_current_phase() {
        for kind in [EntityKind::Post, EntityKind::Event, EntityKind::Image] {
            for from in Phase::iter() {
                for relation in Relation::iter() {
                    let targets = V.legal_transitions(kind, from, relation, &author());
                    assert!(!targets.contains(&from), "{kind}/{from}/{relation}");
                }
            }
        }
    }

    #[test]
    fn anonymous_bystander_has_no_moves() {
        for from in Phase::iter() {
            let targets =
                V.legal_transitions(EntityKind::Post, from, Relation::Anonymous, &bystander());
            assert!(targets.is_empty(), "{from}");
        }
    }

    #[test]
    fn project_kind_has_no_edges_here() {
        assert_eq!(
            V.can_transition(
                EntityKind::Project,
                Phase::Draft,
                Phase::Confirmed,
                Relation::Owner,
                &author(),
            ),
            Err(DenialReason::InvalidEdge)
        );
        assert!(
            V.legal_transitions(EntityKind::Project, Phase::Draft, Relation::Owner, &author())
                .is_empty()
        );
    }
}
