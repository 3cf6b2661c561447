//! # Capability Service
//!
//! The decision facade. It wires relation resolution, status decoding, the
//! capability matrix, the workflow validators, and an optional shared row
//! cache into the three questions callers ask:
//!
//! - what may this viewer do with this entity right now,
//! - which phases may they move it to,
//! - may they move it to this one phase.
//!
//! The service holds no mutable state of its own and is freely shareable
//! across threads. All inputs arrive as snapshots; the service never goes
//! looking for data.

use std::sync::Arc;

use crate::activation::ActivationEngine;
use crate::cache::{CacheKey, CapabilityCache};
use crate::matrix::{Capabilities, CapabilityMatrix, apply_creator_override};
use crate::relation::{Relation, is_entity_creator, resolve_project_relation};
use crate::status::{Phase, Status};
use crate::transition::{DenialReason, SMALL_TEAM_MAX, TransitionContext, TransitionValidator};
use crate::types::{
    ContentCounts, EntityKind, GovernedEntity, Membership, Project, Viewer, WardenError,
};

/// Stateless decision engine over snapshot inputs.
#[derive(Debug, Default)]
pub struct CapabilityService {
    matrix: CapabilityMatrix,
    validator: TransitionValidator,
    activation: ActivationEngine,
    cache: Option<Arc<CapabilityCache>>,
}

impl CapabilityService {
    /// Create a service without a row cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            matrix: CapabilityMatrix::new(),
            validator: TransitionValidator::new(),
            activation: ActivationEngine::new(),
            cache: None,
        }
    }

    /// Create a service backed by a shared row cache.
    #[must_use]
    pub fn with_cache(cache: Arc<CapabilityCache>) -> Self {
        Self {
            matrix: CapabilityMatrix::new(),
            validator: TransitionValidator::new(),
            activation: ActivationEngine::new(),
            cache: Some(cache),
        }
    }

    /// The relation the viewer holds towards the project. Admins decide as
    /// the owner everywhere.
    #[must_use]
    pub fn relation_for(
        &self,
        viewer: &Viewer,
        project: &Project,
        membership: Option<&Membership>,
    ) -> Relation {
        if viewer.is_admin {
            Relation::Owner
        } else {
            resolve_project_relation(&viewer.user, project, membership)
        }
    }

    fn matrix_row(
        &self,
        kind: EntityKind,
        phase: Phase,
        relation: Relation,
    ) -> Result<Capabilities, WardenError> {
        let key = CacheKey::new(kind, phase, relation);
        if let Some(cache) = &self.cache {
            if let Some(row) = cache.lookup(key) {
                return Ok(row);
            }
        }
        // Misses are structured errors and are never cached.
        let row = self.matrix.lookup(kind, phase, relation)?;
        if let Some(cache) = &self.cache {
            cache.store(key, row);
        }
        Ok(row)
    }

    /// Decide the viewer's capabilities for one entity, or for the project
    /// itself when `entity` is `None`.
    ///
    /// The creator override is applied after the cached matrix row, so the
    /// cache stays per-relation.
    pub fn capabilities_for(
        &self,
        viewer: &Viewer,
        entity: Option<&GovernedEntity>,
        project: &Project,
        membership: Option<&Membership>,
    ) -> Result<Capabilities, WardenError> {
        let raw = entity.map_or(project.status, |e| e.status);
        let phase = Status::decode_phase(raw)?;
        let kind = entity.map_or(EntityKind::Project, |e| e.kind);
        let relation = self.relation_for(viewer, project, membership);

        let row = self.matrix_row(kind, phase, relation)?;
        let is_creator = entity.is_some_and(|e| is_entity_creator(&viewer.user, e));
        Ok(apply_creator_override(row, is_creator, phase))
    }

    /// All phases the viewer may move the entity (or project) to right now.
    ///
    /// For projects, the list is already filtered by readiness: a draft
    /// project that fails its activation rules does not offer confirmed.
    pub fn legal_transitions_for(
        &self,
        viewer: &Viewer,
        entity: Option<&GovernedEntity>,
        project: &Project,
        membership: Option<&Membership>,
        counts: &ContentCounts,
    ) -> Result<Vec<Phase>, WardenError> {
        let relation = self.relation_for(viewer, project, membership);

        match entity {
            Some(entity) if entity.kind != EntityKind::Project => {
                let phase = Status::decode_phase(entity.status)?;
                let ctx = TransitionContext::new(
                    is_entity_creator(&viewer.user, entity),
                    project.team_size,
                );
                Ok(self
                    .validator
                    .legal_transitions(entity.kind, phase, relation, &ctx))
            }
            entity => {
                let from = Status::decode_phase(entity.map_or(project.status, |e| e.status))?;
                Ok(self.project_transitions(relation, from, project, counts))
            }
        }
    }

    fn project_transitions(
        &self,
        relation: Relation,
        from: Phase,
        project: &Project,
        counts: &ContentCounts,
    ) -> Vec<Phase> {
        // Only the owner and creator-role members operate project phases.
        if !matches!(relation, Relation::Owner | Relation::Creator) {
            return Vec::new();
        }
        let is_owner = relation == Relation::Owner;
        let can_skip = project.team_size <= SMALL_TEAM_MAX;
        let mut targets = self.activation.allowed_targets(from, is_owner, can_skip);
        if from == Phase::Draft && !self.activation.evaluate(project, counts).all_met {
            targets.retain(|t| *t != Phase::Confirmed);
        }
        targets
    }

    /// Check one requested phase change.
    ///
    /// The outer `Result` carries infrastructure faults; the inner one is the
    /// decision itself, with `Err` holding the denial.
    pub fn check_transition_for(
        &self,
        viewer: &Viewer,
        entity: Option<&GovernedEntity>,
        project: &Project,
        membership: Option<&Membership>,
        target: Phase,
        counts: &ContentCounts,
    ) -> Result<Result<(), DenialReason>, WardenError> {
        let relation = self.relation_for(viewer, project, membership);

        match entity {
            Some(entity) if entity.kind != EntityKind::Project => {
                let from = Status::decode_phase(entity.status)?;
                let ctx = TransitionContext::new(
                    is_entity_creator(&viewer.user, entity),
                    project.team_size,
                );
                Ok(self
                    .validator
                    .can_transition(entity.kind, from, target, relation, &ctx))
            }
            entity => {
                let from = Status::decode_phase(entity.map_or(project.status, |e| e.status))?;
                if !matches!(relation, Relation::Owner | Relation::Creator) {
                    return Ok(Err(DenialReason::NotAllowedForRelation));
                }
                let is_owner = relation == Relation::Owner;
                Ok(self
                    .activation
                    .check_transition(project, from, target, is_owner, counts))
            }
        }
    }

    /// The cache handle, when one is attached.
    #[must_use]
    pub fn cache(&self) -> Option<&Arc<CapabilityCache>> {
        self.cache.as_ref()
    }
}

// =============================================================================
// TESTS
// =============================================================================
