//! # Project Activation
//!
//! Projects do not follow the content workflow graphs. Their phase changes
//! run through this engine, which combines a project-specific edge set with
//! readiness rules over live content counts. A project becomes confirmed
//! only once its kind-specific rules are met; small teams may skip the demo
//! and draft stages entirely.

use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::status::Phase;
use crate::transition::{DenialReason, SMALL_TEAM_MAX};
use crate::types::{ContentCounts, Project, ProjectType};

// =============================================================================
// ACTIVATION RULES
// =============================================================================

/// A single readiness condition checked against current content counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "kebab-case")]
pub enum ActivationRule {
    /// Topics need at least one post before going live.
    TopicHasPost,
    /// Event-carrying projects need at least one event.
    ProjectHasEvent,
    /// Regional hubs need at least one member besides the books.
    RegioHasMember,
    /// Regional hubs need at least one partner association.
    RegioHasAssociation,
    /// Every project needs a cover image.
    HasCoverImage,
}

impl ActivationRule {
    /// Get the rule name as used on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ActivationRule::TopicHasPost => "topic-has-post",
            ActivationRule::ProjectHasEvent => "project-has-event",
            ActivationRule::RegioHasMember => "regio-has-member",
            ActivationRule::RegioHasAssociation => "regio-has-association",
            ActivationRule::HasCoverImage => "has-cover-image",
        }
    }

    /// Whether this rule is satisfied by the given counts.
    #[must_use]
    pub const fn is_met(&self, counts: &ContentCounts) -> bool {
        match self {
            ActivationRule::TopicHasPost => counts.posts >= 1,
            ActivationRule::ProjectHasEvent => counts.events >= 1,
            ActivationRule::RegioHasMember => counts.members >= 1,
            ActivationRule::RegioHasAssociation => counts.associations >= 1,
            ActivationRule::HasCoverImage => counts.cover_images >= 1,
        }
    }
}

impl std::fmt::Display for ActivationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Rules a project of this kind must meet before draft-to-confirmed.
#[must_use]
pub const fn rules_for(kind: ProjectType) -> &'static [ActivationRule] {
    match kind {
        ProjectType::Topic => &[ActivationRule::TopicHasPost, ActivationRule::HasCoverImage],
        ProjectType::Project => &[
            ActivationRule::ProjectHasEvent,
            ActivationRule::HasCoverImage,
        ],
        ProjectType::Regio => &[
            ActivationRule::RegioHasMember,
            ActivationRule::RegioHasAssociation,
            ActivationRule::HasCoverImage,
        ],
        ProjectType::Special => &[ActivationRule::HasCoverImage],
    }
}

/// Outcome of evaluating all rules for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationReport {
    /// Every applicable rule is satisfied.
    pub all_met: bool,
    /// The rules that failed, in declaration order.
    pub failed: Vec<ActivationRule>,
}

// =============================================================================
// ACTIVATION ENGINE
// =============================================================================

/// Edge checks and readiness evaluation for project phase changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivationEngine;

impl ActivationEngine {
    /// Create an engine handle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluate all rules for the project against the given counts.
    #[must_use]
    pub fn evaluate(&self, project: &Project, counts: &ContentCounts) -> ActivationReport {
        let failed: Vec<ActivationRule> = rules_for(project.kind)
            .iter()
            .copied()
            .filter(|rule| !rule.is_met(counts))
            .collect();
        ActivationReport {
            all_met: failed.is_empty(),
            failed,
        }
    }

    /// All phases a project in `phase` may move to, before readiness checks.
    ///
    /// `can_skip` unlocks the small-team shortcuts out of new and demo.
    /// Readiness of draft-to-confirmed is the caller's concern; the edge is
    /// always listed here.
    #[must_use]
    pub fn allowed_targets(&self, phase: Phase, is_owner: bool, can_skip: bool) -> Vec<Phase> {
        let mut targets = Vec::new();
        match phase {
            Phase::New => {
                targets.push(Phase::Demo);
                if can_skip {
                    targets.push(Phase::Draft);
                    targets.push(Phase::Confirmed);
                }
            }
            Phase::Demo => {
                targets.push(Phase::Draft);
                if can_skip {
                    targets.push(Phase::Confirmed);
                }
            }
            Phase::Draft => {
                targets.push(Phase::Demo);
                targets.push(Phase::Confirmed);
            }
            Phase::Confirmed => {
                targets.push(Phase::Draft);
                targets.push(Phase::Released);
            }
            Phase::Released => {
                targets.push(Phase::Confirmed);
                if is_owner {
                    targets.push(Phase::Archived);
                }
            }
            Phase::Archived => {
                targets.push(Phase::Released);
            }
            // Review is not a project phase; trash is terminal.
            Phase::Review | Phase::Trash => {}
        }
        if is_owner && phase != Phase::Trash {
            targets.push(Phase::Trash);
        }
        targets
    }

    /// Check one project phase change. `Ok(())` means it may be committed.
    ///
    /// The caller has already established that the viewer holds a relation
    /// that may operate projects at all; `is_owner` narrows the owner-only
    /// edges.
    pub fn check_transition(
        &self,
        project: &Project,
        from: Phase,
        to: Phase,
        is_owner: bool,
        counts: &ContentCounts,
    ) -> Result<(), DenialReason> {
        if from == to {
            return Err(DenialReason::InvalidEdge);
        }
        let can_skip = project.team_size <= SMALL_TEAM_MAX;
        match (from, to) {
            // Trashing a project is final and the owner's call alone.
            (f, Phase::Trash) if f != Phase::Trash => {
                if is_owner {
                    Ok(())
                } else {
                    Err(DenialReason::NotAllowedForRelation)
                }
            }
            (Phase::Trash, _) => Err(DenialReason::InvalidEdge),
            (Phase::New, Phase::Demo)
            | (Phase::Demo, Phase::Draft)
            | (Phase::Draft, Phase::Demo) => Ok(()),
            (Phase::New, Phase::Draft)
            | (Phase::New, Phase::Confirmed)
            | (Phase::Demo, Phase::Confirmed) => {
                if can_skip {
                    Ok(())
                } else {
                    Err(DenialReason::CriteriaNotMet)
                }
            }
            (Phase::Draft, Phase::Confirmed) => {
                if self.evaluate(project, counts).all_met {
                    Ok(())
                } else {
                    Err(DenialReason::CriteriaNotMet)
                }
            }
            (Phase::Confirmed, Phase::Draft)
            | (Phase::Confirmed, Phase::Released)
            | (Phase::Released, Phase::Confirmed)
            | (Phase::Archived, Phase::Released) => Ok(()),
            (Phase::Released, Phase::Archived) => {
                if is_owner {
                    Ok(())
                } else {
                    Err(DenialReason::NotAllowedForRelation)
                }
            }
            _ => Err(DenialReason::InvalidEdge),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
