//! # Relation Resolution
//!
//! Maps a viewer to exactly one [`Relation`] per project, by descending
//! priority: owner, then the strongest membership role bit, then anonymous.
//!
//! Principal references arrive in two legacy encodings (numeric ids and
//! sysmail keys). [`IdentityKey::normalize`] is the single place where both
//! are collapsed into one canonical form; every identity comparison in the
//! crate goes through it.

use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::types::{GovernedEntity, Membership, Project, RoleBits, UserRef};

// =============================================================================
// IDENTITY KEY
// =============================================================================

/// Canonical principal key.
///
/// An all-digit reference is a numeric account id; everything else is a
/// sysmail key, compared case-insensitively with surrounding whitespace
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdentityKey {
    /// Numeric account id.
    Numeric(u64),
    /// Lowercased sysmail key.
    Sysmail(String),
}

impl IdentityKey {
    /// Normalize a raw principal reference into its canonical key.
    #[must_use]
    pub fn normalize(user: &UserRef) -> Self {
        let trimmed = user.as_str().trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = trimmed.parse::<u64>() {
                return IdentityKey::Numeric(id);
            }
        }
        IdentityKey::Sysmail(trimmed.to_ascii_lowercase())
    }

    /// Check whether two raw references denote the same principal.
    #[must_use]
    pub fn matches(a: &UserRef, b: &UserRef) -> bool {
        Self::normalize(a) == Self::normalize(b)
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityKey::Numeric(id) => write!(f, "n:{id}"),
            IdentityKey::Sysmail(key) => write!(f, "s:{key}"),
        }
    }
}

// =============================================================================
// RELATION
// =============================================================================

/// A viewer's relation to a project, strongest first.
///
/// Exactly one relation holds per (viewer, project) pair. The derived `Ord`
/// follows declaration order, so `Relation::Owner` is the minimum; use
/// [`Relation::rank`] when a "higher is stronger" number is needed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// The project owner.
    Owner,
    /// Creator role bit (project-level curation rights).
    Creator,
    /// Full member.
    Member,
    /// Participant without membership standing.
    Participant,
    /// External partner.
    Partner,
    /// No relation at all.
    Anonymous,
}

impl Relation {
    /// Get the relation name as used on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Relation::Owner => "owner",
            Relation::Creator => "creator",
            Relation::Member => "member",
            Relation::Participant => "participant",
            Relation::Partner => "partner",
            Relation::Anonymous => "anonymous",
        }
    }

    /// Numeric strength, higher is stronger. Anonymous is 0.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Relation::Owner => 5,
            Relation::Creator => 4,
            Relation::Member => 3,
            Relation::Participant => 2,
            Relation::Partner => 1,
            Relation::Anonymous => 0,
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Resolve the viewer's relation to a project.
///
/// Owner wins unconditionally. Otherwise the strongest role bit of a
/// membership decides; a membership snapshot for a different principal or a
/// different project is ignored.
#[must_use]
pub fn resolve_project_relation(
    viewer: &UserRef,
    project: &Project,
    membership: Option<&Membership>,
) -> Relation {
    if IdentityKey::matches(viewer, &project.owner) {
        return Relation::Owner;
    }

    let Some(membership) = membership else {
        return Relation::Anonymous;
    };
    if membership.project != project.id || !IdentityKey::matches(viewer, &membership.user) {
        return Relation::Anonymous;
    }

    if membership.roles.contains(RoleBits::CREATOR) {
        Relation::Creator
    } else if membership.roles.contains(RoleBits::MEMBER) {
        Relation::Member
    } else if membership.roles.contains(RoleBits::PARTICIPANT) {
        Relation::Participant
    } else if membership.roles.contains(RoleBits::PARTNER) {
        Relation::Partner
    } else {
        Relation::Anonymous
    }
}

/// Check whether the viewer created this entity.
///
/// Independent of the project relation; entity creatorship augments matrix
/// rows, it never replaces them.
#[must_use]
pub fn is_entity_creator(viewer: &UserRef, entity: &GovernedEntity) -> bool {
    IdentityKey::matches(viewer, &entity.creator)
}

// =============================================================================
// TESTS
// =============================================================================
