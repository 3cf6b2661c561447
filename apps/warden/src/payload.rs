//! # Snapshot & Decision Payloads
//!
//! This module defines the JSON structures the CLI reads and writes: the
//! snapshot file format (one project with its entities, memberships, and
//! content counts) and the decision report printed by `inspect`.

use serde::{Deserialize, Serialize};
use warden_core::{
    Capabilities, ContentCounts, EntityId, EntityKind, GovernedEntity, Membership, Phase, Project,
    ProjectId, ProjectType, Relation, RoleBits, UserRef, Viewer,
};

// =============================================================================
// SNAPSHOT FILE
// =============================================================================

/// One decision scenario: a project plus everything the engine may be asked
/// about. `seed` writes these records into a store; `inspect` decides over
/// them directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub project: ProjectRecord,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub memberships: Vec<MembershipRecord>,
    #[serde(default)]
    pub counts: CountsRecord,
}

impl SnapshotFile {
    /// Find an entity record by id.
    #[must_use]
    pub fn entity(&self, id: u64) -> Option<&EntityRecord> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// The membership record for a principal, if any.
    #[must_use]
    pub fn membership_for(&self, user: &UserRef) -> Option<Membership> {
        let project = ProjectId(self.project.id);
        self.memberships
            .iter()
            .map(|m| m.to_membership(project))
            .find(|m| warden_core::IdentityKey::matches(user, &m.user))
    }
}

/// Project record in a snapshot file.
///
/// `status` is the packed wire value; omitted means phase `new` with no
/// scope flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: u64,
    pub owner: String,
    pub kind: ProjectType,
    pub team_size: u32,
    #[serde(default)]
    pub status: Option<u32>,
}

impl ProjectRecord {
    /// Convert to a core project snapshot.
    #[must_use]
    pub fn to_project(&self) -> Project {
        let mut project = Project::new(
            ProjectId(self.id),
            UserRef::new(self.owner.as_str()),
            self.kind,
            self.team_size,
        );
        if let Some(status) = self.status {
            project.status = status;
        }
        project
    }
}

/// Entity record in a snapshot file. A `status` of 0 decodes as phase `new`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: u64,
    pub kind: EntityKind,
    pub creator: String,
    #[serde(default)]
    pub status: u32,
}

impl EntityRecord {
    /// Convert to a core entity snapshot within the given project.
    #[must_use]
    pub fn to_entity(&self, project: ProjectId) -> GovernedEntity {
        GovernedEntity::with_status(
            EntityId(self.id),
            self.kind,
            UserRef::new(self.creator.as_str()),
            project,
            self.status,
        )
    }
}

/// Membership record in a snapshot file. Roles use the bitflags wire form,
/// e.g. `"MEMBER"` or `"CREATOR | MEMBER"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub user: String,
    pub roles: RoleBits,
}

impl MembershipRecord {
    /// Convert to a core membership snapshot within the given project.
    #[must_use]
    pub fn to_membership(&self, project: ProjectId) -> Membership {
        Membership::new(UserRef::new(self.user.as_str()), project, self.roles)
    }
}

/// Content counts in a snapshot file. Every field defaults to zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CountsRecord {
    pub posts: u32,
    pub events: u32,
    pub members: u32,
    pub associations: u32,
    pub cover_images: u32,
}

impl CountsRecord {
    /// Convert to the engine's counts input.
    #[must_use]
    pub fn to_counts(&self) -> ContentCounts {
        ContentCounts {
            posts: self.posts,
            events: self.events,
            members: self.members,
            associations: self.associations,
            cover_images: self.cover_images,
        }
    }
}

// =============================================================================
// DECISION REPORT
// =============================================================================

/// Decision output for one `inspect` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionReport {
    pub viewer: String,
    pub relation: Relation,
    pub phase: Phase,
    pub scopes: Vec<String>,
    pub capabilities: Capabilities,
    pub transitions: Vec<Phase>,
}

// =============================================================================
// HELPERS
// =============================================================================

/// Build the viewer from a CLI principal reference.
#[must_use]
pub fn viewer_from(reference: &str, admin: bool) -> Viewer {
    let user = UserRef::new(reference);
    if admin {
        Viewer::admin(user)
    } else {
        Viewer::new(user)
    }
}
