//! # Core Type Definitions
//!
//! This module contains the snapshot types the decision engine consumes:
//! - Identifiers (`EntityId`, `ProjectId`) and principal references (`UserRef`)
//! - Entity kinds and project types (`EntityKind`, `ProjectType`)
//! - Snapshot records (`GovernedEntity`, `Project`, `Membership`, `Viewer`)
//! - Membership role bits (`RoleBits`)
//! - Activation inputs (`ContentCounts`)
//! - Error types (`WardenError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they key `BTreeMap`/`BTreeSet` collections
//! - Carry raw status as a plain `u32`; only the status codec interprets it

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};
use thiserror::Error;

use crate::relation::Relation;
use crate::status::Phase;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier for a governed entity (post, event, image, or the
/// governed head record of a project).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Unique identifier for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub u64);

/// Reference to a principal as stored in snapshots.
///
/// The wire value is one of two legacy encodings: an all-digit numeric id or
/// a sysmail-style key. Never compare `UserRef`s directly; go through
/// [`crate::relation::IdentityKey::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserRef(pub String);

impl UserRef {
    /// Create a new principal reference from a raw string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the raw reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ENTITY KINDS & PROJECT TYPES
// =============================================================================

/// The kind of a governed entity. Each kind has its own workflow graph and
/// its own capability rows.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    /// Written contributions (articles, updates).
    Post,
    /// Scheduled happenings.
    Event,
    /// Media attachments; no editorial review stage.
    Image,
    /// The project itself as a governed record.
    Project,
}

impl EntityKind {
    /// Get the kind name as used on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Post => "post",
            EntityKind::Event => "event",
            EntityKind::Image => "image",
            EntityKind::Project => "project",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Project typology. Immutable after creation; selects the activation rule
/// set a project must satisfy to advance out of draft.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProjectType {
    /// Discussion topic; activates with at least one post.
    Topic,
    /// Undertaking with a timeline; activates with at least one event.
    Project,
    /// Regional hub; activates with members and an associated project.
    Regio,
    /// Curated special form; only the common criteria apply.
    Special,
}

impl ProjectType {
    /// Get the type name as used on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ProjectType::Topic => "topic",
            ProjectType::Project => "project",
            ProjectType::Regio => "regio",
            ProjectType::Special => "special",
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// ROLE BITS
// =============================================================================

bitflags! {
    /// Membership role bits as stored on membership records.
    ///
    /// Multiple bits may be set at once; relation resolution picks the
    /// highest-priority bit. Bits outside the named set are legacy noise and
    /// are dropped on decode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RoleBits: u32 {
        /// External partner organisation.
        const PARTNER     = 1 << 1;
        /// Active participant without membership standing.
        const PARTICIPANT = 1 << 2;
        /// Full project member.
        const MEMBER      = 1 << 3;
        /// Project-level creator role (content curation rights).
        const CREATOR     = 1 << 4;
    }
}

impl RoleBits {
    /// Decode raw role bits, dropping unknown bits.
    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        Self::from_bits_truncate(raw)
    }

    /// Returns a human-readable list of role names, strongest first.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::CREATOR) {
            names.push("creator");
        }
        if self.contains(Self::MEMBER) {
            names.push("member");
        }
        if self.contains(Self::PARTICIPANT) {
            names.push("participant");
        }
        if self.contains(Self::PARTNER) {
            names.push("partner");
        }
        names
    }
}

impl std::fmt::Display for RoleBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.names();
        if names.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

// =============================================================================
// SNAPSHOT RECORDS
// =============================================================================

/// A governed entity snapshot.
///
/// Entities are created at phase `new` and are never deleted; trash is a
/// workflow phase, not removal. The `status` field is the packed wire value
/// (phase threshold ORed with scope flags); only the status codec reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernedEntity {
    /// The entity identifier.
    pub id: EntityId,
    /// The entity kind.
    pub kind: EntityKind,
    /// The principal who created this entity.
    pub creator: UserRef,
    /// Packed status: phase threshold | scope flags.
    pub status: u32,
    /// The project this entity belongs to.
    pub project: ProjectId,
}

impl GovernedEntity {
    /// Create a new entity snapshot at phase `new` with no scope flags.
    #[must_use]
    pub fn new(id: EntityId, kind: EntityKind, creator: UserRef, project: ProjectId) -> Self {
        Self {
            id,
            kind,
            creator,
            status: Phase::New.threshold(),
            project,
        }
    }

    /// Create an entity snapshot with an explicit packed status.
    #[must_use]
    pub fn with_status(
        id: EntityId,
        kind: EntityKind,
        creator: UserRef,
        project: ProjectId,
        status: u32,
    ) -> Self {
        Self {
            id,
            kind,
            creator,
            status,
            project,
        }
    }
}

/// A project snapshot.
///
/// The owner reference is permanent; the project type never changes after
/// creation. `team_size` feeds the small-team skip rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// The project identifier.
    pub id: ProjectId,
    /// The principal who owns this project.
    pub owner: UserRef,
    /// The project typology.
    pub kind: ProjectType,
    /// Packed status of the project itself.
    pub status: u32,
    /// Current number of team members.
    pub team_size: u32,
}

impl Project {
    /// Create a new project snapshot at phase `new` with no scope flags.
    #[must_use]
    pub fn new(id: ProjectId, owner: UserRef, kind: ProjectType, team_size: u32) -> Self {
        Self {
            id,
            owner,
            kind,
            status: Phase::New.threshold(),
            team_size,
        }
    }
}

/// A membership snapshot binding a principal to a project with role bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// The member principal.
    pub user: UserRef,
    /// The project this membership belongs to.
    pub project: ProjectId,
    /// Granted role bits.
    pub roles: RoleBits,
}

impl Membership {
    /// Create a new membership snapshot.
    #[must_use]
    pub fn new(user: UserRef, project: ProjectId, roles: RoleBits) -> Self {
        Self {
            user,
            project,
            roles,
        }
    }
}

/// The principal asking for a decision.
///
/// Admin viewers are evaluated with the effective relation `owner` for every
/// project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    /// The viewer principal.
    pub user: UserRef,
    /// Platform-admin override.
    pub is_admin: bool,
}

impl Viewer {
    /// Create a regular viewer.
    #[must_use]
    pub fn new(user: UserRef) -> Self {
        Self {
            user,
            is_admin: false,
        }
    }

    /// Create an admin viewer.
    #[must_use]
    pub fn admin(user: UserRef) -> Self {
        Self {
            user,
            is_admin: true,
        }
    }
}

// =============================================================================
// ACTIVATION INPUTS
// =============================================================================

/// Caller-supplied content aggregates for activation checks.
///
/// The engine never derives these itself; they describe what the project
/// currently contains (live records only, trash excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContentCounts {
    /// Live posts in the project.
    pub posts: u32,
    /// Live events in the project.
    pub events: u32,
    /// Current members.
    pub members: u32,
    /// Projects associated with this one.
    pub associations: u32,
    /// Live cover images.
    pub cover_images: u32,
}

impl ContentCounts {
    /// Counts with everything at zero.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            posts: 0,
            events: 0,
            members: 0,
            associations: 0,
            cover_images: 0,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Warden engine.
///
/// - No silent failures
/// - Use `Result<T, WardenError>` for fallible operations
/// - Every error is fail-closed: an `Err` grants no access
#[derive(Debug, Error)]
pub enum WardenError {
    /// The packed status value has unknown phase bits or stray bits outside
    /// the phase and scope ranges.
    #[error("Invalid status encoding: {raw:#x}")]
    InvalidStatusEncoding {
        /// The rejected raw value.
        raw: u32,
    },

    /// No capability row is defined for this combination. Deny.
    #[error("No capability row for {kind}/{phase}/{relation}")]
    MatrixLookupMiss {
        /// The entity kind of the failed lookup.
        kind: EntityKind,
        /// The phase of the failed lookup.
        phase: Phase,
        /// The relation of the failed lookup.
        relation: Relation,
    },

    /// The requested entity was not found in the store.
    #[error("Entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// The requested project was not found in the store.
    #[error("Project not found: {0:?}")]
    ProjectNotFound(ProjectId),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A store lock was poisoned by a panicking writer.
    #[error("Store lock poisoned")]
    LockPoisoned,
}

// =============================================================================
// TESTS
// =============================================================================
