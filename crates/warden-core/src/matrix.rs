//! # Capability Matrix
//!
//! The canonical answer to "what may this relation do with this kind of
//! entity in this phase". One explicit row per defined combination; there is
//! no default row and no fallback. A combination outside a kind's phase set
//! (posts have no demo, images and projects have no review) is a structured
//! [`WardenError::MatrixLookupMiss`], never silent full access.
//!
//! Rows are deliberately not monotonic in phase. A member may edit content in
//! draft, lose all update access during review, and come back with comment
//! rights once confirmed. Partners see content only from confirmed onward
//! while participants already get summaries in draft.
//!
//! Entity creatorship is applied on top of the matrix via
//! [`apply_creator_override`]; it lifts read/update to content level in every
//! phase except trash.

use serde::{Deserialize, Serialize};

use crate::relation::Relation;
use crate::status::Phase;
use crate::types::{EntityKind, WardenError};

// =============================================================================
// ACCESS GRADES
// =============================================================================

/// Graded read access. Derived `Ord` follows the grant order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ReadAccess {
    /// No read access at all.
    #[default]
    None,
    /// Title, teaser, and existence only.
    Summary,
    /// The full content body.
    Content,
    /// Content plus settings and internals.
    Config,
}

impl ReadAccess {
    /// Get the grade name as used on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ReadAccess::None => "none",
            ReadAccess::Summary => "summary",
            ReadAccess::Content => "content",
            ReadAccess::Config => "config",
        }
    }
}

impl std::fmt::Display for ReadAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Graded update access. Derived `Ord` follows the grant order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum UpdateAccess {
    /// No update access at all.
    #[default]
    None,
    /// May attach comments only.
    Comment,
    /// May edit the content body.
    Content,
    /// May edit content and settings.
    Config,
}

impl UpdateAccess {
    /// Get the grade name as used on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            UpdateAccess::None => "none",
            UpdateAccess::Comment => "comment",
            UpdateAccess::Content => "content",
            UpdateAccess::Config => "config",
        }
    }
}

impl std::fmt::Display for UpdateAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Graded management access. Derived `Ord` follows the grant order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ManageAccess {
    /// No management access at all.
    #[default]
    None,
    /// May drive workflow transitions (within transition rules).
    Status,
    /// Status plus membership management.
    Members,
    /// Everything, including configuration and trash handling.
    Full,
}

impl ManageAccess {
    /// Get the grade name as used on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ManageAccess::None => "none",
            ManageAccess::Status => "status",
            ManageAccess::Members => "members",
            ManageAccess::Full => "full",
        }
    }
}

impl std::fmt::Display for ManageAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// One capability row: what a relation may do right now.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Capabilities {
    /// Graded read access.
    pub read: ReadAccess,
    /// Graded update access.
    pub update: UpdateAccess,
    /// Graded management access.
    pub manage: ManageAccess,
    /// May the entity appear in listings for this viewer.
    pub list: bool,
    /// May this viewer share the entity outward.
    pub share: bool,
}

impl Capabilities {
    /// The deny-all row.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            read: ReadAccess::None,
            update: UpdateAccess::None,
            manage: ManageAccess::None,
            list: false,
            share: false,
        }
    }

    /// The floor granted to an entity's creator regardless of relation.
    #[must_use]
    pub const fn creator_floor() -> Self {
        Self {
            read: ReadAccess::Content,
            update: UpdateAccess::Content,
            manage: ManageAccess::None,
            list: false,
            share: false,
        }
    }

    /// Pointwise maximum of two rows.
    #[must_use]
    pub fn join_max(&self, other: &Self) -> Self {
        Self {
            read: self.read.max(other.read),
            update: self.update.max(other.update),
            manage: self.manage.max(other.manage),
            list: self.list || other.list,
            share: self.share || other.share,
        }
    }
}

/// Shorthand for writing matrix rows.
const fn row(
    read: ReadAccess,
    update: UpdateAccess,
    manage: ManageAccess,
    list: bool,
    share: bool,
) -> Capabilities {
    Capabilities {
        read,
        update,
        manage,
        list,
        share,
    }
}

// =============================================================================
// CREATOR OVERRIDE
// =============================================================================

/// Lift a matrix row for the entity's creator.
///
/// The effective row is the pointwise maximum of the matrix row and
/// [`Capabilities::creator_floor`]. In trash the matrix row stands alone;
/// trashed content is out of its creator's hands until restored.
#[must_use]
pub fn apply_creator_override(
    caps: Capabilities,
    is_entity_creator: bool,
    phase: Phase,
) -> Capabilities {
    if !is_entity_creator || phase == Phase::Trash {
        return caps;
    }
    caps.join_max(&Capabilities::creator_floor())
}

// =============================================================================
// CAPABILITY MATRIX
// =============================================================================

/// Lookup into the canonical capability table.
///
/// This is the only capability table in the crate; every surface that answers
/// an access question goes through [`CapabilityMatrix::lookup`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityMatrix;

impl CapabilityMatrix {
    /// Create a matrix handle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// The phases defined for a kind. Lookups outside this set miss.
    #[must_use]
    pub const fn defined_phases(kind: EntityKind) -> &'static [Phase] {
        match kind {
            EntityKind::Post | EntityKind::Event => &[
                Phase::New,
                Phase::Draft,
                Phase::Review,
                Phase::Confirmed,
                Phase::Released,
                Phase::Archived,
                Phase::Trash,
            ],
            EntityKind::Image => &[
                Phase::New,
                Phase::Draft,
                Phase::Confirmed,
                Phase::Released,
                Phase::Archived,
                Phase::Trash,
            ],
            EntityKind::Project => &[
                Phase::New,
                Phase::Demo,
                Phase::Draft,
                Phase::Confirmed,
                Phase::Released,
                Phase::Archived,
                Phase::Trash,
            ],
        }
    }

    /// Look up the capability row for a combination.
    pub fn lookup(
        &self,
        kind: EntityKind,
        phase: Phase,
        relation: Relation,
    ) -> Result<Capabilities, WardenError> {
        let row = match kind {
            EntityKind::Post | EntityKind::Event => content_row(phase, relation),
            EntityKind::Image => image_row(phase, relation),
            EntityKind::Project => project_row(phase, relation),
        };
        row.ok_or(WardenError::MatrixLookupMiss {
            kind,
            phase,
            relation,
        })
    }
}

/// Rows for posts and events. No demo phase.
fn content_row(phase: Phase, relation: Relation) -> Option<Capabilities> {
    use ManageAccess as M;
    use ReadAccess as R;
    use UpdateAccess as U;

    let caps = match (phase, relation) {
        (Phase::Demo, _) => return None,

        (Phase::New, Relation::Owner) => row(R::Config, U::Config, M::Full, true, false),
        (Phase::New, Relation::Creator) => row(R::Content, U::Content, M::Status, true, false),
        (Phase::New, Relation::Member) => row(R::Summary, U::None, M::None, false, false),
        (Phase::New, Relation::Participant | Relation::Partner | Relation::Anonymous) => {
            Capabilities::none()
        }

        (Phase::Draft, Relation::Owner) => row(R::Config, U::Config, M::Full, true, false),
        (Phase::Draft, Relation::Creator) => row(R::Content, U::Content, M::Status, true, false),
        (Phase::Draft, Relation::Member) => row(R::Content, U::Content, M::None, true, false),
        (Phase::Draft, Relation::Participant) => row(R::Summary, U::Comment, M::None, true, false),
        (Phase::Draft, Relation::Partner | Relation::Anonymous) => Capabilities::none(),

        (Phase::Review, Relation::Owner) => row(R::Config, U::Config, M::Full, true, false),
        (Phase::Review, Relation::Creator) => row(R::Content, U::Comment, M::Status, true, false),
        (Phase::Review, Relation::Member) => row(R::Content, U::None, M::None, true, false),
        (Phase::Review, Relation::Participant) => row(R::Summary, U::None, M::None, true, false),
        (Phase::Review, Relation::Partner | Relation::Anonymous) => Capabilities::none(),

        (Phase::Confirmed, Relation::Owner) => row(R::Config, U::Config, M::Full, true, true),
        (Phase::Confirmed, Relation::Creator) => row(R::Content, U::Content, M::Status, true, true),
        (Phase::Confirmed, Relation::Member) => row(R::Content, U::Comment, M::None, true, true),
        (Phase::Confirmed, Relation::Participant) => {
            row(R::Content, U::Comment, M::None, true, false)
        }
        (Phase::Confirmed, Relation::Partner) => row(R::Content, U::None, M::None, true, false),
        (Phase::Confirmed, Relation::Anonymous) => Capabilities::none(),

        (Phase::Released, Relation::Owner) => row(R::Config, U::Config, M::Full, true, true),
        (Phase::Released, Relation::Creator) => row(R::Content, U::Content, M::Status, true, true),
        (Phase::Released, Relation::Member) => row(R::Content, U::Comment, M::None, true, true),
        (Phase::Released, Relation::Participant) => {
            row(R::Content, U::Comment, M::None, true, true)
        }
        (Phase::Released, Relation::Partner) => row(R::Content, U::None, M::None, true, true),
        (Phase::Released, Relation::Anonymous) => row(R::Content, U::None, M::None, true, false),

        (Phase::Archived, Relation::Owner) => row(R::Config, U::None, M::Full, true, false),
        (Phase::Archived, Relation::Creator) => row(R::Content, U::None, M::Status, true, false),
        (Phase::Archived, Relation::Member) => row(R::Content, U::None, M::None, true, false),
        (Phase::Archived, Relation::Participant) => row(R::Summary, U::None, M::None, true, false),
        (Phase::Archived, Relation::Partner | Relation::Anonymous) => {
            row(R::Summary, U::None, M::None, false, false)
        }

        (Phase::Trash, Relation::Owner) => row(R::Config, U::None, M::Full, true, false),
        (Phase::Trash, Relation::Creator) => row(R::Summary, U::None, M::Status, true, false),
        (
            Phase::Trash,
            Relation::Member | Relation::Participant | Relation::Partner | Relation::Anonymous,
        ) => Capabilities::none(),
    };
    Some(caps)
}

/// Rows for images. No demo and no review phase; media skips editorial
/// review entirely.
fn image_row(phase: Phase, relation: Relation) -> Option<Capabilities> {
    use ManageAccess as M;
    use ReadAccess as R;
    use UpdateAccess as U;

    let caps = match (phase, relation) {
        (Phase::Demo | Phase::Review, _) => return None,

        (Phase::New, Relation::Owner) => row(R::Config, U::Config, M::Full, true, false),
        (Phase::New, Relation::Creator) => row(R::Content, U::Content, M::Status, true, false),
        (Phase::New, Relation::Member) => row(R::Summary, U::None, M::None, false, false),
        (Phase::New, Relation::Participant | Relation::Partner | Relation::Anonymous) => {
            Capabilities::none()
        }

        (Phase::Draft, Relation::Owner) => row(R::Config, U::Config, M::Full, true, false),
        (Phase::Draft, Relation::Creator) => row(R::Content, U::Content, M::Status, true, false),
        (Phase::Draft, Relation::Member) => row(R::Content, U::Content, M::None, true, false),
        (Phase::Draft, Relation::Participant) => row(R::Summary, U::None, M::None, true, false),
        (Phase::Draft, Relation::Partner | Relation::Anonymous) => Capabilities::none(),

        (Phase::Confirmed, Relation::Owner) => row(R::Config, U::Config, M::Full, true, true),
        (Phase::Confirmed, Relation::Creator) => row(R::Content, U::Content, M::Status, true, true),
        (Phase::Confirmed, Relation::Member) => row(R::Content, U::Comment, M::None, true, true),
        (Phase::Confirmed, Relation::Participant | Relation::Partner) => {
            row(R::Content, U::None, M::None, true, false)
        }
        (Phase::Confirmed, Relation::Anonymous) => Capabilities::none(),

        (Phase::Released, Relation::Owner) => row(R::Config, U::Config, M::Full, true, true),
        (Phase::Released, Relation::Creator) => row(R::Content, U::Content, M::Status, true, true),
        (Phase::Released, Relation::Member) => row(R::Content, U::Comment, M::None, true, true),
        (Phase::Released, Relation::Participant | Relation::Partner) => {
            row(R::Content, U::None, M::None, true, true)
        }
        (Phase::Released, Relation::Anonymous) => row(R::Content, U::None, M::None, true, false),

        (Phase::Archived, Relation::Owner) => row(R::Config, U::None, M::Full, true, false),
        (Phase::Archived, Relation::Creator) => row(R::Content, U::None, M::Status, true, false),
        (Phase::Archived, Relation::Member) => row(R::Content, U::None, M::None, true, false),
        (Phase::Archived, Relation::Participant) => row(R::Summary, U::None, M::None, true, false),
        (Phase::Archived, Relation::Partner | Relation::Anonymous) => {
            row(R::Summary, U::None, M::None, false, false)
        }

        (Phase::Trash, Relation::Owner) => row(R::Config, U::None, M::Full, true, false),
        (Phase::Trash, Relation::Creator) => row(R::Summary, U::None, M::Status, true, false),
        (
            Phase::Trash,
            Relation::Member | Relation::Participant | Relation::Partner | Relation::Anonymous,
        ) => Capabilities::none(),
    };
    Some(caps)
}

/// Rows for the project record itself. Demo instead of review; the creator
/// role manages members from demo onward.
fn project_row(phase: Phase, relation: Relation) -> Option<Capabilities> {
    use ManageAccess as M;
    use ReadAccess as R;
    use UpdateAccess as U;

    let caps = match (phase, relation) {
        (Phase::Review, _) => return None,

        (Phase::New, Relation::Owner) => row(R::Config, U::Config, M::Full, true, false),
        (Phase::New, Relation::Creator) => row(R::Content, U::Content, M::Status, true, false),
        (Phase::New, Relation::Member) => row(R::Summary, U::None, M::None, false, false),
        (Phase::New, Relation::Participant | Relation::Partner | Relation::Anonymous) => {
            Capabilities::none()
        }

        (Phase::Demo, Relation::Owner) => row(R::Config, U::Config, M::Full, true, false),
        (Phase::Demo, Relation::Creator) => row(R::Content, U::Content, M::Members, true, false),
        (Phase::Demo, Relation::Member) => row(R::Content, U::Comment, M::None, true, false),
        (Phase::Demo, Relation::Participant) => row(R::Summary, U::None, M::None, true, false),
        (Phase::Demo, Relation::Partner | Relation::Anonymous) => Capabilities::none(),

        (Phase::Draft, Relation::Owner) => row(R::Config, U::Config, M::Full, true, false),
        (Phase::Draft, Relation::Creator) => row(R::Config, U::Content, M::Members, true, false),
        (Phase::Draft, Relation::Member) => row(R::Content, U::Comment, M::None, true, false),
        (Phase::Draft, Relation::Participant) => row(R::Summary, U::None, M::None, true, false),
        (Phase::Draft, Relation::Partner | Relation::Anonymous) => Capabilities::none(),

        (Phase::Confirmed, Relation::Owner) => row(R::Config, U::Config, M::Full, true, true),
        (Phase::Confirmed, Relation::Creator) => row(R::Config, U::Content, M::Members, true, true),
        (Phase::Confirmed, Relation::Member) => row(R::Content, U::Comment, M::None, true, true),
        (Phase::Confirmed, Relation::Participant) => {
            row(R::Content, U::Comment, M::None, true, false)
        }
        (Phase::Confirmed, Relation::Partner) => row(R::Content, U::None, M::None, true, false),
        (Phase::Confirmed, Relation::Anonymous) => Capabilities::none(),

        (Phase::Released, Relation::Owner) => row(R::Config, U::Config, M::Full, true, true),
        (Phase::Released, Relation::Creator) => row(R::Config, U::Content, M::Members, true, true),
        (Phase::Released, Relation::Member) => row(R::Content, U::Comment, M::None, true, true),
        (Phase::Released, Relation::Participant) => {
            row(R::Content, U::Comment, M::None, true, true)
        }
        (Phase::Released, Relation::Partner) => row(R::Content, U::None, M::None, true, true),
        (Phase::Released, Relation::Anonymous) => row(R::Summary, U::None, M::None, true, false),

        (Phase::Archived, Relation::Owner) => row(R::Config, U::None, M::Full, true, false),
        (Phase::Archived, Relation::Creator) => row(R::Content, U::None, M::Status, true, false),
        (Phase::Archived, Relation::Member) => row(R::Content, U::None, M::None, true, false),
        (Phase::Archived, Relation::Participant) => row(R::Summary, U::None, M::None, true, false),
        (Phase::Archived, Relation::Partner | Relation::Anonymous) => {
            row(R::Summary, U::None, M::None, false, false)
        }

        (Phase::Trash, Relation::Owner) => row(R::Config, U::None, M::Full, true, false),
        (Phase::Trash, Relation::Creator) => row(R::Summary, U::None, M::Status, true, false),
        (
            Phase::Trash,
            Relation::Member | Relation::Participant | Relation::Partner | Relation::Anonymous,
        ) => Capabilities::none(),
    };
    Some(caps)
}

// =============================================================================
// TESTS
// =============================================================================
