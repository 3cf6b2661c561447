//! # Packed Status Codec
//!
//! A stored status is a single `u32` that packs two independent encodings:
//!
//! | Bits    | Content                                           |
//! |---------|---------------------------------------------------|
//! | 0..=16  | exactly one workflow phase threshold (ordinal)    |
//! | 17..=21 | zero or more visibility scope flags (independent) |
//!
//! The phase thresholds are the fixed set {1, 8, 64, 256, 512, 4096, 32768,
//! 65536}. Everything outside these two ranges is rejected. This module is
//! the only place in the crate that touches the raw integer; all other code
//! works with [`Status`], [`Phase`], and [`ScopeFlags`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};

use crate::types::WardenError;

// =============================================================================
// BIT RANGES
// =============================================================================

/// Bits 0..=16 carry the workflow phase threshold.
pub const PHASE_MASK: u32 = 0x0001_FFFF;

/// Bits 17..=21 carry the visibility scope flags.
pub const SCOPE_MASK: u32 = ScopeFlags::all().bits();

// =============================================================================
// PHASE
// =============================================================================

/// Workflow phase of a governed entity or project.
///
/// Phases are ordinal: the derived `Ord` follows the lifecycle order. The
/// wire threshold of each phase is available via [`Phase::threshold`]; the
/// gaps between thresholds are legacy artifacts of the packed encoding and
/// carry no meaning.
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
pub enum Phase {
    /// Just created; visible to the inner circle only.
    New,
    /// Trial phase for projects warming up.
    Demo,
    /// Being worked on.
    Draft,
    /// Locked for editorial review (posts and events only).
    Review,
    /// Accepted; visible to the wider project audience.
    Confirmed,
    /// Published.
    Released,
    /// Frozen read-only.
    Archived,
    /// Soft-deleted. A phase, not removal.
    Trash,
}

impl Phase {
    /// Get the phase name as used on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Phase::New => "new",
            Phase::Demo => "demo",
            Phase::Draft => "draft",
            Phase::Review => "review",
            Phase::Confirmed => "confirmed",
            Phase::Released => "released",
            Phase::Archived => "archived",
            Phase::Trash => "trash",
        }
    }

    /// Get the packed wire threshold for this phase.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        match self {
            Phase::New => 1,
            Phase::Demo => 8,
            Phase::Draft => 64,
            Phase::Review => 256,
            Phase::Confirmed => 512,
            Phase::Released => 4096,
            Phase::Archived => 32768,
            Phase::Trash => 65536,
        }
    }

    /// Look up the phase for an exact wire threshold.
    #[must_use]
    pub const fn from_threshold(value: u32) -> Option<Self> {
        match value {
            1 => Some(Phase::New),
            8 => Some(Phase::Demo),
            64 => Some(Phase::Draft),
            256 => Some(Phase::Review),
            512 => Some(Phase::Confirmed),
            4096 => Some(Phase::Released),
            32768 => Some(Phase::Archived),
            65536 => Some(Phase::Trash),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// SCOPE FLAGS
// =============================================================================

bitflags! {
    /// Visibility scope flags. Independent of the phase and of each other;
    /// any subset may be set on any phase.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ScopeFlags: u32 {
        /// Visible to the project team.
        const TEAM    = 1 << 17;
        /// Visible to any logged-in user.
        const LOGIN   = 1 << 18;
        /// Visible within the project context.
        const PROJECT = 1 << 19;
        /// Visible within the regional hub.
        const REGIO   = 1 << 20;
        /// Publicly visible.
        const PUBLIC  = 1 << 21;
    }
}

impl ScopeFlags {
    /// Returns a human-readable list of set scope names.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::TEAM) {
            names.push("team");
        }
        if self.contains(Self::LOGIN) {
            names.push("login");
        }
        if self.contains(Self::PROJECT) {
            names.push("project");
        }
        if self.contains(Self::REGIO) {
            names.push("regio");
        }
        if self.contains(Self::PUBLIC) {
            names.push("public");
        }
        names
    }
}

impl std::fmt::Display for ScopeFlags {
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
// STATUS
// =============================================================================

/// Decoded status: one phase plus a set of scope flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Status {
    /// The workflow phase.
    pub phase: Phase,
    /// The visibility scope flags.
    pub scopes: ScopeFlags,
}

impl Status {
    /// Build a status from its parts.
    #[must_use]
    pub const fn new(phase: Phase, scopes: ScopeFlags) -> Self {
        Self { phase, scopes }
    }

    /// Strictly decode a packed status value.
    ///
    /// Rejects any set bit outside the phase and scope ranges and any phase
    /// region content that is not exactly one known threshold. A phase region
    /// of zero (status 0 or scope-only values) decodes to [`Phase::New`].
    pub fn decode(raw: u32) -> Result<Self, WardenError> {
        if raw & !(PHASE_MASK | SCOPE_MASK) != 0 {
            return Err(WardenError::InvalidStatusEncoding { raw });
        }
        Ok(Self {
            phase: Self::decode_phase(raw)?,
            scopes: Self::decode_scopes(raw),
        })
    }

    /// Decode only the phase from a packed status value.
    ///
    /// Ignores the scope range and any higher bits. Missing phase bits
    /// default to [`Phase::New`]; anything else that is not exactly one
    /// known threshold is rejected.
    pub fn decode_phase(raw: u32) -> Result<Phase, WardenError> {
        let bits = raw & PHASE_MASK;
        if bits == 0 {
            return Ok(Phase::New);
        }
        Phase::from_threshold(bits).ok_or(WardenError::InvalidStatusEncoding { raw })
    }

    /// Extract the scope flags from a packed status value. Infallible; bits
    /// outside the scope range are simply not scope flags.
    #[must_use]
    pub const fn decode_scopes(raw: u32) -> ScopeFlags {
        ScopeFlags::from_bits_truncate(raw)
    }

    /// Pack this status back into its wire form.
    #[must_use]
    pub const fn encode(&self) -> u32 {
        self.phase.threshold() | self.scopes.bits()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.scopes.is_empty() {
            write!(f, "{}", self.phase)
        } else {
            write!(f, "{}+{}", self.phase, self.scopes)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
