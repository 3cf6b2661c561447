//! # warden-core
//!
//! The deterministic decision engine for Warden - THE LOGIC.
//!
//! This crate answers two questions about a collaboration platform's
//! content and projects, from snapshots alone:
//!
//! - CAPABILITY: what may this viewer do with this record right now?
//! - TRANSITION: which workflow phases may they move it to, and may they
//!   move it to this one?
//!
//! ## Architectural Constraints
//!
//! The engine:
//! - Decides from snapshots only; it never fetches data on its own
//! - Is deterministic: same snapshots in, same decision out, on every
//!   platform (`BTreeMap` everywhere, no wall clock, no randomness)
//! - Fails closed: undefined matrix combinations and undecodable status
//!   words deny or error, never grant
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod activation;
pub mod cache;
pub mod command;
pub mod matrix;
pub mod relation;
pub mod service;
pub mod status;
pub mod storage;
pub mod transition;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ContentCounts, EntityId, EntityKind, GovernedEntity, Membership, Project, ProjectId,
    ProjectType, RoleBits, UserRef, Viewer, WardenError,
};

// =============================================================================
// RE-EXPORTS: Decision Engine
// =============================================================================

pub use activation::{ActivationEngine, ActivationReport, ActivationRule, rules_for};
pub use cache::{CacheKey, CapabilityCache};
pub use command::{TransitionOutcome, apply_transition};
pub use matrix::{
    Capabilities, CapabilityMatrix, ManageAccess, ReadAccess, UpdateAccess, apply_creator_override,
};
pub use relation::{IdentityKey, Relation, is_entity_creator, resolve_project_relation};
pub use service::CapabilityService;
pub use status::{PHASE_MASK, Phase, SCOPE_MASK, ScopeFlags, Status};
pub use transition::{DenialReason, SMALL_TEAM_MAX, TransitionContext, TransitionValidator};

// =============================================================================
// RE-EXPORTS: Storage
// =============================================================================

pub use storage::{MemoryStore, SnapshotStore, SwapOutcome, redb_store::RedbStore};
