//! # Snapshot Storage
//!
//! The decision engine works on snapshots; this module owns where they come
//! from and how transitions are committed. [`SnapshotStore`] is the seam:
//! reads return owned snapshots, and the only write that races is
//! [`SnapshotStore::swap_status`], a compare-and-swap on the packed status
//! word. Lost updates surface as [`SwapOutcome::Conflict`] instead of
//! silently overwriting a concurrent transition.
//!
//! Two backends ship: [`MemoryStore`] for tests and embedding, and
//! [`RedbStore`](redb_store::RedbStore) for persistence.

pub mod redb_store;

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::relation::IdentityKey;
use crate::types::{
    EntityId, EntityKind, GovernedEntity, Membership, Project, ProjectId, UserRef, WardenError,
};

/// Result of a compare-and-swap on an entity's status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapOutcome {
    /// The stored value matched and was replaced.
    Swapped,
    /// The store moved on; `actual` is what it holds now.
    Conflict {
        /// The status found in place of the expected one.
        actual: u32,
    },
    /// The entity vanished between read and swap.
    Missing,
}

/// Snapshot reads plus the status compare-and-swap.
///
/// All methods take `&self`; implementations synchronize internally and are
/// shared across threads as-is.
pub trait SnapshotStore: Send + Sync {
    /// Fetch one entity snapshot.
    fn entity(&self, id: EntityId) -> Result<Option<GovernedEntity>, WardenError>;

    /// Fetch one project snapshot.
    fn project(&self, id: ProjectId) -> Result<Option<Project>, WardenError>;

    /// Fetch the viewer's membership in a project, if any.
    fn membership(
        &self,
        user: &UserRef,
        project: ProjectId,
    ) -> Result<Option<Membership>, WardenError>;

    /// Insert or replace an entity.
    fn put_entity(&self, entity: &GovernedEntity) -> Result<(), WardenError>;

    /// Insert or replace a project.
    fn put_project(&self, project: &Project) -> Result<(), WardenError>;

    /// Insert or replace a membership row.
    fn put_membership(&self, membership: &Membership) -> Result<(), WardenError>;

    /// Atomically replace the entity's status word if it still reads
    /// `expected`.
    fn swap_status(
        &self,
        id: EntityId,
        expected: u32,
        target: u32,
    ) -> Result<SwapOutcome, WardenError>;
}

/// Key under which a membership row is filed: normalized principal key plus
/// project id.
fn membership_key(user: &UserRef, project: ProjectId) -> (String, u64) {
    (IdentityKey::normalize(user).to_string(), project.0)
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[derive(Debug, Default)]
struct Tables {
    entities: BTreeMap<EntityId, GovernedEntity>,
    projects: BTreeMap<ProjectId, Project>,
    memberships: BTreeMap<(String, u64), Membership>,
}

/// In-memory [`SnapshotStore`] behind a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, WardenError> {
        self.tables.read().map_err(|_| WardenError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, WardenError> {
        self.tables.write().map_err(|_| WardenError::LockPoisoned)
    }
}

impl SnapshotStore for MemoryStore {
    fn entity(&self, id: EntityId) -> Result<Option<GovernedEntity>, WardenError> {
        Ok(self.read()?.entities.get(&id).cloned())
    }

    fn project(&self, id: ProjectId) -> Result<Option<Project>, WardenError> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    fn membership(
        &self,
        user: &UserRef,
        project: ProjectId,
    ) -> Result<Option<Membership>, WardenError> {
        let key = membership_key(user, project);
        Ok(self.read()?.memberships.get(&key).cloned())
    }

    fn put_entity(&self, entity: &GovernedEntity) -> Result<(), WardenError> {
        self.write()?.entities.insert(entity.id, entity.clone());
        Ok(())
    }

    fn put_project(&self, project: &Project) -> Result<(), WardenError> {
        self.write()?.projects.insert(project.id, project.clone());
        Ok(())
    }

    fn put_membership(&self, membership: &Membership) -> Result<(), WardenError> {
        let key = membership_key(&membership.user, membership.project);
        self.write()?.memberships.insert(key, membership.clone());
        Ok(())
    }

    fn swap_status(
        &self,
        id: EntityId,
        expected: u32,
        target: u32,
    ) -> Result<SwapOutcome, WardenError> {
        // Compare and swap under one write lock; readers see either the old
        // or the new word, never a half-applied transition.
        let mut tables = self.write()?;
        let Some(entity) = tables.entities.get_mut(&id) else {
            return Ok(SwapOutcome::Missing);
        };
        if entity.status != expected {
            return Ok(SwapOutcome::Conflict {
                actual: entity.status,
            });
        }
        entity.status = target;
        if entity.kind == EntityKind::Project {
            let project_id = entity.project;
            if let Some(project) = tables.projects.get_mut(&project_id) {
                project.status = target;
            }
        }
        Ok(SwapOutcome::Swapped)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Phase;
    use crate::types::{ProjectType, RoleBits};

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
    }

    #[test]
    fn round_trips_snapshots() {
        let store = seeded();
        let entity = store.entity(EntityId(10)).expect("read").expect("present");
        assert_eq!(entity.kind, EntityKind::Post);
        assert_eq!(entity.status, Phase::Draft.threshold());
        assert!(store.entity(EntityId(99)).expect("read").is_none());
        assert!(store.project(ProjectId(1)).expect("read").is_some());
    }

    #[test]
    fn membership_lookup_normalizes_the_principal() {
        let store = seeded();
        store
            .put_membership(&Membership::new(
                UserRef::new("Ana@Example.ORG"),
                ProjectId(1),
                RoleBits::MEMBER,
            ))
            .expect("put membership");

        let found = store
            .membership(&UserRef::new("  ana@example.org "), ProjectId(1))
            .expect("read");
        assert!(found.is_some());
        let elsewhere = store
            .membership(&UserRef::new("ana@example.org"), ProjectId(2))
            .expect("read");
        assert!(elsewhere.is_none());
    }

    #[test]
    fn swap_applies_on_match() {
        let store = seeded();
        let outcome = store
            .swap_status(
                EntityId(10),
                Phase::Draft.threshold(),
                Phase::Review.threshold(),
            )
            .expect("swap");
        assert_eq!(outcome, SwapOutcome::Swapped);
        let entity = store.entity(EntityId(10)).expect("read").expect("present");
        assert_eq!(entity.status, Phase::Review.threshold());
    }

    #[test]
    fn swap_reports_conflict_with_actual_value() {
        let store = seeded();
        let outcome = store
            .swap_status(
                EntityId(10),
                Phase::Review.threshold(),
                Phase::Confirmed.threshold(),
            )
            .expect("swap");
        assert_eq!(
            outcome,
            SwapOutcome::Conflict {
                actual: Phase::Draft.threshold()
            }
        );
        // Nothing moved.
        let entity = store.entity(EntityId(10)).expect("read").expect("present");
        assert_eq!(entity.status, Phase::Draft.threshold());
    }

    #[test]
    fn swap_on_absent_entity_is_missing() {
        let store = seeded();
        let outcome = store
            .swap_status(EntityId(404), 1, 8)
            .expect("swap");
        assert_eq!(outcome, SwapOutcome::Missing);
    }

    #[test]
    fn project_head_entity_swap_updates_the_project_row() {
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

        let outcome = store
            .swap_status(
                EntityId(1),
                Phase::New.threshold(),
                Phase::Demo.threshold(),
            )
            .expect("swap");
        assert_eq!(outcome, SwapOutcome::Swapped);
        let project = store.project(ProjectId(1)).expect("read").expect("present");
        assert_eq!(project.status, Phase::Demo.threshold());
    }
}
