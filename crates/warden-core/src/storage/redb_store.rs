//! # redb-backed Snapshot Store
//!
//! A disk-backed [`SnapshotStore`] using the redb embedded database,
//! providing ACID transactions, crash safety (copy-on-write B-trees), and
//! MVCC with concurrent readers against a single writer.
//!
//! Rows are postcard-serialized snapshots. [`RedbStore::swap_status`] runs
//! the read, compare, and write of the status word inside one write
//! transaction, so redb's single-writer rule makes the compare-and-swap
//! atomic without any further locking.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

use super::{SnapshotStore, SwapOutcome, membership_key};
use crate::types::{
    EntityId, EntityKind, GovernedEntity, Membership, Project, ProjectId, UserRef, WardenError,
};

/// Table for entities: EntityId(u64) -> serialized GovernedEntity bytes
const ENTITIES: TableDefinition<u64, &[u8]> = TableDefinition::new("entities");

/// Table for projects: ProjectId(u64) -> serialized Project bytes
const PROJECTS: TableDefinition<u64, &[u8]> = TableDefinition::new("projects");

/// Table for memberships: (principal key, project id) -> serialized Membership bytes
const MEMBERSHIPS: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("memberships");

/// A disk-backed snapshot store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a snapshot database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WardenError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| WardenError::IoError(e.to_string()))?;

        // Initialize tables if they don't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| WardenError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(ENTITIES)
                .map_err(|e| WardenError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(PROJECTS)
                .map_err(|e| WardenError::IoError(e.to_string()))?;
            let _ = write_txn
                .open_table(MEMBERSHIPS)
                .map_err(|e| WardenError::IoError(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| WardenError::IoError(e.to_string()))?;
        }

        Ok(Self { db })
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), WardenError> {
        self.db
            .compact()
            .map_err(|e| WardenError::IoError(e.to_string()))?;
        Ok(())
    }

    /// All entities in deterministic id order.
    pub fn entities(&self) -> Result<Vec<GovernedEntity>, WardenError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| WardenError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(ENTITIES)
            .map_err(|e| WardenError::IoError(e.to_string()))?;

        let mut entities = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| WardenError::IoError(e.to_string()))?
        {
            let (_, value) = entry.map_err(|e| WardenError::IoError(e.to_string()))?;
            let entity: GovernedEntity = postcard::from_bytes(value.value())
                .map_err(|e| WardenError::SerializationError(e.to_string()))?;
            entities.push(entity);
        }
        Ok(entities)
    }

    /// All projects in deterministic id order.
    pub fn projects(&self) -> Result<Vec<Project>, WardenError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| WardenError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(PROJECTS)
            .map_err(|e| WardenError::IoError(e.to_string()))?;

        let mut projects = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| WardenError::IoError(e.to_string()))?
        {
            let (_, value) = entry.map_err(|e| WardenError::IoError(e.to_string()))?;
            let project: Project = postcard::from_bytes(value.value())
                .map_err(|e| WardenError::SerializationError(e.to_string()))?;
            projects.push(project);
        }
        Ok(projects)
    }
}

impl SnapshotStore for RedbStore {
    fn entity(&self, id: EntityId) -> Result<Option<GovernedEntity>, WardenError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| WardenError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(ENTITIES)
            .map_err(|e| WardenError::IoError(e.to_string()))?;

        match table
            .get(id.0)
            .map_err(|e| WardenError::IoError(e.to_string()))?
        {
            Some(data) => {
                let entity: GovernedEntity = postcard::from_bytes(data.value())
                    .map_err(|e| WardenError::SerializationError(e.to_string()))?;
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    fn project(&self, id: ProjectId) -> Result<Option<Project>, WardenError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| WardenError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(PROJECTS)
            .map_err(|e| WardenError::IoError(e.to_string()))?;

        match table
            .get(id.0)
            .map_err(|e| WardenError::IoError(e.to_string()))?
        {
            Some(data) => {
                let project: Project = postcard::from_bytes(data.value())
                    .map_err(|e| WardenError::SerializationError(e.to_string()))?;
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    fn membership(
        &self,
        user: &UserRef,
        project: ProjectId,
    ) -> Result<Option<Membership>, WardenError> {
        let key = membership_key(user, project);
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| WardenError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(MEMBERSHIPS)
            .map_err(|e| WardenError::IoError(e.to_string()))?;

        match table
            .get((key.0.as_str(), key.1))
            .map_err(|e| WardenError::IoError(e.to_string()))?
        {
            Some(data) => {
                let membership: Membership = postcard::from_bytes(data.value())
                    .map_err(|e| WardenError::SerializationError(e.to_string()))?;
                Ok(Some(membership))
            }
            None => Ok(None),
        }
    }

    fn put_entity(&self, entity: &GovernedEntity) -> Result<(), WardenError> {
        let bytes = postcard::to_allocvec(entity)
            .map_err(|e| WardenError::SerializationError(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| WardenError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(ENTITIES)
                .map_err(|e| WardenError::IoError(e.to_string()))?;
            table
                .insert(entity.id.0, bytes.as_slice())
                .map_err(|e| WardenError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| WardenError::IoError(e.to_string()))?;
        Ok(())
    }

    fn put_project(&self, project: &Project) -> Result<(), WardenError> {
        let bytes = postcard::to_allocvec(project)
            .map_err(|e| WardenError::SerializationError(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| WardenError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(PROJECTS)
                .map_err(|e| WardenError::IoError(e.to_string()))?;
            table
                .insert(project.id.0, bytes.as_slice())
                .map_err(|e| WardenError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| WardenError::IoError(e.to_string()))?;
        Ok(())
    }

    fn put_membership(&self, membership: &Membership) -> Result<(), WardenError> {
        let key = membership_key(&membership.user, membership.project);
        let bytes = postcard::to_allocvec(membership)
            .map_err(|e| WardenError::SerializationError(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| WardenError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(MEMBERSHIPS)
                .map_err(|e| WardenError::IoError(e.to_string()))?;
            table
                .insert((key.0.as_str(), key.1), bytes.as_slice())
                .map_err(|e| WardenError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| WardenError::IoError(e.to_string()))?;
        Ok(())
    }

    fn swap_status(
        &self,
        id: EntityId,
        expected: u32,
        target: u32,
    ) -> Result<SwapOutcome, WardenError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| WardenError::IoError(e.to_string()))?;

        let outcome;
        {
            let mut entities = write_txn
                .open_table(ENTITIES)
                .map_err(|e| WardenError::IoError(e.to_string()))?;

            let current: Option<GovernedEntity> = match entities
                .get(id.0)
                .map_err(|e| WardenError::IoError(e.to_string()))?
            {
                Some(data) => Some(
                    postcard::from_bytes(data.value())
                        .map_err(|e| WardenError::SerializationError(e.to_string()))?,
                ),
                None => None,
            };

            match current {
                None => outcome = SwapOutcome::Missing,
                Some(entity) if entity.status != expected => {
                    outcome = SwapOutcome::Conflict {
                        actual: entity.status,
                    };
                }
                Some(mut entity) => {
                    entity.status = target;
                    let bytes = postcard::to_allocvec(&entity)
                        .map_err(|e| WardenError::SerializationError(e.to_string()))?;
                    entities
                        .insert(id.0, bytes.as_slice())
                        .map_err(|e| WardenError::IoError(e.to_string()))?;

                    // A project head entity mirrors its status onto the
                    // project row, in the same transaction.
                    if entity.kind == EntityKind::Project {
                        let mut projects = write_txn
                            .open_table(PROJECTS)
                            .map_err(|e| WardenError::IoError(e.to_string()))?;
                        let row: Option<Project> = match projects
                            .get(entity.project.0)
                            .map_err(|e| WardenError::IoError(e.to_string()))?
                        {
                            Some(data) => Some(
                                postcard::from_bytes(data.value())
                                    .map_err(|e| WardenError::SerializationError(e.to_string()))?,
                            ),
                            None => None,
                        };
                        if let Some(mut project) = row {
                            project.status = target;
                            let bytes = postcard::to_allocvec(&project)
                                .map_err(|e| WardenError::SerializationError(e.to_string()))?;
                            projects
                                .insert(project.id.0, bytes.as_slice())
                                .map_err(|e| WardenError::IoError(e.to_string()))?;
                        }
                    }
                    outcome = SwapOutcome::Swapped;
                }
            }
        }

        write_txn
            .commit()
            .map_err(|e| WardenError::IoError(e.to_string()))?;
        Ok(outcome)
    }
}

// =============================================================================
// TESTS
// =============================================================================
