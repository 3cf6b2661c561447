//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::payload::{viewer_from, DecisionReport, SnapshotFile};
use std::path::{Path, PathBuf};
use warden_core::{
    apply_transition, CapabilityService, ContentCounts, EntityId, RedbStore, SnapshotStore,
    Status, TransitionOutcome, WardenError,
};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum snapshot file size (16 MB).
///
/// Snapshot files describe one project; anything larger is a mistake.
const MAX_SNAPSHOT_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), WardenError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| WardenError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(WardenError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path: canonicalize and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, WardenError> {
    let canonical = path.canonicalize().map_err(|e| {
        WardenError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(WardenError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Read and parse a snapshot file.
fn load_snapshot(file: &Path) -> Result<SnapshotFile, WardenError> {
    let validated = validate_file_path(file)?;
    validate_file_size(&validated, MAX_SNAPSHOT_FILE_SIZE)?;

    let contents = std::fs::read(&validated)
        .map_err(|e| WardenError::IoError(format!("Read file: {}", e)))?;
    serde_json::from_slice(&contents)
        .map_err(|e| WardenError::SerializationError(format!("Parse snapshot: {}", e)))
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty store.
pub fn cmd_init(db_path: &Path, force: bool) -> Result<(), WardenError> {
    if db_path.exists() {
        if !force {
            return Err(WardenError::IoError(
                "Store already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| WardenError::IoError(format!("Remove store: {}", e)))?;
    }

    let _store = RedbStore::open(db_path)?;
    println!("Initialized empty decision store at {:?}", db_path);

    Ok(())
}

// =============================================================================
// SEED COMMAND
// =============================================================================

/// Load a snapshot file into the store.
pub fn cmd_seed(db_path: &Path, json_mode: bool, file: &Path) -> Result<(), WardenError> {
    tracing::info!("Seeding from {:?}", file);

    let snapshot = load_snapshot(file)?;
    let store = RedbStore::open(db_path)?;

    let project = snapshot.project.to_project();
    store.put_project(&project)?;

    for record in &snapshot.entities {
        store.put_entity(&record.to_entity(project.id))?;
    }
    for record in &snapshot.memberships {
        store.put_membership(&record.to_membership(project.id))?;
    }

    if json_mode {
        let output = serde_json::json!({
            "project": project.id.0,
            "entities": snapshot.entities.len(),
            "memberships": snapshot.memberships.len()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Seeded project {} with {} entities, {} memberships",
        project.id.0,
        snapshot.entities.len(),
        snapshot.memberships.len()
    );

    Ok(())
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Show the decoded status of a stored entity.
pub fn cmd_show(db_path: &Path, json_mode: bool, entity_id: u64) -> Result<(), WardenError> {
    let store = RedbStore::open(db_path)?;

    let entity = store
        .entity(EntityId(entity_id))?
        .ok_or(WardenError::EntityNotFound(EntityId(entity_id)))?;
    let status = Status::decode(entity.status)?;

    if json_mode {
        let output = serde_json::json!({
            "id": entity.id.0,
            "kind": entity.kind.name(),
            "phase": status.phase.name(),
            "scopes": status.scopes.names(),
            "raw": entity.status,
            "creator": entity.creator.as_str(),
            "project": entity.project.0
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Entity {} ({})", entity.id.0, entity.kind);
    println!("================");
    println!("Phase:   {}", status.phase);
    println!("Scopes:  {}", status.scopes);
    println!("Raw:     {:#x}", entity.status);
    println!("Creator: {}", entity.creator);
    println!("Project: {}", entity.project.0);

    Ok(())
}

// =============================================================================
// INSPECT COMMAND
// =============================================================================

/// Decide capabilities and legal transitions from a snapshot file.
pub fn cmd_inspect(
    json_mode: bool,
    file: &Path,
    viewer_ref: &str,
    admin: bool,
    entity_id: Option<u64>,
) -> Result<(), WardenError> {
    let snapshot = load_snapshot(file)?;
    let project = snapshot.project.to_project();
    let viewer = viewer_from(viewer_ref, admin);
    let membership = snapshot.membership_for(&viewer.user);
    let counts = snapshot.counts.to_counts();

    let entity = match entity_id {
        Some(id) => Some(
            snapshot
                .entity(id)
                .ok_or(WardenError::EntityNotFound(EntityId(id)))?
                .to_entity(project.id),
        ),
        None => None,
    };

    let service = CapabilityService::new();
    let relation = service.relation_for(&viewer, &project, membership.as_ref());
    let capabilities =
        service.capabilities_for(&viewer, entity.as_ref(), &project, membership.as_ref())?;
    let transitions = service.legal_transitions_for(
        &viewer,
        entity.as_ref(),
        &project,
        membership.as_ref(),
        &counts,
    )?;

    let raw = entity.as_ref().map_or(project.status, |e| e.status);
    let phase = Status::decode_phase(raw)?;
    let scopes = Status::decode_scopes(raw);

    if json_mode {
        let report = DecisionReport {
            viewer: viewer.user.to_string(),
            relation,
            phase,
            scopes: scopes.names().iter().map(ToString::to_string).collect(),
            capabilities,
            transitions,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_default()
        );
        return Ok(());
    }

    let targets: Vec<&str> = transitions.iter().map(|p| p.name()).collect();

    println!("Decision for {}", viewer.user);
    println!("==================");
    println!("Relation:    {}", relation);
    println!("Phase:       {}", phase);
    println!("Scopes:      {}", scopes);
    println!("Read:        {}", capabilities.read);
    println!("Update:      {}", capabilities.update);
    println!("Manage:      {}", capabilities.manage);
    println!("List:        {}", if capabilities.list { "yes" } else { "no" });
    println!("Share:       {}", if capabilities.share { "yes" } else { "no" });
    println!(
        "Transitions: {}",
        if targets.is_empty() {
            "(none)".to_string()
        } else {
            targets.join(", ")
        }
    );

    Ok(())
}

// =============================================================================
// TRANSITION COMMAND
// =============================================================================

/// Apply a phase change against the store.
pub fn cmd_transition(
    db_path: &Path,
    json_mode: bool,
    entity_id: u64,
    viewer_ref: &str,
    admin: bool,
    expected: u32,
    target: u32,
    counts: &ContentCounts,
) -> Result<(), WardenError> {
    tracing::info!(
        "Applying transition for entity {} ({:#x} -> {:#x})",
        entity_id,
        expected,
        target
    );

    let store = RedbStore::open(db_path)?;
    let viewer = viewer_from(viewer_ref, admin);
    let service = CapabilityService::new();

    let outcome = apply_transition(
        &store,
        &service,
        &viewer,
        EntityId(entity_id),
        expected,
        target,
        counts,
    )?;

    if json_mode {
        let output = serde_json::json!({ "outcome": outcome });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    match outcome {
        TransitionOutcome::Applied { stored } => {
            let phase = Status::decode_phase(stored)?;
            println!("Applied. Stored status: {:#x} (phase {})", stored, phase);
        }
        TransitionOutcome::Denied(reason) => {
            println!("Denied: {}", reason);
        }
        TransitionOutcome::Conflict { actual } => {
            println!("Conflict: store now holds {:#x}. Re-read and retry.", actual);
        }
    }

    Ok(())
}
