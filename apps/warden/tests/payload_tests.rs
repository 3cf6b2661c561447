//! Unit tests for snapshot file and decision report serialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use warden::payload::{
    CountsRecord, DecisionReport, MembershipRecord, ProjectRecord, SnapshotFile, viewer_from,
};
use warden_core::{
    Capabilities, EntityKind, Phase, ProjectId, ProjectType, Relation, RoleBits, UserRef,
};

const FULL_SNAPSHOT: &str = r#"{
    "project": {
        "id": 1,
        "owner": "owner@example.org",
        "kind": "topic",
        "team_size": 5,
        "status": 64
    },
    "entities": [
        { "id": 10, "kind": "post", "creator": "ana@example.org", "status": 64 },
        { "id": 11, "kind": "image", "creator": "bo@example.org" }
    ],
    "memberships": [
        { "user": "ana@example.org", "roles": "MEMBER" },
        { "user": "carl@example.org", "roles": "CREATOR | MEMBER" }
    ],
    "counts": { "posts": 2, "cover_images": 1 }
}"#;

// =============================================================================
// SNAPSHOT FILE TESTS
// =============================================================================

#[test]
fn full_snapshot_parses() {
    let snapshot: SnapshotFile = serde_json::from_str(FULL_SNAPSHOT).unwrap();

    assert_eq!(snapshot.project.id, 1);
    assert_eq!(snapshot.project.kind, ProjectType::Topic);
    assert_eq!(snapshot.entities.len(), 2);
    assert_eq!(snapshot.memberships.len(), 2);
    assert_eq!(snapshot.counts.posts, 2);
    assert_eq!(snapshot.counts.events, 0);
}

#[test]
fn minimal_snapshot_fills_defaults() {
    let json = r#"{
        "project": { "id": 7, "owner": "owner@example.org", "kind": "special", "team_size": 2 }
    }"#;
    let snapshot: SnapshotFile = serde_json::from_str(json).unwrap();

    assert!(snapshot.entities.is_empty());
    assert!(snapshot.memberships.is_empty());
    assert_eq!(snapshot.counts.posts, 0);
    assert_eq!(snapshot.project.status, None);
}

#[test]
fn unknown_entity_kind_is_rejected() {
    let json = r#"{
        "project": { "id": 1, "owner": "o@example.org", "kind": "topic", "team_size": 1 },
        "entities": [ { "id": 5, "kind": "widget", "creator": "a@example.org" } ]
    }"#;
    assert!(serde_json::from_str::<SnapshotFile>(json).is_err());
}

#[test]
fn project_record_without_status_starts_new() {
    let record = ProjectRecord {
        id: 3,
        owner: "owner@example.org".to_string(),
        kind: ProjectType::Regio,
        team_size: 9,
        status: None,
    };
    let project = record.to_project();
    assert_eq!(project.status, Phase::New.threshold());
    assert_eq!(project.id, ProjectId(3));
}

#[test]
fn project_record_keeps_explicit_status() {
    let record = ProjectRecord {
        id: 3,
        owner: "owner@example.org".to_string(),
        kind: ProjectType::Topic,
        team_size: 9,
        status: Some(Phase::Released.threshold()),
    };
    assert_eq!(record.to_project().status, Phase::Released.threshold());
}

#[test]
fn entity_record_defaults_to_the_zero_word() {
    let snapshot: SnapshotFile = serde_json::from_str(FULL_SNAPSHOT).unwrap();
    let image = snapshot.entity(11).unwrap();
    assert_eq!(image.status, 0);
    assert_eq!(image.kind, EntityKind::Image);

    let entity = image.to_entity(ProjectId(1));
    assert_eq!(entity.project, ProjectId(1));
    assert_eq!(entity.status, 0);
}

#[test]
fn membership_lookup_normalizes_the_principal() {
    let snapshot: SnapshotFile = serde_json::from_str(FULL_SNAPSHOT).unwrap();

    let found = snapshot.membership_for(&UserRef::new("  ANA@Example.org "));
    assert_eq!(
        found.map(|m| m.roles),
        Some(RoleBits::MEMBER),
    );
    assert!(snapshot
        .membership_for(&UserRef::new("stranger@example.org"))
        .is_none());
}

#[test]
fn combined_role_bits_round_trip() {
    let record = MembershipRecord {
        user: "carl@example.org".to_string(),
        roles: RoleBits::CREATOR | RoleBits::MEMBER,
    };
    let json = serde_json::to_string(&record).unwrap();
    let back: MembershipRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back.roles, RoleBits::CREATOR | RoleBits::MEMBER);
}

#[test]
fn counts_record_converts_field_for_field() {
    let record = CountsRecord {
        posts: 1,
        events: 2,
        members: 3,
        associations: 4,
        cover_images: 5,
    };
    let counts = record.to_counts();
    assert_eq!(counts.posts, 1);
    assert_eq!(counts.events, 2);
    assert_eq!(counts.members, 3);
    assert_eq!(counts.associations, 4);
    assert_eq!(counts.cover_images, 5);
}

// =============================================================================
// DECISION REPORT TESTS
// =============================================================================

#[test]
fn decision_report_serializes_with_wire_names() {
    let report = DecisionReport {
        viewer: "ana@example.org".to_string(),
        relation: Relation::Member,
        phase: Phase::Draft,
        scopes: vec!["team".to_string()],
        capabilities: Capabilities::none(),
        transitions: vec![Phase::Review, Phase::Trash],
    };

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"relation\":\"member\""));
    assert!(json.contains("\"phase\":\"draft\""));
    assert!(json.contains("\"transitions\":[\"review\",\"trash\"]"));
    assert!(json.contains("\"read\":\"none\""));
}

#[test]
fn decision_report_round_trips() {
    let report = DecisionReport {
        viewer: "4711".to_string(),
        relation: Relation::Owner,
        phase: Phase::Confirmed,
        scopes: vec![],
        capabilities: Capabilities::none(),
        transitions: vec![Phase::Released],
    };
    let json = serde_json::to_string(&report).unwrap();
    let back: DecisionReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.relation, Relation::Owner);
    assert_eq!(back.transitions, vec![Phase::Released]);
}

// =============================================================================
// VIEWER HELPER TESTS
// =============================================================================

#[test]
fn viewer_from_carries_the_admin_flag() {
    let plain = viewer_from("ana@example.org", false);
    assert!(!plain.is_admin);
    assert_eq!(plain.user, UserRef::new("ana@example.org"));

    let admin = viewer_from("root@example.org", true);
    assert!(admin.is_admin);
}
