//! # Capability Cache
//!
//! A shared read-through cache over matrix rows. The keyspace is tiny (kinds
//! times phases times relations), so rows live in a [`BTreeMap`] behind one
//! [`RwLock`] and never expire; invalidation is by entity kind or wholesale.
//!
//! The cache must never turn into a correctness hazard. Creator overrides
//! are applied by the service AFTER lookup, so cached rows stay per-relation
//! and viewer-independent. A poisoned lock degrades to uncached operation
//! instead of failing the decision.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::matrix::Capabilities;
use crate::relation::Relation;
use crate::status::Phase;
use crate::types::EntityKind;

/// Cache key: the full input of a matrix lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CacheKey {
    pub kind: EntityKind,
    pub phase: Phase,
    pub relation: Relation,
}

impl CacheKey {
    /// Build a key.
    #[must_use]
    pub const fn new(kind: EntityKind, phase: Phase, relation: Relation) -> Self {
        Self {
            kind,
            phase,
            relation,
        }
    }
}

/// Shared capability row cache with hit and miss counters.
#[derive(Debug, Default)]
pub struct CapabilityCache {
    rows: RwLock<BTreeMap<CacheKey, Capabilities>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CapabilityCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a row, counting the hit or miss.
    #[must_use]
    pub fn lookup(&self, key: CacheKey) -> Option<Capabilities> {
        let Ok(rows) = self.rows.read() else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        match rows.get(&key) {
            Some(caps) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(*caps)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or replace a row.
    pub fn store(&self, key: CacheKey, caps: Capabilities) {
        if let Ok(mut rows) = self.rows.write() {
            rows.insert(key, caps);
        }
    }

    /// Drop every row for one entity kind. Returns the number removed.
    pub fn invalidate_kind(&self, kind: EntityKind) -> usize {
        let Ok(mut rows) = self.rows.write() else {
            return 0;
        };
        let before = rows.len();
        rows.retain(|key, _| key.kind != kind);
        before - rows.len()
    }

    /// Drop every row.
    pub fn clear(&self) {
        if let Ok(mut rows) = self.rows.write() {
            rows.clear();
        }
    }

    /// Number of cached rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    /// Whether the cache holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups answered from the cache so far.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that fell through to the matrix so far.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

// =============================================================================
// TESTS
// =============================================================================
