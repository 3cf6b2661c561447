//! # Warden - Decision CLI
//!
//! Library surface of the Warden binary. The modules here are thin plumbing
//! around `warden-core`: parsing snapshot files, formatting decisions, and
//! driving the redb-backed store. All authorization logic lives in the core
//! crate; nothing in this crate decides anything on its own.

// ===== MODULES =====

pub mod cli;
pub mod payload;
