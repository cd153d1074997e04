//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the campaign aggregate load/commit contract.
//! - Isolate SQLite query details from engines and service orchestration.
//!
//! # Invariants
//! - Repository writes validate prospect records before persistence.
//! - Commits are all-or-nothing and guarded by the campaign version.

pub mod campaign_repo;
