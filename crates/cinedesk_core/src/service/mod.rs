//! Core use-case services.
//!
//! # Responsibility
//! - Own the in-memory catalog and mirror it to a repository.
//! - Hold admin form state and the active category for UI layers.
//!
//! # Invariants
//! - Services never bypass repository persistence contracts.
//! - Services remain storage-agnostic.

pub mod admin_session;
pub mod catalog_store;
pub mod clock;
pub mod draft;
