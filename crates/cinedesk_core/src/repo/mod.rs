//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the durable-storage contract for the catalog blob.
//! - Isolate SQLite and JSON encoding details from the service layer.
//!
//! # Invariants
//! - Repositories store and return whole records; no partial updates.

pub mod catalog_repo;
