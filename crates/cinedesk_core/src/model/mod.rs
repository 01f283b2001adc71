//! Catalog domain model.
//!
//! # Responsibility
//! - Define the persisted catalog shape shared by store, draft and FFI.
//! - Own the wire names used in the stored JSON blob.
//!
//! # Invariants
//! - A catalog always has exactly three category partitions.
//! - Movie ids are unique within one category.

pub mod catalog;
pub mod category;
pub mod movie;
