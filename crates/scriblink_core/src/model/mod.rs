//! Domain model for folders and item summaries.
//!
//! # Responsibility
//! - Define plain data records returned by repositories and services.
//!
//! # Invariants
//! - Identifiers are opaque UUIDs; this crate never interprets item or user ids.

pub mod folder;
pub mod summary;
