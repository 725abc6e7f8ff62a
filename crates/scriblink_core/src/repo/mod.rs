//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define storage contracts consumed by the folder and summary services.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repositories enforce storage-level uniqueness only; ownership and
//!   acyclicity checks belong to the service layer.
//! - Repository APIs return semantic errors (`FolderNotFound`) in addition
//!   to DB transport errors.

pub mod folder_repo;
pub mod summary_repo;
