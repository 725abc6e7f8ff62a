//! Core use-case services.
//!
//! # Responsibility
//! - Enforce business invariants on top of repository calls.
//! - Keep callers decoupled from storage details.

pub mod folder_service;
pub mod summary_service;
