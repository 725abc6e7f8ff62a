//! Summary validation pipeline.
//!
//! # Responsibility
//! - Decide whether a candidate summary is acceptable for a source text.
//! - Define the seam to the external text-generation collaborator.
//!
//! # Invariants
//! - Validation is pure: no storage access, no shared state.
//! - Thresholds and the meta-language denylist come from `SummaryRules`.

pub mod generator;
pub mod rules;
pub mod text;
pub mod validator;
