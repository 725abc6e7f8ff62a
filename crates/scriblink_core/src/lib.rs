//! Core domain logic for Scriblink.
//! This crate is the single source of truth for folder hierarchy and summary
//! validation invariants.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod summary;

pub use config::{load_config, ConfigError, CoreConfig};
pub use error::ErrorKind;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::folder::{Folder, FolderId, ItemId, UserId, ROOT_FOLDER_TITLE};
pub use model::summary::Summary;
pub use repo::folder_repo::{
    FolderRepoError, FolderRepoResult, FolderRepository, SqliteFolderRepository,
};
pub use repo::summary_repo::{
    SqliteSummaryRepository, SummaryRepoError, SummaryRepoResult, SummaryRepository,
};
pub use service::folder_service::{
    FolderDeletion, FolderService, FolderServiceError, FolderServiceResult,
};
pub use service::summary_service::{SummaryService, SummaryServiceError, SummaryServiceResult};
pub use summary::generator::{build_summary_prompt, GeneratorError, SummaryGenerator};
pub use summary::rules::{RulesError, SummaryRules};
pub use summary::validator::{LengthLimit, SummaryValidator, ValidationFailure, ValidationReport};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
