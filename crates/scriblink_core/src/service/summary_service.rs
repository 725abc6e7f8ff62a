//! Summary use-case service.
//!
//! # Responsibility
//! - Store, read and delete per-item summaries.
//! - Generate summaries through the text-generation collaborator and store
//!   them only after validation.
//!
//! # Invariants
//! - Direct `set_summary` writes are stored as given.
//! - AI-generated text is stored only when `SummaryValidator` accepts it.
//! - Generation is attempted once per call; failures are never retried.

use crate::error::ErrorKind;
use crate::model::folder::ItemId;
use crate::model::summary::Summary;
use crate::repo::summary_repo::{SummaryRepoError, SummaryRepository};
use crate::summary::generator::{GeneratorError, SummaryGenerator};
use crate::summary::rules::SummaryRules;
use crate::summary::validator::{SummaryValidator, ValidationFailure};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Errors from summary service operations.
#[derive(Debug)]
pub enum SummaryServiceError {
    /// Source text is empty or whitespace-only.
    EmptySource,
    /// Text-generation collaborator failed.
    ModelUnavailable(GeneratorError),
    /// Model replied, but the reply was rejected.
    ValidationFailed(ValidationFailure),
    /// No summary is stored for the item.
    SummaryNotFound(ItemId),
    /// Repository-level failure.
    Repo(SummaryRepoError),
}

impl SummaryServiceError {
    /// Maps this error onto the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySource => ErrorKind::InvalidInput,
            Self::ModelUnavailable(_) => ErrorKind::UpstreamUnavailable,
            Self::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Self::SummaryNotFound(_) => ErrorKind::NotFound,
            Self::Repo(_) => ErrorKind::Storage,
        }
    }
}

impl Display for SummaryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySource => write!(f, "source text must not be empty"),
            Self::ModelUnavailable(err) => write!(f, "summary model unavailable: {err}"),
            Self::ValidationFailed(failure) => write!(f, "{failure}"),
            Self::SummaryNotFound(item) => write!(f, "summary not found for item {item}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SummaryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ModelUnavailable(err) => Some(err),
            Self::ValidationFailed(failure) => Some(failure),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SummaryRepoError> for SummaryServiceError {
    fn from(value: SummaryRepoError) -> Self {
        Self::Repo(value)
    }
}

pub type SummaryServiceResult<T> = Result<T, SummaryServiceError>;

/// Summary service facade.
pub struct SummaryService<R: SummaryRepository> {
    repo: R,
    generator: Arc<dyn SummaryGenerator>,
    validator: SummaryValidator,
}

impl<R: SummaryRepository> SummaryService<R> {
    /// Creates service from repository, generator and validation rules.
    pub fn new(repo: R, generator: Arc<dyn SummaryGenerator>, rules: SummaryRules) -> Self {
        Self {
            repo,
            generator,
            validator: SummaryValidator::new(rules),
        }
    }

    pub fn validator(&self) -> &SummaryValidator {
        &self.validator
    }

    /// Inserts or overwrites the summary for `item` without validation.
    pub fn set_summary(
        &self,
        item: ItemId,
        text: impl Into<String>,
    ) -> SummaryServiceResult<Summary> {
        let text = text.into();
        let summary = self.repo.upsert_summary(item, text.as_str())?;
        info!(
            "event=summary_set module=summary_service status=ok item={} source=direct chars={}",
            item,
            text.chars().count()
        );
        Ok(summary)
    }

    pub fn get_summary(&self, item: ItemId) -> SummaryServiceResult<Option<Summary>> {
        self.repo.get_summary(item).map_err(Into::into)
    }

    /// Deletes the summary for `item`.
    pub fn delete_summary(&self, item: ItemId) -> SummaryServiceResult<()> {
        if !self.repo.delete_summary(item)? {
            return Err(SummaryServiceError::SummaryNotFound(item));
        }
        Ok(())
    }

    /// Deletes summaries of all listed items; missing ones are ignored.
    ///
    /// Intended for cascades after a folder delete reports orphaned items.
    pub fn delete_summaries(&self, items: &[ItemId]) -> SummaryServiceResult<usize> {
        self.repo.delete_summaries(items).map_err(Into::into)
    }

    /// Checks a candidate summary against the configured rules.
    pub fn validate(&self, source: &str, candidate: &str) -> Result<(), ValidationFailure> {
        self.validator.validate(source, candidate)
    }

    /// Asks the generator for a summary of `source` and validates it.
    ///
    /// Returns the accepted (trimmed) text. Blank sources fail before the
    /// generator is called.
    pub fn generate_and_validate(&self, source: &str) -> SummaryServiceResult<String> {
        if source.trim().is_empty() {
            return Err(SummaryServiceError::EmptySource);
        }

        let generated = match self.generator.generate(source) {
            Ok(text) => text,
            Err(err) => {
                warn!(
                    "event=summary_generate module=summary_service status=error error_code=model_unavailable error={}",
                    err
                );
                return Err(SummaryServiceError::ModelUnavailable(err));
            }
        };

        let candidate = generated.trim();
        if let Err(failure) = self.validator.validate(source, candidate) {
            info!(
                "event=summary_generate module=summary_service status=rejected error_code={} words={} chars={}",
                failure.code(),
                candidate.split_whitespace().count(),
                candidate.chars().count()
            );
            return Err(SummaryServiceError::ValidationFailed(failure));
        }
        Ok(candidate.to_string())
    }

    /// Generates, validates and stores a summary for `item`.
    pub fn set_summary_with_ai(&self, item: ItemId, source: &str) -> SummaryServiceResult<Summary> {
        let text = self.generate_and_validate(source)?;
        let summary = self.repo.upsert_summary(item, text.as_str())?;
        info!(
            "event=summary_set module=summary_service status=ok item={} source=generated chars={}",
            item,
            text.chars().count()
        );
        Ok(summary)
    }
}
