//! Candidate summary validation.
//!
//! # Invariants
//! - Checks run in a fixed order: length, meta-language, relevance. The
//!   first failing check is the reported reason.
//! - Human-written and model-generated candidates go through identical
//!   checks.

use crate::summary::rules::SummaryRules;
use crate::summary::text::{char_length, overlap_ratio, word_count};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which length threshold a candidate exceeded.
#[derive(Debug, Clone, PartialEq)]
pub enum LengthLimit {
    /// Absolute word cap.
    WordLimit { words: usize, max_words: usize },
    /// Character cap derived from the source length.
    SourceRatio {
        length: usize,
        max_length: usize,
        ratio: f64,
    },
}

/// Reason a candidate summary was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    LengthExceeded(LengthLimit),
    /// Candidate contains a denylisted phrase (reported lowercase).
    MetaLanguageDetected { phrase: String },
    LowRelevance {
        overlap_ratio: f64,
        min_overlap_ratio: f64,
    },
}

impl ValidationFailure {
    /// Stable code used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::LengthExceeded(_) => "length_exceeded",
            Self::MetaLanguageDetected { .. } => "meta_language_detected",
            Self::LowRelevance { .. } => "low_relevance",
        }
    }
}

impl Display for ValidationFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LengthExceeded(LengthLimit::WordLimit { words, max_words }) => write!(
                f,
                "summary is too long: {words} words exceeds the {max_words}-word limit"
            ),
            Self::LengthExceeded(LengthLimit::SourceRatio {
                length,
                max_length,
                ratio,
            }) => write!(
                f,
                "summary is too long: {length} characters exceeds {max_length} ({:.0}% of the source)",
                ratio * 100.0
            ),
            Self::MetaLanguageDetected { phrase } => {
                write!(f, "summary contains meta-language: \"{phrase}\"")
            }
            Self::LowRelevance {
                overlap_ratio,
                min_overlap_ratio,
            } => write!(
                f,
                "summary is not relevant to the source: {:.1}% word overlap, {:.1}% required",
                overlap_ratio * 100.0,
                min_overlap_ratio * 100.0
            ),
        }
    }
}

impl Error for ValidationFailure {}

/// Metrics computed for one candidate, regardless of outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub word_count: usize,
    pub length: usize,
    pub source_length: usize,
    pub overlap_ratio: f64,
    /// First denylisted phrase found, if any.
    pub meta_phrase: Option<String>,
    /// First failing check in validation order.
    pub failure: Option<ValidationFailure>,
}

impl ValidationReport {
    pub fn is_accepted(&self) -> bool {
        self.failure.is_none()
    }
}

/// Summary validator bound to one rule set.
#[derive(Debug, Clone)]
pub struct SummaryValidator {
    rules: SummaryRules,
    phrases: Vec<String>,
}

impl Default for SummaryValidator {
    fn default() -> Self {
        Self::new(SummaryRules::default())
    }
}

impl SummaryValidator {
    pub fn new(rules: SummaryRules) -> Self {
        let phrases = rules
            .meta_phrases
            .iter()
            .map(|phrase| phrase.trim().to_lowercase())
            .filter(|phrase| !phrase.is_empty())
            .collect();
        Self { rules, phrases }
    }

    pub fn rules(&self) -> &SummaryRules {
        &self.rules
    }

    /// Accepts `candidate` or returns the first failing check.
    pub fn validate(&self, source: &str, candidate: &str) -> Result<(), ValidationFailure> {
        self.check_length(source, candidate)?;
        self.check_meta_language(candidate)?;
        self.check_relevance(source, candidate)?;
        Ok(())
    }

    /// Computes every metric and the validation outcome for diagnostics.
    pub fn inspect(&self, source: &str, candidate: &str) -> ValidationReport {
        ValidationReport {
            word_count: word_count(candidate),
            length: char_length(candidate),
            source_length: char_length(source),
            overlap_ratio: overlap_ratio(source, candidate),
            meta_phrase: self.find_meta_phrase(candidate).map(str::to_string),
            failure: self.validate(source, candidate).err(),
        }
    }

    fn check_length(&self, source: &str, candidate: &str) -> Result<(), ValidationFailure> {
        let words = word_count(candidate);
        if words > self.rules.max_words {
            return Err(ValidationFailure::LengthExceeded(LengthLimit::WordLimit {
                words,
                max_words: self.rules.max_words,
            }));
        }

        let length = char_length(candidate);
        let allowed = self.rules.max_length_ratio * char_length(source) as f64;
        if length as f64 > allowed {
            return Err(ValidationFailure::LengthExceeded(LengthLimit::SourceRatio {
                length,
                max_length: allowed.floor() as usize,
                ratio: self.rules.max_length_ratio,
            }));
        }
        Ok(())
    }

    fn check_meta_language(&self, candidate: &str) -> Result<(), ValidationFailure> {
        match self.find_meta_phrase(candidate) {
            Some(phrase) => Err(ValidationFailure::MetaLanguageDetected {
                phrase: phrase.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn check_relevance(&self, source: &str, candidate: &str) -> Result<(), ValidationFailure> {
        let ratio = overlap_ratio(source, candidate);
        if ratio < self.rules.min_overlap_ratio {
            return Err(ValidationFailure::LowRelevance {
                overlap_ratio: ratio,
                min_overlap_ratio: self.rules.min_overlap_ratio,
            });
        }
        Ok(())
    }

    fn find_meta_phrase(&self, candidate: &str) -> Option<&str> {
        let lowered = candidate.to_lowercase();
        self.phrases
            .iter()
            .find(|phrase| lowered.contains(phrase.as_str()))
            .map(String::as_str)
    }
}
