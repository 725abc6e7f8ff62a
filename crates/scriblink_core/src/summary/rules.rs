//! Injectable thresholds and denylist for summary validation.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_MAX_WORDS: usize = 150;
pub const DEFAULT_MAX_LENGTH_RATIO: f64 = 0.5;
pub const DEFAULT_MIN_OVERLAP_RATIO: f64 = 0.2;

/// Boilerplate fragments typical of model disclaimers and filler.
///
/// Matched as lowercase substrings, so wording inside a legitimate summary
/// about AI can still trip them.
pub const DEFAULT_META_PHRASES: &[&str] = &[
    "as an ai",
    "as a language model",
    "i cannot",
    "i can't",
    "i am unable to",
    "i'm unable to",
    "i'm sorry",
    "the main points are",
    "here is a summary",
    "here's a summary",
    "this summary",
    "the summary could not be generated because the content was unclear or unrelated",
];

/// Validation thresholds. Every field falls back to its default when absent
/// from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryRules {
    /// Denylisted phrases, compared case-insensitively as substrings.
    pub meta_phrases: Vec<String>,
    /// Absolute cap on whitespace-separated words.
    pub max_words: usize,
    /// Cap on summary characters as a fraction of source characters.
    pub max_length_ratio: f64,
    /// Minimum share of distinct summary words also present in the source.
    pub min_overlap_ratio: f64,
}

impl Default for SummaryRules {
    fn default() -> Self {
        Self {
            meta_phrases: DEFAULT_META_PHRASES
                .iter()
                .map(|phrase| (*phrase).to_string())
                .collect(),
            max_words: DEFAULT_MAX_WORDS,
            max_length_ratio: DEFAULT_MAX_LENGTH_RATIO,
            min_overlap_ratio: DEFAULT_MIN_OVERLAP_RATIO,
        }
    }
}

impl SummaryRules {
    /// Rejects thresholds that would make every candidate pass or fail.
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.max_words == 0 {
            return Err(RulesError::ZeroWordLimit);
        }
        if !self.max_length_ratio.is_finite()
            || self.max_length_ratio <= 0.0
            || self.max_length_ratio > 1.0
        {
            return Err(RulesError::RatioOutOfRange {
                field: "max_length_ratio",
                value: self.max_length_ratio,
            });
        }
        if !self.min_overlap_ratio.is_finite()
            || self.min_overlap_ratio < 0.0
            || self.min_overlap_ratio > 1.0
        {
            return Err(RulesError::RatioOutOfRange {
                field: "min_overlap_ratio",
                value: self.min_overlap_ratio,
            });
        }
        if let Some(index) = self
            .meta_phrases
            .iter()
            .position(|phrase| phrase.trim().is_empty())
        {
            return Err(RulesError::BlankMetaPhrase(index));
        }
        Ok(())
    }
}

/// Invalid rule configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum RulesError {
    ZeroWordLimit,
    RatioOutOfRange { field: &'static str, value: f64 },
    /// A blank phrase would match every candidate.
    BlankMetaPhrase(usize),
}

impl Display for RulesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroWordLimit => write!(f, "max_words must be greater than zero"),
            Self::RatioOutOfRange { field, value } => {
                write!(f, "{field} must be within 0..=1, got {value}")
            }
            Self::BlankMetaPhrase(index) => {
                write!(f, "meta_phrases[{index}] must not be blank")
            }
        }
    }
}

impl Error for RulesError {}
