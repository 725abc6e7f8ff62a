//! Text-generation collaborator seam.
//!
//! The crate never talks to a model itself. Callers plug in any
//! `SummaryGenerator`, including plain closures.

use crate::summary::rules::SummaryRules;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by a text-generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorError {
    message: String,
}

impl GeneratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for GeneratorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "text generation failed: {}", self.message)
    }
}

impl Error for GeneratorError {}

/// Produces a candidate summary for a source text.
///
/// Output is untrusted; it is validated before anything is stored.
pub trait SummaryGenerator: Send + Sync {
    fn generate(&self, source: &str) -> Result<String, GeneratorError>;
}

impl<F> SummaryGenerator for F
where
    F: Fn(&str) -> Result<String, GeneratorError> + Send + Sync,
{
    fn generate(&self, source: &str) -> Result<String, GeneratorError> {
        self(source)
    }
}

/// Builds instruction text for model-backed generators.
///
/// The constraints mirror the validator so a well-behaved model answer
/// passes on the first attempt.
pub fn build_summary_prompt(source: &str, rules: &SummaryRules) -> String {
    format!(
        "Summarize the following notes for a student.\n\
         Rules:\n\
         - Use at most {max_words} words and stay under {ratio:.0}% of the original length.\n\
         - Reuse key terms from the notes.\n\
         - Reply with the summary only: no preamble, no disclaimers, no mention of being an AI.\n\
         \n\
         Notes:\n\
         {source}",
        max_words = rules.max_words,
        ratio = rules.max_length_ratio * 100.0,
        source = source.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::{build_summary_prompt, GeneratorError, SummaryGenerator};
    use crate::summary::rules::SummaryRules;

    #[test]
    fn closures_act_as_generators() {
        let generator = |source: &str| -> Result<String, GeneratorError> {
            Ok(source.split_whitespace().take(2).collect::<Vec<_>>().join(" "))
        };
        assert_eq!(generator.generate("one two three").unwrap(), "one two");
    }

    #[test]
    fn prompt_carries_thresholds_and_source() {
        let prompt = build_summary_prompt("  Cell biology notes  ", &SummaryRules::default());
        assert!(prompt.contains("at most 150 words"));
        assert!(prompt.contains("50%"));
        assert!(prompt.ends_with("Cell biology notes"));
    }

    #[test]
    fn error_message_is_preserved() {
        let err = GeneratorError::new("timeout after 30s");
        assert_eq!(err.message(), "timeout after 30s");
        assert!(err.to_string().contains("timeout after 30s"));
    }
}
