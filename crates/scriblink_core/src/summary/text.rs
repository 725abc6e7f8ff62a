//! Text metrics used by summary validation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid word regex"));

/// Counts whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Length in Unicode scalar values.
pub fn char_length(text: &str) -> usize {
    text.chars().count()
}

/// Lowercase distinct words, split on whitespace and punctuation.
pub fn word_set(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|word| word.as_str().to_string())
        .collect()
}

/// Share of the candidate's distinct words that also occur in the source.
///
/// A candidate without words scores `0.0`.
pub fn overlap_ratio(source: &str, candidate: &str) -> f64 {
    let candidate_words = word_set(candidate);
    if candidate_words.is_empty() {
        return 0.0;
    }
    let source_words = word_set(source);
    let shared = candidate_words
        .iter()
        .filter(|word| source_words.contains(*word))
        .count();
    shared as f64 / candidate_words.len() as f64
}
