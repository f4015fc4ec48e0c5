//! Keyword candidates using RAKE (Rapid Automatic Keyword Extraction).

use std::collections::HashMap;

use rake::{Rake, StopWords};
use stop_words::{LANGUAGE, get};
use tracing::{debug, instrument};

/// Longest accepted keyword, in words.
pub const MAX_WORDS: usize = 4;

/// Minimum occurrences of a keyword in the text.
pub const MIN_FREQUENCY: usize = 3;

/// Shortest accepted keyword, in characters.
pub const MIN_CHARACTERS: usize = 2;

/// Scores at or below this are discarded.
pub const MIN_SCORE: f64 = 1.0;

/// RAKE extractor with English stop words.
pub struct RakeExtractor {
    rake: Rake,
}

impl std::fmt::Debug for RakeExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RakeExtractor").finish()
    }
}

impl Default for RakeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RakeExtractor {
    /// Creates an extractor with English stop words.
    #[must_use]
    #[instrument]
    pub fn new() -> Self {
        let mut sw = StopWords::new();
        for word in get(LANGUAGE::English) {
            sw.insert(word);
        }
        Self {
            rake: Rake::new(sw),
        }
    }

    /// Returns `(keyword, score)` pairs, best first.
    ///
    /// Keywords longer than [`MAX_WORDS`] words, shorter than
    /// [`MIN_CHARACTERS`], seen fewer than [`MIN_FREQUENCY`] times or
    /// scoring at most [`MIN_SCORE`] are dropped. Equal scores are ordered
    /// alphabetically.
    #[must_use]
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub fn extract(&self, text: &str) -> Vec<(String, f64)> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let frequencies = phrase_frequencies(text);
        let mut keywords: Vec<(String, f64)> = self
            .rake
            .run(text)
            .into_iter()
            .filter(|ks| ks.score > MIN_SCORE)
            .filter(|ks| ks.keyword.chars().count() >= MIN_CHARACTERS)
            .filter(|ks| {
                let words = words(&ks.keyword);
                !words.is_empty()
                    && words.len() <= MAX_WORDS
                    && frequencies.get(&words.join(" ")).copied().unwrap_or(0) >= MIN_FREQUENCY
            })
            .map(|ks| (ks.keyword, ks.score))
            .collect();

        keywords.sort_by(|(a, a_score), (b, b_score)| b_score.total_cmp(a_score).then(a.cmp(b)));
        keywords.dedup_by(|a, b| a.0 == b.0);
        debug!(count = keywords.len(), "rake keywords");
        keywords
    }
}

/// Lowercased words of `text`, split on anything that is not part of a word.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Counts every phrase of up to [`MAX_WORDS`] consecutive words.
fn phrase_frequencies(text: &str) -> HashMap<String, usize> {
    let words = words(text);
    let mut counts = HashMap::new();
    for start in 0..words.len() {
        let mut phrase = String::new();
        for word in words.iter().skip(start).take(MAX_WORDS) {
            if !phrase.is_empty() {
                phrase.push(' ');
            }
            phrase.push_str(word);
            *counts.entry(phrase.clone()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Graph databases. Column stores. Graph databases. \
        Key value stores. Graph databases.";

    #[test]
    fn test_extract_empty_input() {
        let extractor = RakeExtractor::new();
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("   \n").is_empty());
    }

    #[test]
    fn test_extract_keeps_frequent_phrases() {
        let keywords = RakeExtractor::new().extract(TEXT);
        let names: Vec<&str> = keywords.iter().map(|(k, _)| k.as_str()).collect();
        assert!(
            names.iter().any(|k| k.eq_ignore_ascii_case("graph databases")),
            "{names:?}"
        );
    }

    #[test]
    fn test_extract_drops_rare_phrases() {
        let keywords = RakeExtractor::new().extract(TEXT);
        assert!(
            keywords
                .iter()
                .all(|(k, _)| !k.to_lowercase().contains("column"))
        );
    }

    #[test]
    fn test_extract_scores_above_threshold_and_sorted() {
        let keywords = RakeExtractor::new().extract(TEXT);
        assert!(keywords.iter().all(|(_, score)| *score > MIN_SCORE));
        assert!(keywords.windows(2).all(|pair| pair[0].1 >= pair[1].1));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let extractor = RakeExtractor::new();
        assert_eq!(extractor.extract(TEXT), extractor.extract(TEXT));
    }

    #[test]
    fn test_phrase_frequencies_counts_ngrams() {
        let counts = phrase_frequencies("a b a b");
        assert_eq!(counts["a b"], 2);
        assert_eq!(counts["b a"], 1);
        assert_eq!(counts["a b a b"], 1);
    }
}
