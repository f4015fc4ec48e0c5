//! Keyword candidates using YAKE (Yet Another Keyword Extractor).

use std::collections::HashSet;

use stop_words::{LANGUAGE, get};
use tracing::{debug, instrument};
use yake_rust::{Config, StopWords, get_n_best};

/// Longest keyword, in words.
pub const YAKE_MAX_NGRAMS: usize = 5;

/// Co-occurrence window, in words.
pub const YAKE_WINDOW_SIZE: usize = 1;

/// YAKE extractor with English stop words.
///
/// YAKE scores are lower-is-better; results keep that order.
pub struct YakeExtractor {
    stop_words: StopWords,
    config: Config,
}

impl std::fmt::Debug for YakeExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YakeExtractor").finish()
    }
}

impl Default for YakeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl YakeExtractor {
    /// Creates an extractor with English stop words.
    #[must_use]
    pub fn new() -> Self {
        let words: HashSet<String> = get(LANGUAGE::English)
            .iter()
            .map(|word| word.to_lowercase())
            .collect();
        Self {
            stop_words: StopWords::custom(words),
            config: Config {
                ngrams: YAKE_MAX_NGRAMS,
                window_size: YAKE_WINDOW_SIZE,
                ..Config::default()
            },
        }
    }

    /// Returns at most `number` `(keyword, score)` pairs, best (lowest score) first.
    #[must_use]
    #[instrument(skip_all, fields(text_len = text.len(), number))]
    pub fn extract(&self, text: &str, number: usize) -> Vec<(String, f64)> {
        if text.trim().is_empty() || number == 0 {
            return Vec::new();
        }
        let keywords: Vec<(String, f64)> = get_n_best(number, text, &self.stop_words, &self.config)
            .into_iter()
            .map(|item| (item.raw, item.score))
            .collect();
        debug!(count = keywords.len(), "YAKE keywords extracted");
        keywords
    }
}
