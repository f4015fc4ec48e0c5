//! Chapter boundary detection.

use std::sync::LazyLock;

use regex::Regex;

use super::error::CorpusError;

/// Default marker: `\part` and `\chapter` (starred or not) followed by an argument.
pub const DEFAULT_CHAPTER_MARKER: &str = r"\\(?:part|chapter)\*?\s*[\[{]";

#[allow(clippy::expect_used)]
static DEFAULT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DEFAULT_CHAPTER_MARKER).expect("default chapter marker regex is valid") // Static pattern, safe to panic
});

/// Regex heuristic locating the commands that start a new chapter.
#[derive(Debug, Clone)]
pub struct ChapterMarker {
    pattern: Regex,
}

impl ChapterMarker {
    /// Compiles a marker pattern.
    ///
    /// # Errors
    /// Returns [`CorpusError::InvalidMarker`] if the pattern is not a valid regex.
    pub fn new(pattern: &str) -> Result<Self, CorpusError> {
        Regex::new(pattern)
            .map(|pattern| Self { pattern })
            .map_err(|source| CorpusError::InvalidMarker {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Returns the pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Byte offsets of every marker occurrence outside comments, ascending.
    ///
    /// A document without markers is a single chapter.
    #[must_use]
    pub fn boundaries(&self, text: &str) -> Vec<usize> {
        self.pattern
            .find_iter(text)
            .map(|found| found.start())
            .filter(|&offset| !is_commented(text, offset))
            .collect()
    }
}

impl Default for ChapterMarker {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

/// True when an unescaped `%` precedes `offset` on its line.
fn is_commented(text: &str, offset: usize) -> bool {
    let line_start = text[..offset].rfind('\n').map_or(0, |index| index + 1);
    let mut backslashes = 0usize;
    for ch in text[line_start..offset].chars() {
        match ch {
            '%' if backslashes % 2 == 0 => return true,
            '\\' => {
                backslashes += 1;
                continue;
            }
            _ => {}
        }
        backslashes = 0;
    }
    false
}
