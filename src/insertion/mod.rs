//! Match insertion engine.
//!
//! Rewrites one document by placing an index marker directly after each
//! qualifying occurrence of a concept trigger. The scan is a single linear
//! pass; every byte outside the inserted markers is copied unchanged.
//!
//! # Example
//!
//! ```
//! use texindex_core::concepts::{ConceptEntry, ConceptTable};
//! use texindex_core::insertion::{InsertionConfig, Inserter};
//!
//! let mut table = ConceptTable::new();
//! table.push(ConceptEntry::new("neural network", "neural network", 1.0));
//!
//! let inserter = Inserter::new(&table, InsertionConfig::default());
//! let rewrite = inserter.rewrite("A neural network learns.\n");
//! assert_eq!(
//!     rewrite.text,
//!     "A neural network\\index{neural network} learns.\n"
//! );
//! ```

mod escape;
mod lexer;
mod matcher;
mod stats;

pub use crate::concepts::ValidationWarning;
pub use escape::{escape_concept, index_marker};
pub use lexer::{DEFAULT_ALLOWED_ENVIRONMENTS, DEFAULT_UNSAFE_COMMANDS, LexicalRules};
pub use stats::{DocumentStats, Rejection};

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, trace, warn};

use crate::concepts::ConceptTable;
use crate::corpus::ChapterMarker;
use lexer::Lexer;
use matcher::Matcher;

/// Default number of lines between two insertions of the same concept.
pub const DEFAULT_DISTANCE: usize = 200;

/// Default marker command.
pub const DEFAULT_INDEX_COMMAND: &str = "index";

/// Substrings that make a concept invalid: paths and citation author lists.
pub const DEFAULT_INVALID_CONCEPT_SUBSTRINGS: &[&str] = &["/", "et al"];

/// Strings (concepts or matches) that never trigger an insertion under the
/// `stop` heuristic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopwordSet(HashSet<String>);

impl StopwordSet {
    /// Returns `true` if `word` is a stopword (exact, case-sensitive).
    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }

    /// Number of stopwords.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no stopwords.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for StopwordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Minimum line distance between two insertions of one concept in a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceThreshold(pub usize);

impl Default for DistanceThreshold {
    fn default() -> Self {
        Self(DEFAULT_DISTANCE)
    }
}

impl DistanceThreshold {
    /// Threshold in lines.
    #[must_use]
    pub fn lines(self) -> usize {
        self.0
    }
}

/// Independently toggleable insertion heuristics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Heuristics {
    /// Reject stopword concepts and matches.
    pub stop: bool,
    /// Enforce the per-chapter distance threshold.
    pub dist: bool,
}

impl Heuristics {
    /// Both heuristics enabled.
    #[must_use]
    pub fn all() -> Self {
        Self {
            stop: true,
            dist: true,
        }
    }
}

/// Immutable settings of one insertion run.
#[derive(Debug, Clone)]
pub struct InsertionConfig {
    /// Stopwords for the `stop` heuristic.
    pub stopwords: StopwordSet,
    /// Threshold for the `dist` heuristic.
    pub distance: DistanceThreshold,
    /// Enabled heuristics.
    pub heuristics: Heuristics,
    /// Unsafe commands and allowed environments.
    pub lexical: LexicalRules,
    /// Chapter boundary heuristic.
    pub chapter_marker: ChapterMarker,
    /// Marker command name, without backslash.
    pub index_command: String,
    /// Concepts containing any of these never receive a marker.
    pub invalid_substrings: Vec<String>,
}

impl Default for InsertionConfig {
    fn default() -> Self {
        Self {
            stopwords: StopwordSet::default(),
            distance: DistanceThreshold::default(),
            heuristics: Heuristics::default(),
            lexical: LexicalRules::default(),
            chapter_marker: ChapterMarker::default(),
            index_command: DEFAULT_INDEX_COMMAND.to_string(),
            invalid_substrings: DEFAULT_INVALID_CONCEPT_SUBSTRINGS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Rewritten document text and its statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Full text with markers inserted.
    pub text: String,
    /// Counters for this document.
    pub stats: DocumentStats,
}

#[derive(Debug)]
struct ActiveEntry {
    concept: String,
    stopword: bool,
    invalid: bool,
    marker: String,
}

/// Prepared concept table plus configuration; rewrites documents.
///
/// `Inserter` holds no per-document state, so one instance can be shared
/// across worker threads.
#[derive(Debug)]
pub struct Inserter {
    entries: Vec<ActiveEntry>,
    matcher: Matcher,
    marker_prefix: String,
    config: InsertionConfig,
    warnings: Vec<ValidationWarning>,
}

impl Inserter {
    /// Prepares the table for scanning.
    ///
    /// Entries with an empty match are skipped with a
    /// [`ValidationWarning::EmptyMatch`]. Entries whose concept contains an
    /// invalid substring stay matchable so their occurrences are counted as
    /// rejected.
    #[must_use]
    #[instrument(skip(table, config), fields(entries = table.len()))]
    pub fn new(table: &ConceptTable, config: InsertionConfig) -> Self {
        let mut entries = Vec::with_capacity(table.len());
        let mut triggers = Vec::with_capacity(table.len());
        let mut warnings = Vec::new();

        for (index, entry) in table.entries().iter().enumerate() {
            if entry.match_text.is_empty() {
                let position = index + 1;
                warn!(entry = position, concept = %entry.concept, "empty match, entry skipped");
                warnings.push(ValidationWarning::EmptyMatch {
                    entry: position,
                    concept: entry.concept.clone(),
                });
                continue;
            }
            let stopword = config.stopwords.contains(&entry.concept)
                || config.stopwords.contains(&entry.match_text);
            let invalid = config
                .invalid_substrings
                .iter()
                .any(|needle| !needle.is_empty() && entry.concept.contains(needle.as_str()));
            if invalid {
                debug!(concept = %entry.concept, "invalid concept, occurrences will be rejected");
            }
            triggers.push((entries.len(), entry.match_text.as_str()));
            entries.push(ActiveEntry {
                concept: entry.concept.clone(),
                stopword,
                invalid,
                marker: index_marker(&config.index_command, &entry.concept),
            });
        }

        Self {
            matcher: Matcher::new(triggers),
            marker_prefix: format!("\\{}{{", config.index_command),
            entries,
            config,
            warnings,
        }
    }

    /// Warnings raised while preparing the table.
    #[must_use]
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &InsertionConfig {
        &self.config
    }

    /// Rewrites `text`, returning the new text and statistics.
    ///
    /// Pure function of (text, table, config): the same input always yields
    /// the same output.
    #[must_use]
    pub fn rewrite(&self, text: &str) -> Rewrite {
        let boundaries = self.config.chapter_marker.boundaries(text);
        let mut next_boundary = 0;
        let mut lexer = Lexer::new(&self.config.lexical);
        let mut last_inserted: HashMap<&str, usize> = HashMap::new();
        let mut stats = DocumentStats::default();
        let mut rewritten = String::with_capacity(text.len() + text.len() / 8);

        let (mut line, mut column) = (0usize, 0usize);
        let mut pos = 0usize;

        while pos < text.len() {
            while next_boundary < boundaries.len() && boundaries[next_boundary] <= pos {
                last_inserted.clear();
                stats.chapter_markers += 1;
                next_boundary += 1;
            }

            if let Some((index, length)) = self.matcher.find_at(text, pos) {
                let entry = &self.entries[index];
                let end = pos + length;
                let already_indexed = text[end..].starts_with(self.marker_prefix.as_str());
                let safe = lexer.is_safe() && !already_indexed;
                let verdict = self.judge(entry, safe, line, &last_inserted);
                let occurrence = &text[pos..end];
                rewritten.push_str(occurrence);

                match verdict {
                    Ok(()) => {
                        rewritten.push_str(&entry.marker);
                        last_inserted.insert(entry.concept.as_str(), line);
                        stats.record_insertion(&entry.concept);
                        trace!(line, column, concept = %entry.concept, "index entry inserted");
                    }
                    Err(reason) => {
                        stats.record_rejection(reason);
                        trace!(line, column, concept = %entry.concept, ?reason, "occurrence rejected");
                    }
                }

                for ch in occurrence.chars() {
                    lexer.feed(ch);
                    advance(&mut line, &mut column, ch);
                }
                pos = end;
                continue;
            }

            let Some(ch) = text[pos..].chars().next() else {
                break;
            };
            rewritten.push(ch);
            lexer.feed(ch);
            advance(&mut line, &mut column, ch);
            pos += ch.len_utf8();
        }

        Rewrite {
            text: rewritten,
            stats,
        }
    }

    fn judge(
        &self,
        entry: &ActiveEntry,
        safe: bool,
        line: usize,
        last_inserted: &HashMap<&str, usize>,
    ) -> Result<(), Rejection> {
        if entry.invalid {
            return Err(Rejection::InvalidConcept);
        }
        if !safe {
            return Err(Rejection::UnsafeRegion);
        }
        let heuristics = self.config.heuristics;
        if heuristics.stop && entry.stopword {
            return Err(Rejection::Stopword);
        }
        if heuristics.dist
            && last_inserted
                .get(entry.concept.as_str())
                .is_some_and(|&last| line - last < self.config.distance.lines())
        {
            return Err(Rejection::Distance);
        }
        Ok(())
    }
}

fn advance(line: &mut usize, column: &mut usize, ch: char) {
    if ch == '\n' {
        *line += 1;
        *column = 0;
    } else {
        *column += 1;
    }
}
