//! Per-document insertion statistics.

use std::collections::BTreeMap;

use serde::Serialize;

/// Why a matched occurrence did not receive a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Comment, command name, unsafe argument or disallowed environment.
    UnsafeRegion,
    /// Concept or match is a stopword (`stop` heuristic).
    Stopword,
    /// Same concept inserted too few lines earlier in this chapter (`dist` heuristic).
    Distance,
    /// Concept contains an invalid substring (a path, a citation author list).
    InvalidConcept,
}

/// Counters collected while rewriting one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    /// Accepted occurrences.
    pub inserted: usize,
    /// Occurrences in unsafe regions.
    pub rejected_unsafe: usize,
    /// Occurrences rejected by the stopword heuristic.
    pub rejected_stopword: usize,
    /// Occurrences rejected by the distance heuristic.
    pub rejected_distance: usize,
    /// Occurrences of invalid concepts.
    pub rejected_invalid: usize,
    /// Chapter markers crossed.
    pub chapter_markers: usize,
    /// Accepted insertions per concept.
    pub per_concept: BTreeMap<String, usize>,
}

impl DocumentStats {
    /// Total matched occurrences, accepted or not.
    #[must_use]
    pub fn matched(&self) -> usize {
        self.inserted + self.rejected()
    }

    /// Total rejected occurrences.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected_unsafe + self.rejected_stopword + self.rejected_distance + self.rejected_invalid
    }

    /// Adds another document's counters to this one.
    pub fn merge(&mut self, other: &DocumentStats) {
        self.inserted += other.inserted;
        self.rejected_unsafe += other.rejected_unsafe;
        self.rejected_stopword += other.rejected_stopword;
        self.rejected_distance += other.rejected_distance;
        self.rejected_invalid += other.rejected_invalid;
        self.chapter_markers += other.chapter_markers;
        for (concept, count) in &other.per_concept {
            *self.per_concept.entry(concept.clone()).or_default() += count;
        }
    }

    /// Concepts sorted by insertion count (descending), then name.
    #[must_use]
    pub fn top_concepts(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .per_concept
            .iter()
            .map(|(concept, count)| (concept.as_str(), *count))
            .collect();
        ranked.sort_by(|(a, a_count), (b, b_count)| b_count.cmp(a_count).then(a.cmp(b)));
        ranked.truncate(limit);
        ranked
    }

    pub(crate) fn record_insertion(&mut self, concept: &str) {
        self.inserted += 1;
        *self.per_concept.entry(concept.to_string()).or_default() += 1;
    }

    pub(crate) fn record_rejection(&mut self, reason: Rejection) {
        match reason {
            Rejection::UnsafeRegion => self.rejected_unsafe += 1,
            Rejection::Stopword => self.rejected_stopword += 1,
            Rejection::Distance => self.rejected_distance += 1,
            Rejection::InvalidConcept => self.rejected_invalid += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_adds_counters_and_distribution() {
        let mut total = DocumentStats::default();
        let mut first = DocumentStats::default();
        first.record_insertion("graph");
        first.record_rejection(Rejection::Distance);
        let mut second = DocumentStats::default();
        second.record_insertion("graph");
        second.record_insertion("node");
        second.record_rejection(Rejection::UnsafeRegion);
        second.record_rejection(Rejection::InvalidConcept);

        total.merge(&first);
        total.merge(&second);

        assert_eq!(total.inserted, 3);
        assert_eq!(total.rejected(), 3);
        assert_eq!(total.rejected_invalid, 1);
        assert_eq!(total.matched(), 6);
        assert_eq!(total.per_concept["graph"], 2);
    }

    #[test]
    fn test_top_concepts_ranked_by_count_then_name() {
        let mut stats = DocumentStats::default();
        for concept in ["b", "a", "c", "c"] {
            stats.record_insertion(concept);
        }
        assert_eq!(stats.top_concepts(2), vec![("c", 2), ("a", 1)]);
    }
}
