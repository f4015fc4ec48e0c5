//! Concept extraction stage.
//!
//! Converts the manuscript to plain text with an external `detex`, keeps the
//! body between two section titles, proposes candidates with RAKE, YAKE or
//! capitalised-run counting, filters them and lets a [`Reviewer`] decide
//! what goes into the [`ConceptTable`].

mod detex;
mod entities;
mod error;
mod keywords;
mod review;
mod yake;

pub use detex::{DEFAULT_DETEX_EXCLUDE, DEFAULT_DETEX_PROGRAM, run_detex, select_window};
pub use entities::extract_entities;
pub use error::ExtractionError;
pub use keywords::RakeExtractor;
pub use review::{AutoKeep, Candidate, Decision, Progress, PromptReviewer, Reviewer};
pub use yake::YakeExtractor;

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::concepts::{ConceptEntry, ConceptTable};

/// Default first section title.
pub const DEFAULT_FROM: &str = "Introduction";

/// Default first ignored section title.
pub const DEFAULT_TO: &str = "Appendix";

/// Default number of candidates.
pub const DEFAULT_NUMBER: usize = 200;

/// Terms never proposed by default.
pub const DEFAULT_EXCLUDE: &[&str] = &["Figure", "Table", "Figures", "Tables", "Section", "Sections"];

/// How candidates are proposed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// RAKE keyword scores.
    #[default]
    Rake,
    /// YAKE keyword scores (lower is better).
    Yake,
    /// Frequency of capitalised word runs.
    Entities,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rake => f.write_str("rake"),
            Self::Yake => f.write_str("yake"),
            Self::Entities => f.write_str("entities"),
        }
    }
}

/// Settings of one extract run.
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Exact line starting the analysed text (empty: from the top).
    pub from: String,
    /// Exact line ending the analysed text (empty: to the end).
    pub to: String,
    /// Maximum number of candidates.
    pub number: usize,
    /// Terms never proposed.
    pub exclude: Vec<String>,
    /// Minimum candidate length in characters.
    pub min_length: usize,
    /// Candidate method.
    pub method: ExtractionMethod,
    /// LaTeX-to-text program.
    pub detex_program: String,
    /// Environments removed by the LaTeX-to-text program.
    pub detex_exclude: Vec<String>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            from: DEFAULT_FROM.to_string(),
            to: DEFAULT_TO.to_string(),
            number: DEFAULT_NUMBER,
            exclude: DEFAULT_EXCLUDE.iter().map(ToString::to_string).collect(),
            min_length: 0,
            method: ExtractionMethod::default(),
            detex_program: DEFAULT_DETEX_PROGRAM.to_string(),
            detex_exclude: DEFAULT_DETEX_EXCLUDE.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Proposes candidates from plain text, best first.
///
/// `limit` caps the YAKE search; the other methods rank every candidate and
/// leave the cut to [`filter_candidates`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn propose(text: &str, method: ExtractionMethod, limit: usize) -> Vec<Candidate> {
    match method {
        ExtractionMethod::Rake => RakeExtractor::new()
            .extract(text)
            .into_iter()
            .map(|(keyword, score)| Candidate::new(keyword, score))
            .collect(),
        ExtractionMethod::Yake => YakeExtractor::new()
            .extract(text, limit)
            .into_iter()
            .map(|(keyword, score)| Candidate::new(keyword, score))
            .collect(),
        ExtractionMethod::Entities => extract_entities(text)
            .into_iter()
            .map(|(entity, count)| Candidate::new(entity, count as f64))
            .collect(),
    }
}

/// Drops excluded and short candidates and keeps at most `number`.
#[must_use]
pub fn filter_candidates(candidates: Vec<Candidate>, options: &ExtractionOptions) -> Vec<Candidate> {
    let exclude: HashSet<&str> = options.exclude.iter().map(String::as_str).collect();
    candidates
        .into_iter()
        .filter(|c| !c.concept.is_empty())
        .filter(|c| !exclude.contains(c.concept.as_str()))
        .filter(|c| c.concept.chars().count() >= options.min_length)
        .take(options.number)
        .collect()
}

/// Runs the reviewer over `candidates` and collects the kept ones.
///
/// A concept already kept is not offered again. Every kept match becomes one
/// table row.
///
/// # Errors
/// Propagates reviewer errors.
pub fn build_table(
    candidates: Vec<Candidate>,
    reviewer: &mut dyn Reviewer,
) -> Result<ConceptTable, ExtractionError> {
    let total = candidates.len();
    let mut table = ConceptTable::new();
    let mut added: HashSet<String> = HashSet::new();
    let mut keep_all = false;

    'candidates: for (index, candidate) in candidates.into_iter().enumerate() {
        if added.contains(&candidate.concept) {
            continue;
        }

        let mut current = candidate;
        while !keep_all {
            match reviewer.decide(&current, Progress { index, total })? {
                Decision::Keep => break,
                Decision::KeepAll => {
                    keep_all = true;
                    continue 'candidates;
                }
                Decision::Drop => continue 'candidates,
                Decision::Edit(edited) => current = edited,
            }
        }

        if !added.insert(current.concept.clone()) {
            debug!(concept = %current.concept, "concept already kept");
            continue;
        }
        let matches = clean_matches(&current);
        for match_text in matches {
            table.push(ConceptEntry::new(
                current.concept.clone(),
                match_text,
                current.weight,
            ));
        }
    }

    Ok(table)
}

fn clean_matches(candidate: &Candidate) -> Vec<String> {
    let matches: Vec<String> = candidate
        .matches
        .iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    if matches.is_empty() {
        vec![candidate.concept.clone()]
    } else {
        matches
    }
}

/// Converts `input` to text and proposes filtered candidates.
///
/// # Errors
/// Returns the detex errors of [`run_detex`] and
/// [`ExtractionError::EmptyWindow`] when the `from`/`to` window is empty.
#[instrument(skip(options), fields(input = %input.display(), method = %options.method))]
pub async fn extract_candidates(
    input: &Path,
    options: &ExtractionOptions,
) -> Result<Vec<Candidate>, ExtractionError> {
    let raw = run_detex(&options.detex_program, input, &options.detex_exclude).await?;
    let text = select_window(&raw, &options.from, &options.to);
    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyWindow {
            from: options.from.clone(),
        });
    }
    info!(chars = text.len(), "text window selected");

    let proposed = propose(&text, options.method, options.number);
    let proposed_count = proposed.len();
    let candidates = filter_candidates(proposed, options);
    info!(proposed = proposed_count, kept = candidates.len(), "candidates ready");
    Ok(candidates)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Replays a fixed list of decisions.
    struct Scripted(Vec<Decision>);

    impl Reviewer for Scripted {
        fn decide(&mut self, _: &Candidate, _: Progress) -> Result<Decision, ExtractionError> {
            Ok(if self.0.is_empty() {
                Decision::Keep
            } else {
                self.0.remove(0)
            })
        }
    }

    fn candidates(names: &[&str]) -> Vec<Candidate> {
        names.iter().map(|n| Candidate::new(*n, 2.0)).collect()
    }

    #[test]
    fn test_filter_excludes_short_and_limits() {
        let options = ExtractionOptions {
            number: 2,
            min_length: 3,
            ..ExtractionOptions::default()
        };
        let kept = filter_candidates(candidates(&["Figure", "ab", "graph", "node", "edge"]), &options);
        let names: Vec<&str> = kept.iter().map(|c| c.concept.as_str()).collect();
        assert_eq!(names, vec!["graph", "node"]);
    }

    #[test]
    fn test_build_table_auto_keep_writes_one_row_per_candidate() {
        let table = build_table(candidates(&["graph", "node"]), &mut AutoKeep).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0], ConceptEntry::new("graph", "graph", 2.0));
    }

    #[test]
    fn test_build_table_drop_and_edit() {
        let mut reviewer = Scripted(vec![
            Decision::Drop,
            Decision::Edit(Candidate {
                concept: "node".to_string(),
                matches: vec!["node".to_string(), "nodes".to_string()],
                weight: 2.0,
            }),
            Decision::Keep,
        ]);
        let table = build_table(candidates(&["graph", "node"]), &mut reviewer).unwrap();
        let rows: Vec<(&str, &str)> = table
            .entries()
            .iter()
            .map(|e| (e.concept.as_str(), e.match_text.as_str()))
            .collect();
        assert_eq!(rows, vec![("node", "node"), ("node", "nodes")]);
    }

    #[test]
    fn test_build_table_skips_already_kept_concepts() {
        let mut reviewer = Scripted(vec![
            Decision::Keep,
            Decision::Edit(Candidate::new("graph", 1.0)),
            Decision::Keep,
        ]);
        let table = build_table(candidates(&["graph", "graphs", "graph"]), &mut reviewer).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_build_table_keep_all_keeps_following_only() {
        let mut reviewer = Scripted(vec![Decision::Keep, Decision::KeepAll, Decision::Drop]);
        let table = build_table(candidates(&["a1", "b2", "c3", "d4"]), &mut reviewer).unwrap();
        let names: Vec<&str> = table.entries().iter().map(|e| e.concept.as_str()).collect();
        assert_eq!(names, vec!["a1", "c3", "d4"]);
        assert_eq!(reviewer.0, vec![Decision::Drop]);
    }

    #[test]
    fn test_build_table_blank_matches_fall_back_to_concept() {
        let mut reviewer = Scripted(vec![
            Decision::Edit(Candidate {
                concept: "graph".to_string(),
                matches: vec![" ".to_string(), String::new()],
                weight: 1.0,
            }),
            Decision::Keep,
        ]);
        let table = build_table(candidates(&["graph"]), &mut reviewer).unwrap();
        assert_eq!(table.entries()[0].match_text, "graph");
    }

    #[test]
    fn test_propose_entities_weight_is_count() {
        let proposed = propose("see Lisbon and Lisbon again", ExtractionMethod::Entities, 10);
        assert_eq!(proposed, vec![Candidate::new("Lisbon", 2.0)]);
    }

    #[test]
    fn test_propose_yake_respects_limit() {
        let text = "Graph databases store nodes and edges. Graph databases answer traversal \
            queries. Relational databases store rows in tables.";
        let proposed = propose(text, ExtractionMethod::Yake, 3);
        assert!(!proposed.is_empty());
        assert!(proposed.len() <= 3);
        assert!(proposed.iter().all(|c| c.matches == vec![c.concept.clone()]));
    }

    #[test]
    fn test_method_names() {
        assert_eq!(ExtractionMethod::Yake.to_string(), "yake");
        assert_eq!(ExtractionMethod::default().to_string(), "rake");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_candidates_empty_window() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("main.tex");
        std::fs::write(&input, "no introduction here\n").unwrap();
        let options = ExtractionOptions {
            detex_program: "cat".to_string(),
            detex_exclude: Vec::new(),
            ..ExtractionOptions::default()
        };

        let err = extract_candidates(&input, &options).await.unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyWindow { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_candidates_entities_from_window() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("main.tex");
        std::fs::write(
            &input,
            "Preface about Madrid\nIntroduction\nwe met Lisbon people in Lisbon\nAppendix\nPorto\n",
        )
        .unwrap();
        let options = ExtractionOptions {
            method: ExtractionMethod::Entities,
            detex_program: "cat".to_string(),
            detex_exclude: Vec::new(),
            ..ExtractionOptions::default()
        };

        let found = extract_candidates(&input, &options).await.unwrap();
        let names: Vec<&str> = found.iter().map(|c| c.concept.as_str()).collect();
        assert_eq!(names, vec!["Lisbon"]);
    }
}
