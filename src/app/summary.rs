//! End-of-run summary and JSON report for `texindex index`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use texindex_core::RunStats;

/// Concepts listed in the distribution section.
pub(crate) const DISTRIBUTION_LIMIT: usize = 50;

/// Summary lines: counters, top concepts by insertion count, warnings.
pub(crate) fn summary_lines(stats: &RunStats, index_terms: usize) -> Vec<String> {
    let totals = &stats.totals;
    let mut lines = vec![
        format!("index terms: {index_terms}"),
        format!("edited files: {}", stats.edited_files),
        format!("copied assets: {}", stats.copied_assets),
        format!("files with entries: {}", stats.documents_with_entries()),
        format!("matches: {}", totals.matched()),
        format!("inserted entries: {}", totals.inserted),
        format!("skipped (unsafe region): {}", totals.rejected_unsafe),
        format!("skipped (stopword): {}", totals.rejected_stopword),
        format!("skipped (distance): {}", totals.rejected_distance),
        format!("skipped (invalid concept): {}", totals.rejected_invalid),
        format!("chapter markers: {}", totals.chapter_markers),
    ];

    let top = totals.top_concepts(DISTRIBUTION_LIMIT);
    if !top.is_empty() {
        lines.push(format!(
            "entry distribution (top {} of {}):",
            top.len(),
            totals.per_concept.len()
        ));
        let width = top.iter().map(|(_, count)| count.to_string().len()).max().unwrap_or(1);
        for (concept, count) in top {
            lines.push(format!("  {count:>width$}  {concept}"));
        }
    }

    if !stats.warnings.is_empty() {
        lines.push(format!("warnings: {}", stats.warnings.len()));
        for warning in &stats.warnings {
            lines.push(format!("  {warning}"));
        }
    }
    lines
}

/// Prints the summary to stdout.
pub(crate) fn print_summary(stats: &RunStats, index_terms: usize) {
    for line in summary_lines(stats, index_terms) {
        println!("{line}");
    }
}

/// Writes the run statistics as pretty JSON.
pub(crate) fn write_report(path: &Path, stats: &RunStats) -> Result<()> {
    let json = serde_json::to_string_pretty(stats).context("Failed to serialize run report")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write run report '{}'", path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use texindex_core::DocumentStats;

    fn stats() -> RunStats {
        let mut totals = DocumentStats {
            inserted: 3,
            rejected_unsafe: 1,
            rejected_distance: 2,
            ..DocumentStats::default()
        };
        totals.per_concept.insert("graph".to_string(), 2);
        totals.per_concept.insert("node".to_string(), 1);
        RunStats {
            edited_files: 2,
            copied_assets: 1,
            totals,
            documents: Vec::new(),
            warnings: vec!["table entry 4: empty match for concept 'x', entry skipped".to_string()],
        }
    }

    #[test]
    fn test_summary_lists_counters() {
        let lines = summary_lines(&stats(), 5);
        assert!(lines.contains(&"index terms: 5".to_string()));
        assert!(lines.contains(&"matches: 6".to_string()));
        assert!(lines.contains(&"skipped (distance): 2".to_string()));
        assert!(lines.contains(&"skipped (invalid concept): 0".to_string()));
    }

    #[test]
    fn test_summary_distribution_sorted() {
        let lines = summary_lines(&stats(), 5);
        let start = lines
            .iter()
            .position(|l| l.starts_with("entry distribution"))
            .unwrap();
        assert_eq!(lines[start + 1], "  2  graph");
        assert_eq!(lines[start + 2], "  1  node");
    }

    #[test]
    fn test_summary_includes_warnings() {
        let lines = summary_lines(&stats(), 5);
        assert!(lines.iter().any(|l| l.contains("empty match")));
    }

    #[test]
    fn test_write_report_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report(&path, &stats()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["edited_files"], 2);
        assert_eq!(value["totals"]["per_concept"]["graph"], 2);
    }
}
