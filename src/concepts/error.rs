//! Error and warning types for concept table operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing a concept table.
#[derive(Debug, Error)]
pub enum TableError {
    /// File system error opening, creating or flushing the CSV file.
    #[error("IO error on concept table {path}: {source}")]
    Io {
        /// The CSV path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Header row lacks one of the required columns.
    #[error(
        "malformed concept table: missing column '{column}'\n  Suggestion: the header row must be concept,match,weight"
    )]
    MissingColumn {
        /// The absent column name.
        column: &'static str,
    },

    /// A weight cell is not a finite decimal number.
    #[error("malformed concept table: row {row} has non-numeric weight '{value}'")]
    InvalidWeight {
        /// 1-based data row (header excluded).
        row: usize,
        /// The offending cell.
        value: String,
    },

    /// The CSV reader or writer rejected the data (bad quoting, ragged rows).
    #[error("malformed concept table: {source}")]
    Csv {
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },
}

impl From<csv::Error> for TableError {
    fn from(source: csv::Error) -> Self {
        Self::Csv { source }
    }
}

/// Non-fatal problems with individual table rows.
///
/// Warnings are logged when they are found and collected for the end-of-run
/// summary; they never abort a stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationWarning {
    /// Entry with an empty match string; it can never trigger an insertion.
    #[error("table entry {entry}: empty match for concept '{concept}', entry skipped")]
    EmptyMatch {
        /// 1-based position in the loaded table (duplicates already removed).
        entry: usize,
        /// Concept of the skipped entry.
        concept: String,
    },

    /// Repeated (concept, match) pair; the first occurrence is kept.
    #[error("row {row}: duplicate entry '{concept}' -> '{match_text}', entry skipped")]
    DuplicateEntry {
        /// 1-based table row of the duplicate.
        row: usize,
        /// Concept of the duplicate.
        concept: String,
        /// Match of the duplicate.
        match_text: String,
    },
}
