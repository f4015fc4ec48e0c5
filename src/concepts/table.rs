//! Ordered concept table backed by a `concept,match,weight` CSV file.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::error::{TableError, ValidationWarning};

const CONCEPT_COLUMN: &str = "concept";
const MATCH_COLUMN: &str = "match";
const WEIGHT_COLUMN: &str = "weight";

/// One index concept together with a literal text trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptEntry {
    /// Canonical index entry label.
    pub concept: String,
    /// Literal text that triggers an index marker for `concept`.
    #[serde(rename = "match")]
    pub match_text: String,
    /// Extraction relevance; only used for review and sorting.
    pub weight: f64,
}

impl ConceptEntry {
    /// Creates an entry from its three fields.
    #[must_use]
    pub fn new(concept: impl Into<String>, match_text: impl Into<String>, weight: f64) -> Self {
        Self {
            concept: concept.into(),
            match_text: match_text.into(),
            weight,
        }
    }
}

/// Ordered collection of concept entries, unique by (concept, match).
///
/// Table order is significant: when two entries match the same text with the
/// same length, the earlier one wins.
#[derive(Debug, Clone, Default)]
pub struct ConceptTable {
    entries: Vec<ConceptEntry>,
    pairs: HashSet<(String, String)>,
    warnings: Vec<ValidationWarning>,
}

impl PartialEq for ConceptTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl ConceptTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry unless its (concept, match) pair is already present.
    ///
    /// Returns `true` when the entry was added.
    pub fn push(&mut self, entry: ConceptEntry) -> bool {
        let key = (entry.concept.clone(), entry.match_text.clone());
        if !self.pairs.insert(key) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Returns the entries in table order.
    #[must_use]
    pub fn entries(&self) -> &[ConceptEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of distinct concepts.
    #[must_use]
    pub fn concept_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.concept.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Returns `true` if any entry carries this concept.
    #[must_use]
    pub fn contains_concept(&self, concept: &str) -> bool {
        self.entries.iter().any(|entry| entry.concept == concept)
    }

    /// Warnings collected while loading (duplicate rows).
    #[must_use]
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    /// Loads a table from a CSV file.
    ///
    /// # Errors
    /// Returns [`TableError::Io`] if the file cannot be opened, and the
    /// format variants described on [`ConceptTable::from_reader`].
    #[instrument(fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let file = File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Reads a table from CSV data with a `concept,match,weight` header.
    ///
    /// Columns are located by name, so their order does not matter and extra
    /// columns are ignored. Duplicate pairs are dropped with a warning.
    ///
    /// # Errors
    /// Returns [`TableError::MissingColumn`] if a required column is absent,
    /// [`TableError::InvalidWeight`] if a weight is not a finite number, and
    /// [`TableError::Csv`] on malformed CSV.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|header| header.trim() == name)
                .ok_or(TableError::MissingColumn { column: name })
        };
        let concept_idx = column(CONCEPT_COLUMN)?;
        let match_idx = column(MATCH_COLUMN)?;
        let weight_idx = column(WEIGHT_COLUMN)?;

        let mut table = Self::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            let row = index + 1;
            let cell = |idx: usize| record.get(idx).unwrap_or_default();

            let raw_weight = cell(weight_idx);
            let weight = parse_weight(raw_weight).ok_or_else(|| TableError::InvalidWeight {
                row,
                value: raw_weight.to_string(),
            })?;

            let entry = ConceptEntry::new(cell(concept_idx), cell(match_idx), weight);
            let (concept, match_text) = (entry.concept.clone(), entry.match_text.clone());
            if !table.push(entry) {
                warn!(row, concept = %concept, match_text = %match_text, "duplicate concept entry skipped");
                table.warnings.push(ValidationWarning::DuplicateEntry {
                    row,
                    concept,
                    match_text,
                });
            }
        }

        debug!(
            entries = table.len(),
            concepts = table.concept_count(),
            "concept table loaded"
        );
        Ok(table)
    }

    /// Writes the table to a CSV file, replacing any existing file.
    ///
    /// # Errors
    /// Returns [`TableError::Io`] if the file cannot be created or flushed.
    #[instrument(skip(self), fields(path = %path.display(), entries = self.len()))]
    pub fn save(&self, path: &Path) -> Result<(), TableError> {
        let file = File::create(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.to_writer(file)
    }

    /// Writes the table as CSV with a `concept,match,weight` header.
    ///
    /// # Errors
    /// Returns [`TableError::Csv`] if writing fails.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([CONCEPT_COLUMN, MATCH_COLUMN, WEIGHT_COLUMN])?;
        for entry in &self.entries {
            csv_writer.write_record([
                entry.concept.as_str(),
                entry.match_text.as_str(),
                entry.weight.to_string().as_str(),
            ])?;
        }
        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ConceptTable {
    type Item = &'a ConceptEntry;
    type IntoIter = std::slice::Iter<'a, ConceptEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn parse_weight(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|weight| weight.is_finite())
}
