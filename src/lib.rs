//! Texindex Core Library
//!
//! This library provides the core functionality for the texindex tool,
//! which proposes back-of-the-book index concepts for a LaTeX manuscript
//! and inserts `\index{...}` entries at their occurrences.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`concepts`] - Concept table (`concept,match,weight` CSV)
//! - [`corpus`] - Discovery of the project's `.tex` files and chapter markers
//! - [`insertion`] - Single-document match insertion engine
//! - [`engine`] - Batch runner over a whole corpus
//! - [`output`] - Mirrored output tree writer
//! - [`extract`] - Concept extraction stage (detex, keyword extraction, review)
//! - [`config`] - Operator configuration file and stopword lists

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod concepts;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod extract;
pub mod insertion;
pub mod output;

// Re-export commonly used types
pub use concepts::{ConceptEntry, ConceptTable, TableError};
pub use config::{ConfigError, FileConfig, LoadedConfig, load_stopwords};
pub use corpus::{ChapterMarker, Corpus, CorpusError, CorpusOptions, DocumentFile, discover};
pub use engine::{DEFAULT_JOBS, EngineError, IndexEngine, RunStats};
pub use extract::{
    AutoKeep, Candidate, Decision, ExtractionError, ExtractionMethod, ExtractionOptions,
    PromptReviewer, Reviewer,
};
pub use insertion::{
    DistanceThreshold, DocumentStats, Heuristics, InsertionConfig, Inserter, LexicalRules,
    Rewrite, StopwordSet, ValidationWarning,
};
pub use output::{OutputError, OutputWriter};
