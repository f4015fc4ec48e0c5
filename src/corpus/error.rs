//! Error types for corpus discovery.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while discovering and reading project documents.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The directory containing the root document does not exist.
    #[error("root directory not found: {path}\n  Suggestion: pass the main .tex file of an existing project")]
    RootNotFound {
        /// The missing directory.
        path: PathBuf,
    },

    /// The walk finished without a single matching document.
    #[error("no .{extension} documents found under {root} (after exclusions)")]
    EmptyCorpus {
        /// The walked directory.
        root: PathBuf,
        /// The document extension that was searched for.
        extension: String,
    },

    /// An exclude pattern is not a valid glob.
    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// The underlying glob error.
        #[source]
        source: globset::Error,
    },

    /// The chapter marker is not a valid regular expression.
    #[error("invalid chapter marker '{pattern}': {source}")]
    InvalidMarker {
        /// The rejected pattern.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// Directory traversal failed (permissions, vanished entries).
    #[error("cannot walk {path}: {source}")]
    Walk {
        /// The directory being walked.
        path: PathBuf,
        /// The underlying walk error.
        #[source]
        source: walkdir::Error,
    },

    /// A document could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// The unreadable document.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A document is not valid UTF-8.
    #[error("{path} is not valid UTF-8\n  Suggestion: convert the file to UTF-8 or exclude it with --exclude")]
    Encoding {
        /// The offending document.
        path: PathBuf,
    },
}
