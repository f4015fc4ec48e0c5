//! Extraction stage errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::concepts::TableError;

/// Errors raised by the extract stage.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The LaTeX-to-text program could not be started.
    #[error("failed to run {program}: {source}\n  Suggestion: install detex or pass --detex <PROGRAM>")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The LaTeX-to-text program exited unsuccessfully.
    #[error("{program} failed on {input} ({status}): {stderr}")]
    Failed {
        /// Program name.
        program: String,
        /// Document passed to the program.
        input: PathBuf,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// Nothing left after selecting the `from`/`to` window.
    #[error(
        "no text found after a line equal to '{from}'\n  Suggestion: pass --from with the exact title of the first section, or --from '' to start at the top"
    )]
    EmptyWindow {
        /// Start line that was looked for.
        from: String,
    },

    /// Reading review answers or writing prompts failed.
    #[error("review prompt failed: {0}")]
    Prompt(#[source] std::io::Error),

    /// Saving the concept table failed.
    #[error(transparent)]
    Table(#[from] TableError),
}
