//! Mirrored output tree writer.
//!
//! Rewritten documents land at `output_root/<relative path>`. Originals are
//! only ever read. A writer cannot be constructed when the output root is the
//! source root or one of its ancestors, or when it is nested in the project
//! and already holds files that no previous run wrote there. Every output root
//! carries a [`OUTPUT_STAMP`] file marking it as texindex output.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::corpus::DocumentFile;

/// Marker file written into every output root.
pub const OUTPUT_STAMP: &str = ".texindex-output";

/// Errors that can occur while writing the output tree.
#[derive(Debug, Error)]
pub enum OutputError {
    /// File system error creating directories or writing files.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The target would be an original source file.
    #[error(
        "refusing to overwrite source file {path}\n  Suggestion: choose an output directory different from the project directory"
    )]
    SourceOverlap {
        /// The original that would have been overwritten.
        path: PathBuf,
    },

    /// The output root lies inside the project and holds project files.
    #[error(
        "output directory {path} is inside the project and already contains files not written by texindex\n  Suggestion: choose an empty directory or one outside the project"
    )]
    NestedSources {
        /// The output root.
        path: PathBuf,
    },
}

/// Writes rewritten documents and copied assets below an output root.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    source_root: PathBuf,
    output_root: PathBuf,
}

impl OutputWriter {
    /// Creates the output root (if needed), checks it cannot clobber the
    /// project and stamps it.
    ///
    /// # Errors
    /// Returns [`OutputError::Io`] if a root cannot be created, resolved or
    /// stamped, [`OutputError::SourceOverlap`] if the output root is the source
    /// root or contains it, and [`OutputError::NestedSources`] if the output
    /// root is inside the source root, is not empty and carries no stamp.
    #[instrument(fields(source_root = %source_root.display(), output_root = %output_root.display()))]
    pub fn new(source_root: &Path, output_root: &Path) -> Result<Self, OutputError> {
        fs::create_dir_all(output_root).map_err(|source| OutputError::Io {
            path: output_root.to_path_buf(),
            source,
        })?;
        let source_root = canonical(source_root)?;
        let output_root = canonical(output_root)?;
        if source_root.starts_with(&output_root) {
            return Err(OutputError::SourceOverlap { path: source_root });
        }
        let stamp = output_root.join(OUTPUT_STAMP);
        if output_root.starts_with(&source_root)
            && !stamp.exists()
            && !is_empty_dir(&output_root)?
        {
            return Err(OutputError::NestedSources { path: output_root });
        }
        fs::write(&stamp, "texindex output directory\n").map_err(|source| OutputError::Io {
            path: stamp.clone(),
            source,
        })?;
        Ok(Self {
            source_root,
            output_root,
        })
    }

    /// Resolved output root.
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Where a relative path is written.
    #[must_use]
    pub fn target_path(&self, relative_path: &Path) -> PathBuf {
        self.output_root.join(relative_path)
    }

    /// Writes a rewritten document, replacing any previous output.
    ///
    /// # Errors
    /// Returns [`OutputError::Io`] on directory or write failure and
    /// [`OutputError::SourceOverlap`] if the target resolves to the original.
    pub fn write(&self, document: &DocumentFile, rewritten_text: &str) -> Result<PathBuf, OutputError> {
        let target = self.prepare_target(&document.relative_path)?;
        fs::write(&target, rewritten_text).map_err(|source| OutputError::Io {
            path: target.clone(),
            source,
        })?;
        debug!(path = %target.display(), bytes = rewritten_text.len(), "document written");
        Ok(target)
    }

    /// Copies a project file verbatim into the output tree.
    ///
    /// # Errors
    /// Same conditions as [`OutputWriter::write`].
    pub fn copy_asset(&self, relative_path: &Path) -> Result<PathBuf, OutputError> {
        let target = self.prepare_target(relative_path)?;
        let source_path = self.source_root.join(relative_path);
        fs::copy(&source_path, &target).map_err(|source| OutputError::Io {
            path: target.clone(),
            source,
        })?;
        debug!(path = %target.display(), "asset copied");
        Ok(target)
    }

    fn prepare_target(&self, relative_path: &Path) -> Result<PathBuf, OutputError> {
        let target = self.target_path(relative_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| OutputError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let original = self.source_root.join(relative_path);
        if target.exists() && original.exists() && canonical(&target)? == canonical(&original)? {
            return Err(OutputError::SourceOverlap { path: original });
        }
        Ok(target)
    }
}

fn is_empty_dir(path: &Path) -> Result<bool, OutputError> {
    let mut entries = fs::read_dir(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(entries.next().is_none())
}

fn canonical(path: &Path) -> Result<PathBuf, OutputError> {
    path.canonicalize().map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}
