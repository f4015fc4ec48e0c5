//! Batch runner applying the insertion engine to a whole corpus.
//!
//! Documents are independent, so each one is rewritten on a blocking task.
//! A semaphore bounds how many run at once (`--jobs`).
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use texindex_core::{
//!     ConceptTable, CorpusOptions, IndexEngine, InsertionConfig, Inserter, OutputWriter, discover,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let table = ConceptTable::load(Path::new("concepts.csv"))?;
//! let corpus = discover(Path::new("thesis/main.tex"), &CorpusOptions::default())?;
//! let writer = OutputWriter::new(corpus.root(), Path::new("indexed"))?;
//! let inserter = Arc::new(Inserter::new(&table, InsertionConfig::default()));
//!
//! let engine = IndexEngine::new(4)?;
//! let stats = engine.process_corpus(&corpus, inserter, &writer).await?;
//! println!("{} entries in {} files", stats.totals.inserted, stats.edited_files);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use indicatif::ProgressBar;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::concepts::ValidationWarning;
use crate::corpus::Corpus;
use crate::insertion::{DocumentStats, Inserter};
use crate::output::{OutputError, OutputWriter};

/// Minimum allowed number of parallel documents.
const MIN_JOBS: usize = 1;

/// Maximum allowed number of parallel documents.
const MAX_JOBS: usize = 64;

/// Default number of parallel documents.
pub const DEFAULT_JOBS: usize = 4;

/// Error type for batch runs.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid jobs value provided.
    #[error("invalid jobs value {value}: must be between {MIN_JOBS} and {MAX_JOBS}")]
    InvalidJobs {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Writing the output tree failed.
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,

    /// A document task panicked or was cancelled.
    #[error("document task failed for {path}: {message}")]
    Join {
        /// Document being processed.
        path: PathBuf,
        /// Join error description.
        message: String,
    },
}

/// Statistics for one rewritten document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    /// Path relative to the corpus root.
    pub path: PathBuf,
    /// Counters for this document.
    pub stats: DocumentStats,
}

/// Aggregated result of an index run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Documents written to the output tree.
    pub edited_files: usize,
    /// Assets copied verbatim.
    pub copied_assets: usize,
    /// Counters summed over all documents.
    pub totals: DocumentStats,
    /// Per-document counters, sorted by path.
    pub documents: Vec<DocumentReport>,
    /// Non-fatal warnings raised while preparing the concept table.
    pub warnings: Vec<String>,
}

impl RunStats {
    /// Documents that received at least one entry.
    #[must_use]
    pub fn documents_with_entries(&self) -> usize {
        self.documents
            .iter()
            .filter(|report| report.stats.inserted > 0)
            .count()
    }
}

/// Concurrent corpus rewriter.
#[derive(Debug)]
pub struct IndexEngine {
    semaphore: Arc<Semaphore>,
    jobs: usize,
    copy_assets: bool,
    progress: Option<ProgressBar>,
}

impl IndexEngine {
    /// Creates an engine running at most `jobs` documents at once.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidJobs`] if `jobs` is outside `1..=64`.
    #[instrument(level = "debug")]
    pub fn new(jobs: usize) -> Result<Self, EngineError> {
        if !(MIN_JOBS..=MAX_JOBS).contains(&jobs) {
            return Err(EngineError::InvalidJobs { value: jobs });
        }
        debug!(jobs, "creating index engine");
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(jobs)),
            jobs,
            copy_assets: true,
            progress: None,
        })
    }

    /// Enables or disables copying of non-document files.
    #[must_use]
    pub fn with_copy_assets(mut self, copy_assets: bool) -> Self {
        self.copy_assets = copy_assets;
        self
    }

    /// Ticks `bar` once per finished document.
    #[must_use]
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Configured parallelism.
    #[must_use]
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Rewrites every document of `corpus` into `writer`'s output tree.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Output`] on the first write or copy failure,
    /// [`EngineError::Join`] if a document task panics, and
    /// [`EngineError::SemaphoreClosed`] if the semaphore is closed.
    #[instrument(skip_all, fields(root = %corpus.root().display(), documents = corpus.documents().len()))]
    pub async fn process_corpus(
        &self,
        corpus: &Corpus,
        inserter: Arc<Inserter>,
        writer: &OutputWriter,
    ) -> Result<RunStats, EngineError> {
        info!(jobs = self.jobs, "starting index run");
        let mut handles = Vec::with_capacity(corpus.documents().len());

        for document in corpus.documents() {
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| EngineError::SemaphoreClosed)?;

            let document = document.clone();
            let inserter = Arc::clone(&inserter);
            let writer = writer.clone();
            let progress = self.progress.clone();

            let path = document.relative_path.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let rewrite = inserter.rewrite(&document.original_text);
                writer.write(&document, &rewrite.text)?;
                debug!(
                    path = %document.relative_path.display(),
                    inserted = rewrite.stats.inserted,
                    rejected = rewrite.stats.rejected(),
                    "document indexed"
                );
                if let Some(bar) = progress {
                    bar.inc(1);
                }
                Ok::<_, OutputError>(DocumentReport {
                    path: document.relative_path,
                    stats: rewrite.stats,
                })
            });
            handles.push((path, handle));
        }

        let mut stats = RunStats {
            warnings: inserter
                .warnings()
                .iter()
                .map(ValidationWarning::to_string)
                .collect(),
            ..RunStats::default()
        };

        for (path, handle) in handles {
            let report = handle.await.map_err(|e| EngineError::Join {
                path,
                message: e.to_string(),
            })??;
            stats.totals.merge(&report.stats);
            stats.edited_files += 1;
            stats.documents.push(report);
        }
        stats.documents.sort_by(|a, b| a.path.cmp(&b.path));

        if self.copy_assets {
            for asset in corpus.assets() {
                writer.copy_asset(asset)?;
                stats.copied_assets += 1;
            }
        } else if !corpus.assets().is_empty() {
            warn!(
                assets = corpus.assets().len(),
                "asset copying disabled, output tree may not compile"
            );
        }

        info!(
            edited_files = stats.edited_files,
            copied_assets = stats.copied_assets,
            inserted = stats.totals.inserted,
            rejected = stats.totals.rejected(),
            "index run complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    use crate::concepts::{ConceptEntry, ConceptTable};
    use crate::corpus::{CorpusOptions, discover};
    use crate::insertion::InsertionConfig;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("chapters")).unwrap();
        fs::write(
            dir.path().join("main.tex"),
            "\\begin{document}\nA graph.\n\\input{chapters/one}\n\\end{document}\n",
        )
        .unwrap();
        fs::write(dir.path().join("chapters/one.tex"), "Another graph here.\n").unwrap();
        fs::write(dir.path().join("refs.bib"), "@book{x}").unwrap();
        dir
    }

    fn inserter() -> Arc<Inserter> {
        let mut table = ConceptTable::new();
        table.push(ConceptEntry::new("graph", "graph", 1.0));
        Arc::new(Inserter::new(&table, InsertionConfig::default()))
    }

    #[test]
    fn test_engine_new_valid_jobs() {
        assert_eq!(IndexEngine::new(1).unwrap().jobs(), 1);
        assert_eq!(IndexEngine::new(64).unwrap().jobs(), 64);
    }

    #[test]
    fn test_engine_new_invalid_jobs() {
        assert!(matches!(
            IndexEngine::new(0),
            Err(EngineError::InvalidJobs { value: 0 })
        ));
        assert!(matches!(
            IndexEngine::new(65),
            Err(EngineError::InvalidJobs { value: 65 })
        ));
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::InvalidJobs { value: 0 };
        assert_eq!(err.to_string(), "invalid jobs value 0: must be between 1 and 64");
    }

    #[tokio::test]
    async fn test_process_corpus_writes_mirror_and_assets() {
        let source = project();
        let output = tempfile::tempdir().unwrap();
        let corpus = discover(&source.path().join("main.tex"), &CorpusOptions::default()).unwrap();
        let writer = OutputWriter::new(corpus.root(), output.path()).unwrap();

        let stats = IndexEngine::new(2)
            .unwrap()
            .process_corpus(&corpus, inserter(), &writer)
            .await
            .unwrap();

        assert_eq!(stats.edited_files, 2);
        assert_eq!(stats.copied_assets, 1);
        assert_eq!(stats.totals.inserted, 2);
        assert_eq!(stats.documents_with_entries(), 2);
        assert_eq!(
            fs::read_to_string(output.path().join("chapters/one.tex")).unwrap(),
            "Another graph\\index{graph} here.\n"
        );
        assert!(output.path().join("refs.bib").exists());
        assert_eq!(
            fs::read_to_string(source.path().join("chapters/one.tex")).unwrap(),
            "Another graph here.\n"
        );
    }

    #[tokio::test]
    async fn test_process_corpus_reports_sorted_by_path() {
        let source = project();
        let output = tempfile::tempdir().unwrap();
        let corpus = discover(&source.path().join("main.tex"), &CorpusOptions::default()).unwrap();
        let writer = OutputWriter::new(corpus.root(), output.path()).unwrap();

        let stats = IndexEngine::new(4)
            .unwrap()
            .process_corpus(&corpus, inserter(), &writer)
            .await
            .unwrap();

        let paths: Vec<_> = stats.documents.iter().map(|d| d.path.clone()).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("chapters/one.tex"), PathBuf::from("main.tex")]
        );
    }

    #[tokio::test]
    async fn test_copy_assets_disabled() {
        let source = project();
        let output = tempfile::tempdir().unwrap();
        let corpus = discover(&source.path().join("main.tex"), &CorpusOptions::default()).unwrap();
        let writer = OutputWriter::new(corpus.root(), output.path()).unwrap();

        let stats = IndexEngine::new(1)
            .unwrap()
            .with_copy_assets(false)
            .process_corpus(&corpus, inserter(), &writer)
            .await
            .unwrap();

        assert_eq!(stats.copied_assets, 0);
        assert!(!output.path().join("refs.bib").exists());
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let source = project();
        let output = tempfile::tempdir().unwrap();
        let corpus = discover(&source.path().join("main.tex"), &CorpusOptions::default()).unwrap();
        let writer = OutputWriter::new(corpus.root(), output.path()).unwrap();
        let engine = IndexEngine::new(3).unwrap();

        engine.process_corpus(&corpus, inserter(), &writer).await.unwrap();
        let first = fs::read_to_string(output.path().join("main.tex")).unwrap();
        engine.process_corpus(&corpus, inserter(), &writer).await.unwrap();
        let second = fs::read_to_string(output.path().join("main.tex")).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_table_warnings_reported() {
        let source = project();
        let output = tempfile::tempdir().unwrap();
        let corpus = discover(&source.path().join("main.tex"), &CorpusOptions::default()).unwrap();
        let writer = OutputWriter::new(corpus.root(), output.path()).unwrap();
        let mut table = ConceptTable::new();
        table.push(ConceptEntry::new("ghost", "", 1.0));

        let stats = IndexEngine::new(1)
            .unwrap()
            .process_corpus(
                &corpus,
                Arc::new(Inserter::new(&table, InsertionConfig::default())),
                &writer,
            )
            .await
            .unwrap();

        assert_eq!(stats.warnings.len(), 1);
        assert!(stats.warnings[0].contains("ghost"));
    }
}
