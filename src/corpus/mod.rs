//! Document corpus discovery.
//!
//! The corpus is every document below the directory of the main LaTeX file,
//! minus the glob exclusions. The main file only anchors the directory: the
//! `\input`/`\include` graph is not followed.

mod chapter;
mod error;

pub use chapter::{ChapterMarker, DEFAULT_CHAPTER_MARKER};
pub use error::CorpusError;

use std::fs;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info, instrument};
use walkdir::{DirEntry, WalkDir};

/// Default document extension.
pub const DEFAULT_EXTENSION: &str = "tex";

/// Discovery settings.
#[derive(Debug, Clone)]
pub struct CorpusOptions {
    /// Extension (without dot) of the documents to index.
    pub extension: String,
    /// Glob patterns matched against root-relative paths (`/` separated).
    pub exclude: Vec<String>,
    /// Directories that are never descended (e.g. an output tree nested in the project).
    pub skip_dirs: Vec<PathBuf>,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            exclude: Vec::new(),
            skip_dirs: Vec::new(),
        }
    }
}

/// A source document, read once and never written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    /// Path relative to the corpus root.
    pub relative_path: PathBuf,
    /// File content exactly as read.
    pub original_text: String,
}

/// Discovered project: documents to rewrite plus the remaining files.
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    documents: Vec<DocumentFile>,
    assets: Vec<PathBuf>,
}

impl Corpus {
    /// Directory the relative paths are based on.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Documents in path order.
    #[must_use]
    pub fn documents(&self) -> &[DocumentFile] {
        &self.documents
    }

    /// Relative paths of files that are not rewritten (other extensions and
    /// excluded documents).
    #[must_use]
    pub fn assets(&self) -> &[PathBuf] {
        &self.assets
    }

    /// Absolute location of a document or asset.
    #[must_use]
    pub fn source_path(&self, relative_path: &Path) -> PathBuf {
        self.root.join(relative_path)
    }
}

/// Returns the directory anchoring a root document.
#[must_use]
pub fn root_dir(root_file: &Path) -> PathBuf {
    match root_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Walks the directory of `root_file` and reads every document.
///
/// # Errors
/// Returns [`CorpusError::RootNotFound`] if the directory does not exist,
/// [`CorpusError::EmptyCorpus`] if no document survives the exclusions,
/// [`CorpusError::InvalidPattern`] for a bad glob, and read/encoding errors
/// for unreadable documents.
#[instrument(skip(options), fields(root_file = %root_file.display()))]
pub fn discover(root_file: &Path, options: &CorpusOptions) -> Result<Corpus, CorpusError> {
    let root = root_dir(root_file);
    if !root.is_dir() {
        return Err(CorpusError::RootNotFound { path: root });
    }

    let excludes = build_exclude_set(&options.exclude)?;
    let skip_dirs: Vec<PathBuf> = options
        .skip_dirs
        .iter()
        .filter_map(|dir| dir.canonicalize().ok())
        .collect();

    let mut documents = Vec::new();
    let mut assets = Vec::new();

    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry) && !is_skipped_dir(entry, &skip_dirs));

    for entry in walker {
        let entry = entry.map_err(|source| CorpusError::Walk {
            path: root.clone(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative_path) = entry.path().strip_prefix(&root) else {
            continue;
        };
        let relative_path = relative_path.to_path_buf();

        let is_document = relative_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(options.extension.as_str()));
        if !is_document || excludes.is_match(slash_path(&relative_path)) {
            if is_document {
                debug!(path = %relative_path.display(), "document excluded");
            }
            assets.push(relative_path);
            continue;
        }

        let original_text = read_document(entry.path())?;
        documents.push(DocumentFile {
            relative_path,
            original_text,
        });
    }

    if documents.is_empty() {
        return Err(CorpusError::EmptyCorpus {
            root,
            extension: options.extension.clone(),
        });
    }

    info!(
        documents = documents.len(),
        assets = assets.len(),
        root = %root.display(),
        "corpus discovered"
    );

    Ok(Corpus {
        root,
        documents,
        assets,
    })
}

fn build_exclude_set(patterns: &[String]) -> Result<GlobSet, CorpusError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| CorpusError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|source| CorpusError::InvalidPattern {
            pattern: patterns.join(","),
            source,
        })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn is_skipped_dir(entry: &DirEntry, skip_dirs: &[PathBuf]) -> bool {
    if skip_dirs.is_empty() || entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .path()
        .canonicalize()
        .is_ok_and(|path| skip_dirs.contains(&path))
}

/// Relative path with `/` separators, as exclude globs are written.
fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn read_document(path: &Path) -> Result<String, CorpusError> {
    let bytes = fs::read(path).map_err(|source| CorpusError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| CorpusError::Encoding {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("chapters/drafts")).unwrap();
        fs::create_dir_all(root.join("figures")).unwrap();
        fs::write(root.join("main.tex"), "\\input{chapters/intro}\n").unwrap();
        fs::write(root.join("chapters/intro.tex"), "Intro text.\n").unwrap();
        fs::write(root.join("chapters/method.tex"), "Method text.\n").unwrap();
        fs::write(root.join("chapters/drafts/old.tex"), "Old.\n").unwrap();
        fs::write(root.join("figures/plot.pdf"), [0u8, 159, 146, 150]).unwrap();
        fs::write(root.join("refs.bib"), "@book{x}\n").unwrap();
        dir
    }

    fn relative_paths(corpus: &Corpus) -> Vec<String> {
        corpus
            .documents()
            .iter()
            .map(|doc| slash_path(&doc.relative_path))
            .collect()
    }

    #[test]
    fn test_discover_collects_documents_in_path_order() {
        let dir = project();
        let corpus = discover(&dir.path().join("main.tex"), &CorpusOptions::default()).unwrap();
        assert_eq!(
            relative_paths(&corpus),
            vec![
                "chapters/drafts/old.tex",
                "chapters/intro.tex",
                "chapters/method.tex",
                "main.tex"
            ]
        );
        assert_eq!(corpus.documents()[1].original_text, "Intro text.\n");
    }

    #[test]
    fn test_discover_applies_exclude_globs() {
        let dir = project();
        let options = CorpusOptions {
            exclude: vec!["chapters/drafts/*".to_string(), "main.tex".to_string()],
            ..CorpusOptions::default()
        };
        let corpus = discover(&dir.path().join("main.tex"), &options).unwrap();
        assert_eq!(
            relative_paths(&corpus),
            vec!["chapters/intro.tex", "chapters/method.tex"]
        );
        assert!(corpus.assets().contains(&PathBuf::from("main.tex")));
    }

    #[test]
    fn test_discover_reports_other_files_as_assets() {
        let dir = project();
        let corpus = discover(&dir.path().join("main.tex"), &CorpusOptions::default()).unwrap();
        let assets: Vec<String> = corpus.assets().iter().map(|p| slash_path(p)).collect();
        assert_eq!(assets, vec!["figures/plot.pdf", "refs.bib"]);
    }

    #[test]
    fn test_discover_skips_hidden_and_skip_dirs() {
        let dir = project();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/hook.tex"), "x").unwrap();
        fs::create_dir_all(dir.path().join("out")).unwrap();
        fs::write(dir.path().join("out/main.tex"), "x").unwrap();

        let options = CorpusOptions {
            skip_dirs: vec![dir.path().join("out")],
            ..CorpusOptions::default()
        };
        let corpus = discover(&dir.path().join("main.tex"), &options).unwrap();
        let paths = relative_paths(&corpus);
        assert!(!paths.iter().any(|p| p.starts_with(".git") || p.starts_with("out")));
    }

    #[test]
    fn test_discover_missing_root_is_not_found() {
        let err = discover(
            Path::new("/nonexistent/project/main.tex"),
            &CorpusOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CorpusError::RootNotFound { .. }));
    }

    #[test]
    fn test_discover_without_documents_is_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let err = discover(&dir.path().join("main.tex"), &CorpusOptions::default()).unwrap_err();
        assert!(matches!(err, CorpusError::EmptyCorpus { .. }));
    }

    #[test]
    fn test_discover_rejects_invalid_glob() {
        let dir = project();
        let options = CorpusOptions {
            exclude: vec!["chapters/[".to_string()],
            ..CorpusOptions::default()
        };
        let err = discover(&dir.path().join("main.tex"), &options).unwrap_err();
        assert!(matches!(err, CorpusError::InvalidPattern { .. }));
    }

    #[test]
    fn test_discover_rejects_non_utf8_document() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.tex"), [0x66u8, 0x6f, 0xe9, 0x0a]).unwrap();
        let err = discover(&dir.path().join("main.tex"), &CorpusOptions::default()).unwrap_err();
        assert!(matches!(err, CorpusError::Encoding { .. }));
    }

    #[test]
    fn test_root_dir_of_bare_file_name_is_current_dir() {
        assert_eq!(root_dir(Path::new("main.tex")), PathBuf::from("."));
        assert_eq!(
            root_dir(Path::new("thesis/main.tex")),
            PathBuf::from("thesis")
        );
    }
}
