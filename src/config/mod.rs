//! Operator configuration file and stopword lists.
//!
//! The config file is optional TOML. Every key is optional; command-line
//! values override file values, which override built-in defaults.
//!
//! ```toml
//! distance = 150
//! stopwords = ["system", "model"]
//! stopwords_file = "thesis-stopwords.txt"
//! allowed_environments = ["theorem", "proof"]
//! unsafe_commands = ["todo"]
//! invalid_concept_substrings = ["/", "et al", "TODO"]
//! ```

mod error;

pub use error::ConfigError;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::corpus::ChapterMarker;
use crate::insertion::{LexicalRules, StopwordSet};

/// Largest accepted distance threshold.
const MAX_DISTANCE: usize = 1_000_000;

/// Largest accepted number of extracted candidates.
const MAX_EXTRACT_NUMBER: usize = 100_000;

/// TOML-backed file configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Inline stopwords.
    pub stopwords: Option<Vec<String>>,
    /// Stopword list file (one entry per line), relative to the config file.
    pub stopwords_file: Option<PathBuf>,
    /// Minimum line distance between insertions of one concept.
    pub distance: Option<usize>,
    /// Chapter marker regex.
    pub chapter_marker: Option<String>,
    /// Extra environments whose bodies may be indexed.
    pub allowed_environments: Option<Vec<String>>,
    /// Extra commands whose arguments are never indexed.
    pub unsafe_commands: Option<Vec<String>>,
    /// Concepts containing any of these are never inserted (replaces the defaults).
    pub invalid_concept_substrings: Option<Vec<String>>,
    /// Marker command name (without backslash).
    pub index_command: Option<String>,
    /// Document extension (without dot).
    pub extension: Option<String>,
    /// LaTeX-to-text program for the extract stage.
    pub detex_program: Option<String>,
    /// Environments removed by detex.
    pub detex_exclude_environments: Option<Vec<String>>,
    /// Maximum number of extracted candidates.
    pub extract_number: Option<usize>,
    /// Minimum candidate length in characters.
    pub extract_min_length: Option<usize>,
    /// Terms never proposed as concepts.
    pub extract_exclude: Option<Vec<String>>,
}

impl FileConfig {
    /// Parses a TOML document and validates it.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for invalid TOML or unknown keys and
    /// [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn from_toml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates config values against runtime and CLI constraints.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(distance) = self.distance
            && distance > MAX_DISTANCE
        {
            return Err(invalid("distance", distance, "0..=1000000"));
        }

        if let Some(pattern) = &self.chapter_marker
            && ChapterMarker::new(pattern).is_err()
        {
            return Err(invalid("chapter_marker", pattern, "a valid regular expression"));
        }

        if let Some(command) = &self.index_command
            && (command.is_empty() || !command.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(invalid("index_command", command, "a command name of ASCII letters"));
        }

        if let Some(extension) = &self.extension
            && (extension.is_empty() || extension.contains(['.', '/', '\\']))
        {
            return Err(invalid("extension", extension, "an extension without dot, e.g. \"tex\""));
        }

        if let Some(program) = &self.detex_program
            && program.trim().is_empty()
        {
            return Err(invalid("detex_program", program, "a program name or path"));
        }

        if let Some(number) = self.extract_number
            && !(1..=MAX_EXTRACT_NUMBER).contains(&number)
        {
            return Err(invalid("extract_number", number, "1..=100000"));
        }

        validate_names("allowed_environments", self.allowed_environments.as_deref())?;
        validate_names("unsafe_commands", self.unsafe_commands.as_deref())?;
        validate_names(
            "invalid_concept_substrings",
            self.invalid_concept_substrings.as_deref(),
        )?;
        validate_names(
            "detex_exclude_environments",
            self.detex_exclude_environments.as_deref(),
        )?;

        Ok(())
    }

    /// Default lexical rules extended with the configured lists.
    #[must_use]
    pub fn lexical_rules(&self) -> LexicalRules {
        LexicalRules::default()
            .with_unsafe_commands(self.unsafe_commands.iter().flatten().cloned())
            .with_allowed_environments(self.allowed_environments.iter().flatten().cloned())
    }

    /// Configured chapter marker, or the default one.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if the pattern does not compile.
    pub fn chapter_marker(&self) -> Result<ChapterMarker, ConfigError> {
        match &self.chapter_marker {
            Some(pattern) => ChapterMarker::new(pattern)
                .map_err(|_| invalid("chapter_marker", pattern, "a valid regular expression")),
            None => Ok(ChapterMarker::default()),
        }
    }
}

fn validate_names(key: &'static str, names: Option<&[String]>) -> Result<(), ConfigError> {
    for name in names.unwrap_or_default() {
        if name.trim().is_empty() {
            return Err(invalid(key, format!("{name:?}"), "non-empty names"));
        }
    }
    Ok(())
}

fn invalid(key: &'static str, value: impl ToString, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        expected,
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

impl LoadedConfig {
    /// The file config, or an empty one when no file was loaded.
    #[must_use]
    pub fn file_config(&self) -> FileConfig {
        self.config.clone().unwrap_or_default()
    }

    /// `stopwords_file` resolved against the config file's directory.
    #[must_use]
    pub fn stopwords_file(&self) -> Option<PathBuf> {
        let file = self.config.as_ref()?.stopwords_file.as_ref()?;
        if file.is_absolute() {
            return Some(file.clone());
        }
        let base = self.path.as_deref().and_then(Path::parent);
        Some(base.map_or_else(|| file.clone(), |dir| dir.join(file)))
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/texindex/config.toml`
/// 2. `$HOME/.config/texindex/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("texindex")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("texindex")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist. Without one, the default location is used
/// when present and defaults apply otherwise.
///
/// # Errors
/// Returns [`ConfigError::Read`] if the file cannot be read, plus the
/// parse and validation errors of [`FileConfig::from_toml`].
#[instrument]
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => resolve_default_config_path(),
    };
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig::default());
    };

    if explicit.is_none() && !path_ref.exists() {
        debug!(path = %path_ref.display(), "no config file, using defaults");
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    }

    let raw = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
        path: path_ref.to_path_buf(),
        source,
    })?;
    let config = FileConfig::from_toml(&raw, path_ref)?;
    debug!(path = %path_ref.display(), "config file loaded");
    Ok(LoadedConfig {
        path,
        config: Some(config),
        loaded_from_file: true,
    })
}

/// Loads a stopword list from a file (one entry per line).
///
/// Blank lines and lines starting with `#` are skipped; entries are trimmed.
///
/// # Errors
/// Returns [`ConfigError::Read`] if the file cannot be read.
#[instrument]
pub fn load_stopwords(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let stopwords = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect();

    Ok(stopwords)
}

/// Builds the stopword set from inline words and list files.
///
/// # Errors
/// Returns [`ConfigError::Read`] for the first unreadable file.
pub fn build_stopwords(inline: &[String], files: &[PathBuf]) -> Result<StopwordSet, ConfigError> {
    let mut words = inline.to_vec();
    for file in files {
        words.extend(load_stopwords(file)?);
    }
    Ok(words.into_iter().collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(raw: &str) -> Result<FileConfig, ConfigError> {
        FileConfig::from_toml(raw, Path::new("config.toml"))
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(parse("").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_full_config_parses() {
        let config = parse(
            r#"
            stopwords = ["system"]
            stopwords_file = "stop.txt"
            distance = 50
            chapter_marker = '\\chapter\{'
            allowed_environments = ["theorem"]
            unsafe_commands = ["todo"]
            invalid_concept_substrings = ["/"]
            index_command = "sindex"
            extension = "ltx"
            detex_program = "/usr/bin/detex"
            detex_exclude_environments = ["table"]
            extract_number = 20
            extract_min_length = 3
            extract_exclude = ["Figure"]
            "#,
        )
        .unwrap();

        assert_eq!(config.distance, Some(50));
        assert_eq!(config.index_command.as_deref(), Some("sindex"));
        assert_eq!(config.stopwords, Some(vec!["system".to_string()]));
        assert_eq!(config.invalid_concept_substrings, Some(vec!["/".to_string()]));
        assert_eq!(config.chapter_marker().unwrap().as_str(), r"\\chapter\{");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse("distnace = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("distnace"));
    }

    #[test]
    fn test_wrong_type_rejected() {
        assert!(matches!(
            parse("distance = \"far\"").unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn test_out_of_range_values_name_the_key() {
        let cases = [
            ("distance = 2000000", "distance"),
            ("extract_number = 0", "extract_number"),
            ("chapter_marker = \"(\"", "chapter_marker"),
            ("index_command = \"in dex\"", "index_command"),
            ("extension = \".tex\"", "extension"),
            ("detex_program = \" \"", "detex_program"),
            ("allowed_environments = [\"\"]", "allowed_environments"),
            ("invalid_concept_substrings = [\"\"]", "invalid_concept_substrings"),
        ];
        for (raw, key) in cases {
            let err = parse(raw).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { key: k, .. } if k == key),
                "{raw} -> {err}"
            );
        }
    }

    #[test]
    fn test_lexical_rules_extend_defaults() {
        let config = parse("allowed_environments = [\"theorem\"]\nunsafe_commands = [\"todo\"]").unwrap();
        let rules = config.lexical_rules();
        assert!(rules.allowed_environments.contains("theorem"));
        assert!(rules.allowed_environments.contains("document"));
        assert!(rules.unsafe_commands.contains("todo"));
        assert!(rules.unsafe_commands.contains("label"));
    }

    #[test]
    fn test_load_config_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("none.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_config_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "distance = 10").unwrap();

        let loaded = load_config(Some(file.path())).unwrap();
        assert!(loaded.loaded_from_file);
        assert_eq!(loaded.file_config().distance, Some(10));
    }

    #[test]
    fn test_stopwords_file_relative_to_config() {
        let loaded = LoadedConfig {
            path: Some(PathBuf::from("/etc/texindex/config.toml")),
            config: Some(FileConfig {
                stopwords_file: Some(PathBuf::from("stop.txt")),
                ..FileConfig::default()
            }),
            loaded_from_file: true,
        };
        assert_eq!(
            loaded.stopwords_file(),
            Some(PathBuf::from("/etc/texindex/stop.txt"))
        );
    }

    #[test]
    fn test_load_stopwords_skips_comments_and_blanks() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# thesis stopwords").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  system ").unwrap();
        writeln!(file, "model").unwrap();

        let words = load_stopwords(file.path()).unwrap();
        assert_eq!(words, vec!["system", "model"]);
    }

    #[test]
    fn test_build_stopwords_merges_sources() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "model").unwrap();

        let set = build_stopwords(&["system".to_string()], &[file.path().to_path_buf()]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("system"));
        assert!(set.contains("model"));
    }

    #[test]
    fn test_load_stopwords_missing_file() {
        let err = load_stopwords(Path::new("/nonexistent/stop.txt")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/stop.txt"));
    }
}
