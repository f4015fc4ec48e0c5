//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the config file or stopword lists.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config or stopword file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or contains unknown keys.
    #[error(
        "failed to parse config file {path}: {source}\n  Suggestion: check the key names and value types"
    )]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// TOML deserialization error.
        #[source]
        source: toml::de::Error,
    },

    /// A key holds a value outside its accepted range.
    #[error("invalid config value for `{key}`: {value}. Expected: {expected}")]
    InvalidValue {
        /// Offending key.
        key: &'static str,
        /// The rejected value.
        value: String,
        /// What the key accepts.
        expected: &'static str,
    },
}
