//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Why `~/.todo/settings.json` could not be turned into [`crate::TodoSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The settings file is not valid JSON.
    #[error("{} is not valid JSON: {source}", path.display())]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Parser failure with line and column.
        source: serde_json::Error,
    },
    /// The merged document has a value of the wrong type, such as a string
    /// where `busyTimeoutMs` expects a number.
    #[error("settings have the wrong shape: {0}")]
    Shape(#[from] serde_json::Error),
    /// `database.path` is blank after merging every layer.
    #[error("database.path must not be empty")]
    EmptyDatabasePath,
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
