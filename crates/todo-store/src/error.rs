//! Store error type.

use todo_core::ValidationError;

/// Errors surfaced by the task store.
///
/// A missing task is never an error here: lookups return `Option` and
/// mutations report whether a row changed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage engine rejected an operation or could not be opened.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The existing schema could not be brought up to date.
    #[error("schema migration failed: {0}")]
    Migration(String),

    /// A stored row did not decode into a domain record.
    #[error("corrupt row in {table}.{column}: {detail}")]
    CorruptRow {
        /// Table the row came from.
        table: &'static str,
        /// Column that failed to decode.
        column: &'static str,
        /// What was wrong with the value.
        detail: String,
    },

    /// An explicit category add hit an existing name.
    #[error("category already exists: {0}")]
    DuplicateCategory(String),

    /// Input failed domain validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Creating the database directory failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
