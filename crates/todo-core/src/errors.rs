//! Validation errors raised while turning user input into domain types.

use thiserror::Error;

/// Input rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Timestamp text did not match any accepted format.
    #[error("invalid timestamp '{0}': expected YYYY-MM-DD HH:MM[:SS]")]
    Timestamp(String),

    /// Unknown task status.
    #[error("unknown task status '{0}' (expected not_started, in_progress, or done)")]
    Status(String),

    /// Unknown task priority.
    #[error("unknown task priority '{0}' (expected urgent, important, normal, or none)")]
    Priority(String),

    /// Unknown sort order.
    #[error("unknown sort order '{0}' (expected asc or desc)")]
    SortOrder(String),

    /// Task title was empty or whitespace.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// Category name was empty or whitespace.
    #[error("category name must not be empty")]
    EmptyCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_display_includes_input() {
        let err = ValidationError::Timestamp("tomorrow".to_string());
        assert!(err.to_string().contains("'tomorrow'"));
    }

    #[test]
    fn empty_title_display() {
        assert_eq!(
            ValidationError::EmptyTitle.to_string(),
            "task title must not be empty"
        );
    }
}
