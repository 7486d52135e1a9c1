//! Core types for the task tracker.
//!
//! Enum text values are the exact strings stored in the `tasks` table.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::timestamp::Timestamp;

/// Store-assigned task identifier.
pub type TaskId = i64;

/// Category assigned when none is given, and the target of category deletion.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Categories seeded into an empty category table on first initialization.
pub const STANDARD_CATEGORIES: [&str; 7] = [
    "Work",
    "Home",
    "Study",
    "Sport",
    "Shopping",
    "Health",
    DEFAULT_CATEGORY,
];

/// Filter sentinel meaning "do not narrow on this criterion".
pub const FILTER_ALL: &str = "all";

// ─────────────────────────────────────────────────────────────────────────────
// Enums
// ─────────────────────────────────────────────────────────────────────────────

/// Task workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet.
    #[default]
    NotStarted,
    /// Being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// All variants in workflow order.
    pub const ALL: [Self; 3] = [Self::NotStarted, Self::InProgress, Self::Done];

    /// Whether this status counts as completed.
    #[must_use]
    pub fn is_done(self) -> bool {
        self == Self::Done
    }

    /// SQL string representation.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(ValidationError::Status(s.to_string())),
        }
    }
}

/// Task priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Needs attention now.
    Urgent,
    /// Should be done soon.
    Important,
    /// Regular task.
    Normal,
    /// No priority assigned.
    #[default]
    None,
}

impl TaskPriority {
    /// All variants, most pressing first.
    pub const ALL: [Self; 4] = [Self::Urgent, Self::Important, Self::Normal, Self::None];

    /// SQL string representation.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Important => "important",
            Self::Normal => "normal",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for TaskPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urgent" => Ok(Self::Urgent),
            "important" => Ok(Self::Important),
            "normal" => Ok(Self::Normal),
            "none" => Ok(Self::None),
            _ => Err(ValidationError::Priority(s.to_string())),
        }
    }
}

/// Result ordering by task id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first.
    #[default]
    Ascending,
    /// Newest first.
    Descending,
}

impl SortOrder {
    /// SQL keyword.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            _ => Err(ValidationError::SortOrder(s.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────────────────

/// A persisted task.
///
/// `completed` mirrors `status == Done`; the store writes both together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned id.
    pub id: TaskId,
    /// Short title, never empty.
    pub title: String,
    /// Free text, may be empty.
    pub description: String,
    /// Whether the task is done.
    pub completed: bool,
    /// Category name.
    pub category: String,
    /// Workflow status.
    pub status: TaskStatus,
    /// Priority level.
    pub priority: TaskPriority,
    /// Optional deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Timestamp>,
    /// Creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl Task {
    /// Whether the task is past due at `now`.
    ///
    /// A task is overdue when it has a due date, is not done, and the due
    /// date is strictly before `now`.
    pub fn is_overdue_at(&self, now: Timestamp) -> bool {
        match self.due_date {
            Some(due) => !self.status.is_done() && due < now,
            None => false,
        }
    }

    /// [`Task::is_overdue_at`] evaluated against the current local time.
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Timestamp::now())
    }
}

/// Input for creating a task. Has no id until the store assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Title (required).
    pub title: String,
    /// Description (default: empty).
    pub description: String,
    /// Category (default: [`DEFAULT_CATEGORY`]).
    pub category: String,
    /// Priority (default: none).
    pub priority: TaskPriority,
    /// Deadline.
    pub due_date: Option<Timestamp>,
}

impl NewTask {
    /// A task with the given title and every other field defaulted.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the deadline.
    #[must_use]
    pub fn due(mut self, due_date: Timestamp) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

impl Default for NewTask {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            priority: TaskPriority::None,
            due_date: None,
        }
    }
}

/// Full replacement of a task's editable fields. Status is not editable here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEdit {
    /// New title.
    pub title: String,
    /// New description.
    pub description: String,
    /// New category.
    pub category: String,
    /// New priority.
    pub priority: TaskPriority,
    /// New deadline (`None` clears it).
    pub due_date: Option<Timestamp>,
}

impl From<&Task> for TaskEdit {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            category: task.category.clone(),
            priority: task.priority,
            due_date: task.due_date,
        }
    }
}

/// Criteria for `filter`. `None` fields do not narrow the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Exact category match. The [`FILTER_ALL`] sentinel is ignored.
    pub category: Option<String>,
    /// Exact priority match.
    pub priority: Option<TaskPriority>,
    /// Exact status match.
    pub status: Option<TaskStatus>,
    /// Inclusive lower bound on the due date.
    pub date_from: Option<Timestamp>,
    /// Inclusive upper bound on the due date.
    pub date_to: Option<Timestamp>,
    /// Ordering by id.
    pub sort_order: SortOrder,
}

impl TaskFilter {
    /// Category criterion with the "all" sentinel and blanks removed.
    pub fn effective_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty() && !c.eq_ignore_ascii_case(FILTER_ALL))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Input helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Parse a filter criterion, mapping the "all" sentinel (or blank) to `None`.
pub fn parse_criterion<T: FromStr>(raw: &str) -> Result<Option<T>, T::Err> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(FILTER_ALL) {
        return Ok(None);
    }
    trimmed.parse().map(Some)
}

/// Trim a task title and reject it when blank.
pub fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Trim a category name and reject it when blank.
pub fn validate_category_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyCategory);
    }
    Ok(trimmed.to_string())
}
