//! Task CRUD, search, and filtering.

use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row, params};
use todo_core::{
    DEFAULT_CATEGORY, NewTask, Task, TaskEdit, TaskFilter, TaskId, TaskStatus, Timestamp,
};
use tracing::{debug, info, instrument};

use crate::categories;
use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers::{self, escape_like};

const TABLE: &str = "tasks";

const SELECT_TASKS: &str = "SELECT id, title, description, completed, category, status, priority, due_date, created_at FROM tasks";

/// CRUD, search, and filter over the `tasks` table.
///
/// Every call opens its own connection; nothing is cached between calls.
#[derive(Clone, Debug)]
pub struct TaskRepo {
    db: Database,
}

impl TaskRepo {
    /// Repository over `db`. The schema must already be initialized.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a task and register its category. Returns the new id.
    ///
    /// The task starts `not_started` and not completed, stamped with the
    /// current time. A blank category is stored as the default category.
    #[instrument(skip(self, task), fields(title = %task.title))]
    pub fn add(&self, task: &NewTask) -> Result<TaskId, StoreError> {
        let category = normalize_category(&task.category);
        self.db.with_tx(|conn| {
            let _ = categories::register(conn, category)?;
            let _ = conn.execute(
                "INSERT INTO tasks (title, description, completed, category, status, priority, due_date, created_at)
                 VALUES (?1, ?2, 0, ?3, ?4, ?5, ?6, ?7)",
                params![
                    task.title,
                    task.description,
                    category,
                    TaskStatus::NotStarted.as_sql(),
                    task.priority.as_sql(),
                    task.due_date.map(|d| d.to_storage()),
                    Timestamp::now().to_storage(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            info!(task_id = id, category, "task added");
            Ok(id)
        })
    }

    /// Fetch one task.
    #[instrument(skip(self))]
    pub fn get_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        self.db.with_conn(|conn| {
            let sql = format!("{SELECT_TASKS} WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([id])?;
            let task = rows.next()?.map(task_from_row).transpose()?;
            Ok(task)
        })
    }

    /// Every task, ascending id.
    #[instrument(skip(self))]
    pub fn get_all(&self) -> Result<Vec<Task>, StoreError> {
        self.db
            .with_conn(|conn| query_tasks(conn, &format!("{SELECT_TASKS} ORDER BY id"), &[]))
    }

    /// Overwrite title, description, category, priority, and due date.
    ///
    /// Status and completion are left alone. Returns `false` when no task has
    /// this id.
    #[instrument(skip(self, edit))]
    pub fn update(&self, id: TaskId, edit: &TaskEdit) -> Result<bool, StoreError> {
        let category = normalize_category(&edit.category);
        self.db.with_tx(|conn| {
            let changed = conn.execute(
                "UPDATE tasks
                 SET title = ?1, description = ?2, category = ?3, priority = ?4, due_date = ?5
                 WHERE id = ?6",
                params![
                    edit.title,
                    edit.description,
                    category,
                    edit.priority.as_sql(),
                    edit.due_date.map(|d| d.to_storage()),
                    id,
                ],
            )?;
            if changed == 0 {
                debug!(task_id = id, "update matched no task");
                return Ok(false);
            }
            let _ = categories::register(conn, category)?;
            info!(task_id = id, "task updated");
            Ok(true)
        })
    }

    /// Set the status and keep `completed` in step with it.
    #[instrument(skip(self))]
    pub fn update_status(&self, id: TaskId, status: TaskStatus) -> Result<bool, StoreError> {
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET status = ?1, completed = ?2 WHERE id = ?3",
                params![status.as_sql(), status.is_done(), id],
            )?;
            info!(task_id = id, %status, changed, "task status set");
            Ok(changed > 0)
        })
    }

    /// Flip completion in one statement.
    ///
    /// A completed task becomes `not_started`; anything else becomes `done`.
    /// Returns the new `completed` value, or `None` when no task has this id.
    #[instrument(skip(self))]
    pub fn toggle(&self, id: TaskId) -> Result<Option<bool>, StoreError> {
        self.db.with_conn(|conn| {
            // The CASE sees the pre-update value of `completed`.
            let completed = conn
                .query_row(
                    "UPDATE tasks
                     SET completed = NOT completed,
                         status = CASE WHEN completed THEN ?1 ELSE ?2 END
                     WHERE id = ?3
                     RETURNING completed",
                    params![
                        TaskStatus::NotStarted.as_sql(),
                        TaskStatus::Done.as_sql(),
                        id
                    ],
                    |row| row.get::<_, bool>(0),
                )
                .optional()?;
            info!(task_id = id, ?completed, "task toggled");
            Ok(completed)
        })
    }

    /// Hard delete. Returns `false` when no task has this id.
    #[instrument(skip(self))]
    pub fn delete(&self, id: TaskId) -> Result<bool, StoreError> {
        self.db.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
            info!(task_id = id, deleted, "task deleted");
            Ok(deleted > 0)
        })
    }

    /// Tasks whose title or description contains `query`, ascending id.
    ///
    /// Matching is ASCII case-insensitive. `%`, `_`, and `\` match literally.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str) -> Result<Vec<Task>, StoreError> {
        let pattern = format!("%{}%", escape_like(query));
        self.db.with_conn(|conn| {
            let sql = format!(
                "{SELECT_TASKS}
                 WHERE title LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\'
                 ORDER BY id"
            );
            let tasks = query_tasks(conn, &sql, &[&pattern as &dyn ToSql])?;
            debug!(count = tasks.len(), "search finished");
            Ok(tasks)
        })
    }

    /// Tasks matching every given criterion, ordered by id.
    ///
    /// A due-date bound excludes tasks without a due date.
    #[instrument(skip(self))]
    pub fn filter(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(category) = filter.effective_category() {
            conditions.push("category = ?");
            values.push(Box::new(category.to_string()));
        }
        if let Some(priority) = filter.priority {
            conditions.push("priority = ?");
            values.push(Box::new(priority.as_sql()));
        }
        if let Some(status) = filter.status {
            conditions.push("status = ?");
            values.push(Box::new(status.as_sql()));
        }
        if let Some(from) = filter.date_from {
            conditions.push("due_date >= ?");
            values.push(Box::new(from.to_storage()));
        }
        if let Some(to) = filter.date_to {
            conditions.push("due_date <= ?");
            values.push(Box::new(to.to_storage()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "{SELECT_TASKS}{where_clause} ORDER BY id {}",
            filter.sort_order.as_sql()
        );

        self.db.with_conn(|conn| {
            let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
            let tasks = query_tasks(conn, &sql, &refs)?;
            debug!(count = tasks.len(), "filter finished");
            Ok(tasks)
        })
    }
}

fn normalize_category(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.is_empty() { DEFAULT_CATEGORY } else { trimmed }
}

fn query_tasks(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<Task>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(task_from_row(row)?);
    }
    Ok(tasks)
}

fn task_from_row(row: &Row<'_>) -> Result<Task, StoreError> {
    let status: String = row_helpers::get(row, TABLE, "status")?;
    let priority: String = row_helpers::get(row, TABLE, "priority")?;
    let due_date: Option<String> = row_helpers::get_opt(row, TABLE, "due_date")?;
    let created_at: Option<String> = row_helpers::get_opt(row, TABLE, "created_at")?;

    Ok(Task {
        id: row_helpers::get(row, TABLE, "id")?,
        title: row_helpers::get(row, TABLE, "title")?,
        description: row_helpers::get_opt(row, TABLE, "description")?.unwrap_or_default(),
        completed: row_helpers::get(row, TABLE, "completed")?,
        category: row_helpers::get_opt(row, TABLE, "category")?
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        status: row_helpers::parse_enum(&status, TABLE, "status")?,
        priority: row_helpers::parse_enum(&priority, TABLE, "priority")?,
        due_date: due_date
            .map(|raw| row_helpers::parse_timestamp(&raw, TABLE, "due_date"))
            .transpose()?,
        created_at: created_at
            .map(|raw| row_helpers::parse_timestamp(&raw, TABLE, "created_at"))
            .transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use todo_core::{SortOrder, TaskPriority};

    use super::*;
    use crate::TaskStore;

    fn store() -> TaskStore {
        TaskStore::in_memory().unwrap()
    }

    fn ts(raw: &str) -> Timestamp {
        Timestamp::parse(raw).unwrap()
    }

    fn ids(tasks: &[Task]) -> Vec<TaskId> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn add_assigns_defaults() {
        let store = store();
        let id = store.tasks().add(&NewTask::new("Buy milk")).unwrap();
        let task = store.tasks().get_by_id(id).unwrap().unwrap();
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "");
        assert_eq!(task.category, DEFAULT_CATEGORY);
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert_eq!(task.priority, TaskPriority::None);
        assert!(!task.completed);
        assert!(task.due_date.is_none());
        assert!(task.created_at.is_some());
    }

    #[test]
    fn add_registers_new_category() {
        let store = store();
        let _ = store
            .tasks()
            .add(&NewTask::new("Plant tomatoes").category("Garden"))
            .unwrap();
        assert!(store.categories().list().unwrap().contains(&"Garden".to_string()));
    }

    #[test]
    fn add_with_existing_category_is_silent() {
        let store = store();
        let before = store.categories().list().unwrap().len();
        let _ = store.tasks().add(&NewTask::new("Email").category("Work")).unwrap();
        assert_eq!(store.categories().list().unwrap().len(), before);
    }

    #[test]
    fn blank_category_falls_back_to_default() {
        let store = store();
        let id = store.tasks().add(&NewTask::new("Odd").category("  ")).unwrap();
        let task = store.tasks().get_by_id(id).unwrap().unwrap();
        assert_eq!(task.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn due_date_round_trips() {
        let store = store();
        let due = ts("2030-01-15 09:30");
        let id = store.tasks().add(&NewTask::new("Dentist").due(due)).unwrap();
        let task = store.tasks().get_by_id(id).unwrap().unwrap();
        assert_eq!(task.due_date, Some(due));
    }

    #[test]
    fn get_missing_is_none() {
        assert!(store().tasks().get_by_id(42).unwrap().is_none());
    }

    #[test]
    fn get_all_is_ordered_by_id() {
        let store = store();
        let a = store.tasks().add(&NewTask::new("a")).unwrap();
        let b = store.tasks().add(&NewTask::new("b")).unwrap();
        let c = store.tasks().add(&NewTask::new("c")).unwrap();
        assert_eq!(ids(&store.tasks().get_all().unwrap()), vec![a, b, c]);
    }

    #[test]
    fn update_overwrites_fields_but_not_status() {
        let store = store();
        let id = store.tasks().add(&NewTask::new("Draft")).unwrap();
        assert!(store.tasks().update_status(id, TaskStatus::InProgress).unwrap());

        let edit = TaskEdit {
            title: "Final".to_string(),
            description: "ship it".to_string(),
            category: "Study".to_string(),
            priority: TaskPriority::Urgent,
            due_date: Some(ts("2031-02-03")),
        };
        assert!(store.tasks().update(id, &edit).unwrap());

        let task = store.tasks().get_by_id(id).unwrap().unwrap();
        assert_eq!(TaskEdit::from(&task), edit);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(!task.completed);
    }

    #[test]
    fn update_can_clear_due_date() {
        let store = store();
        let id = store
            .tasks()
            .add(&NewTask::new("Call").due(ts("2030-05-05")))
            .unwrap();
        let mut edit = TaskEdit::from(&store.tasks().get_by_id(id).unwrap().unwrap());
        edit.due_date = None;
        assert!(store.tasks().update(id, &edit).unwrap());
        assert!(store.tasks().get_by_id(id).unwrap().unwrap().due_date.is_none());
    }

    #[test]
    fn update_missing_is_false_and_registers_nothing() {
        let store = store();
        let edit = TaskEdit {
            title: "Ghost".to_string(),
            description: String::new(),
            category: "Phantom".to_string(),
            priority: TaskPriority::None,
            due_date: None,
        };
        assert!(!store.tasks().update(99, &edit).unwrap());
        assert!(!store.categories().list().unwrap().contains(&"Phantom".to_string()));
    }

    #[test]
    fn update_status_keeps_completed_in_sync() {
        let store = store();
        let id = store.tasks().add(&NewTask::new("Run")).unwrap();

        assert!(store.tasks().update_status(id, TaskStatus::Done).unwrap());
        let task = store.tasks().get_by_id(id).unwrap().unwrap();
        assert!(task.completed);

        assert!(store.tasks().update_status(id, TaskStatus::InProgress).unwrap());
        let task = store.tasks().get_by_id(id).unwrap().unwrap();
        assert!(!task.completed);
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[test]
    fn update_status_missing_is_false() {
        assert!(!store().tasks().update_status(5, TaskStatus::Done).unwrap());
    }

    #[test]
    fn toggle_flips_and_derives_status() {
        let store = store();
        let id = store.tasks().add(&NewTask::new("Read")).unwrap();

        assert_eq!(store.tasks().toggle(id).unwrap(), Some(true));
        let task = store.tasks().get_by_id(id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Done);

        assert_eq!(store.tasks().toggle(id).unwrap(), Some(false));
        let task = store.tasks().get_by_id(id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert!(!task.completed);
    }

    #[test]
    fn toggle_in_progress_completes() {
        let store = store();
        let id = store.tasks().add(&NewTask::new("Paint")).unwrap();
        let _ = store.tasks().update_status(id, TaskStatus::InProgress).unwrap();
        assert_eq!(store.tasks().toggle(id).unwrap(), Some(true));
        assert_eq!(
            store.tasks().get_by_id(id).unwrap().unwrap().status,
            TaskStatus::Done
        );
    }

    #[test]
    fn toggle_missing_is_none() {
        assert_eq!(store().tasks().toggle(7).unwrap(), None);
    }

    #[test]
    fn delete_removes_task() {
        let store = store();
        let id = store.tasks().add(&NewTask::new("Temp")).unwrap();
        assert!(store.tasks().delete(id).unwrap());
        assert!(store.tasks().get_by_id(id).unwrap().is_none());
        assert!(!store.tasks().delete(id).unwrap());
    }

    #[test]
    fn search_matches_title_or_description_case_insensitively() {
        let store = store();
        let a = store.tasks().add(&NewTask::new("Buy MILK")).unwrap();
        let b = store
            .tasks()
            .add(&NewTask::new("Groceries").description("milk and eggs"))
            .unwrap();
        let _ = store.tasks().add(&NewTask::new("Gym")).unwrap();
        assert_eq!(ids(&store.tasks().search("milk").unwrap()), vec![a, b]);
    }

    #[test]
    fn search_empty_query_matches_all() {
        let store = store();
        let _ = store.tasks().add(&NewTask::new("one")).unwrap();
        let _ = store.tasks().add(&NewTask::new("two")).unwrap();
        assert_eq!(store.tasks().search("").unwrap().len(), 2);
    }

    #[test]
    fn search_wildcards_match_literally() {
        let store = store();
        let pct = store.tasks().add(&NewTask::new("Save 100% effort")).unwrap();
        let _ = store.tasks().add(&NewTask::new("Save 1000 coins")).unwrap();
        let under = store.tasks().add(&NewTask::new("rename file_a")).unwrap();
        let _ = store.tasks().add(&NewTask::new("rename fileXa")).unwrap();

        assert_eq!(ids(&store.tasks().search("100%").unwrap()), vec![pct]);
        assert_eq!(ids(&store.tasks().search("file_a").unwrap()), vec![under]);
    }

    #[test]
    fn filter_without_criteria_returns_all() {
        let store = store();
        let a = store.tasks().add(&NewTask::new("a")).unwrap();
        let b = store.tasks().add(&NewTask::new("b")).unwrap();
        assert_eq!(
            ids(&store.tasks().filter(&TaskFilter::default()).unwrap()),
            vec![a, b]
        );
    }

    #[test]
    fn filter_combines_criteria() {
        let store = store();
        let hit = store
            .tasks()
            .add(&NewTask::new("Report").category("Work").priority(TaskPriority::Urgent))
            .unwrap();
        let _ = store
            .tasks()
            .add(&NewTask::new("Memo").category("Work").priority(TaskPriority::Normal))
            .unwrap();
        let _ = store
            .tasks()
            .add(&NewTask::new("Laundry").category("Home").priority(TaskPriority::Urgent))
            .unwrap();

        let filter = TaskFilter {
            category: Some("Work".to_string()),
            priority: Some(TaskPriority::Urgent),
            status: Some(TaskStatus::NotStarted),
            ..TaskFilter::default()
        };
        assert_eq!(ids(&store.tasks().filter(&filter).unwrap()), vec![hit]);
    }

    #[test]
    fn filter_all_sentinel_is_ignored() {
        let store = store();
        let _ = store.tasks().add(&NewTask::new("a").category("Work")).unwrap();
        let _ = store.tasks().add(&NewTask::new("b").category("Home")).unwrap();
        let filter = TaskFilter {
            category: Some("ALL".to_string()),
            ..TaskFilter::default()
        };
        assert_eq!(store.tasks().filter(&filter).unwrap().len(), 2);
    }

    #[test]
    fn filter_date_range_is_inclusive_and_skips_undated() {
        let store = store();
        let early = store
            .tasks()
            .add(&NewTask::new("early").due(ts("2030-01-01 00:00")))
            .unwrap();
        let mid = store
            .tasks()
            .add(&NewTask::new("mid").due(ts("2030-01-15 12:00")))
            .unwrap();
        let _late = store
            .tasks()
            .add(&NewTask::new("late").due(ts("2030-02-01 00:00")))
            .unwrap();
        let _undated = store.tasks().add(&NewTask::new("undated")).unwrap();

        let filter = TaskFilter {
            date_from: Some(ts("2030-01-01")),
            date_to: Some(ts("2030-01-15 12:00")),
            ..TaskFilter::default()
        };
        assert_eq!(ids(&store.tasks().filter(&filter).unwrap()), vec![early, mid]);
    }

    #[test]
    fn filter_descending_order() {
        let store = store();
        let a = store.tasks().add(&NewTask::new("a")).unwrap();
        let b = store.tasks().add(&NewTask::new("b")).unwrap();
        let filter = TaskFilter {
            sort_order: SortOrder::Descending,
            ..TaskFilter::default()
        };
        assert_eq!(ids(&store.tasks().filter(&filter).unwrap()), vec![b, a]);
    }

    #[test]
    fn corrupt_status_fails_loudly() {
        let store = store();
        let id = store.tasks().add(&NewTask::new("x")).unwrap();
        store
            .database()
            .with_conn(|conn| {
                let _ = conn.execute("UPDATE tasks SET status = 'paused' WHERE id = ?1", [id])?;
                Ok(())
            })
            .unwrap();
        assert_matches!(
            store.tasks().get_by_id(id),
            Err(StoreError::CorruptRow { table: "tasks", column: "status", .. })
        );
    }

    #[test]
    fn corrupt_due_date_fails_loudly() {
        let store = store();
        let id = store.tasks().add(&NewTask::new("x")).unwrap();
        store
            .database()
            .with_conn(|conn| {
                let _ = conn.execute("UPDATE tasks SET due_date = 'soon' WHERE id = ?1", [id])?;
                Ok(())
            })
            .unwrap();
        assert_matches!(
            store.tasks().get_all(),
            Err(StoreError::CorruptRow { column: "due_date", .. })
        );
    }
}
