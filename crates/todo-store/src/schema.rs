//! Schema creation, legacy migration, and category seeding.
//!
//! [`initialize`] is idempotent and runs once per store open, inside the
//! caller's transaction. A database written by an older build (a `tasks`
//! table with only `id, title, description, completed`, or any subset of the
//! newer columns) is rebuilt into the current layout with every row kept.

use rusqlite::Connection;
use todo_core::{STANDARD_CATEGORIES, Timestamp};
use tracing::{info, warn};

use crate::error::StoreError;

/// Applied to every connection.
pub const PRAGMAS: &str = r"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA synchronous = NORMAL;
";

/// Columns every `tasks` table has had since the first release.
pub const LEGACY_COLUMNS: [&str; 4] = ["id", "title", "description", "completed"];

/// Columns added after the first release, with the value a legacy row gets.
///
/// `status` is derived from `completed` so that migrated rows keep
/// `completed == (status == 'done')`.
const NEWER_COLUMNS: [(&str, &str); 5] = [
    ("category", "'Uncategorized'"),
    (
        "status",
        "CASE WHEN completed THEN 'done' ELSE 'not_started' END",
    ),
    ("priority", "'none'"),
    ("due_date", "NULL"),
    ("created_at", "?1"),
];

const CREATE_CATEGORIES: &str = r"
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
";

const CREATE_INDEXES: &str = r"
CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date) WHERE due_date IS NOT NULL;
";

fn create_tasks_sql(table: &str) -> String {
    format!(
        "CREATE TABLE {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT DEFAULT '',
            completed BOOLEAN NOT NULL CHECK (completed IN (0, 1)) DEFAULT 0,
            category TEXT DEFAULT 'Uncategorized',
            status TEXT DEFAULT 'not_started',
            priority TEXT DEFAULT 'none',
            due_date TEXT,
            created_at TEXT
        )"
    )
}

/// What [`initialize`] did to the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaAction {
    /// The table did not exist and was created.
    Created,
    /// The table was rebuilt to add the listed columns.
    Migrated {
        /// Columns the old table lacked.
        missing: Vec<String>,
        /// Rows copied into the new table.
        rows: usize,
    },
    /// The table already had every column.
    Current,
}

/// Outcome of [`initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReport {
    /// What happened to the `tasks` table.
    pub action: SchemaAction,
    /// Whether the standard categories were inserted.
    pub seeded: bool,
    /// Stored timestamps rewritten to `YYYY-MM-DD HH:MM:SS`.
    pub normalized: usize,
}

/// Columns holding timestamp text.
const TIMESTAMP_COLUMNS: [&str; 2] = ["due_date", "created_at"];

/// Bring the schema up to date. Run inside a transaction.
pub fn initialize(conn: &Connection) -> Result<SchemaReport, StoreError> {
    let columns = table_columns(conn, "tasks")?;

    let action = if columns.is_empty() {
        conn.execute_batch(&create_tasks_sql("tasks"))?;
        info!("created tasks table");
        SchemaAction::Created
    } else {
        let absent_legacy: Vec<&str> = LEGACY_COLUMNS
            .iter()
            .copied()
            .filter(|c| !columns.iter().any(|have| have == c))
            .collect();
        if !absent_legacy.is_empty() {
            return Err(StoreError::Migration(format!(
                "tasks table is missing base columns: {}",
                absent_legacy.join(", ")
            )));
        }

        let missing: Vec<String> = NEWER_COLUMNS
            .iter()
            .map(|(name, _)| *name)
            .filter(|c| !columns.iter().any(|have| have == c))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            SchemaAction::Current
        } else {
            warn_on_unknown_columns(&columns);
            let rows = rebuild_tasks(conn, &missing)?;
            info!(?missing, rows, "migrated tasks table");
            SchemaAction::Migrated { missing, rows }
        }
    };

    let normalized = normalize_timestamps(conn)?;
    conn.execute_batch(CREATE_CATEGORIES)?;
    let seeded = seed_categories(conn)?;
    conn.execute_batch(CREATE_INDEXES)?;

    Ok(SchemaReport {
        action,
        seeded,
        normalized,
    })
}

/// Column names of `table`, empty when the table does not exist.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn rebuild_tasks(conn: &Connection, missing: &[String]) -> Result<usize, StoreError> {
    let is_missing = |name: &str| missing.iter().any(|m| m == name);

    let select_list: Vec<String> = NEWER_COLUMNS
        .iter()
        .map(|&(name, fallback)| match (name, is_missing(name)) {
            (_, true) => fallback.to_string(),
            ("due_date" | "created_at", false) => name.to_string(),
            (_, false) => format!("COALESCE({name}, {fallback})"),
        })
        .collect();

    let copy_sql = format!(
        "INSERT INTO tasks_new
            (id, title, description, completed, category, status, priority, due_date, created_at)
         SELECT id, title, COALESCE(description, ''),
                CASE WHEN completed THEN 1 ELSE 0 END,
                {}
         FROM tasks",
        select_list.join(", ")
    );

    conn.execute_batch("DROP TABLE IF EXISTS tasks_new")?;
    conn.execute_batch(&create_tasks_sql("tasks_new"))?;

    let rows = if is_missing("created_at") {
        conn.execute(&copy_sql, [Timestamp::now().to_storage()])?
    } else {
        conn.execute(&copy_sql, [])?
    };

    conn.execute_batch("DROP TABLE tasks; ALTER TABLE tasks_new RENAME TO tasks;")?;
    Ok(rows)
}

/// Pad `YYYY-MM-DD HH:MM` and `YYYY-MM-DD` text to the storage width.
///
/// Range filters compare timestamps as text, so every stored value must
/// have the same width as the bound it is compared against.
fn normalize_timestamps(conn: &Connection) -> Result<usize, StoreError> {
    let mut total = 0;
    for column in TIMESTAMP_COLUMNS {
        let changed = conn.execute(
            &format!(
                "UPDATE tasks SET {column} = CASE length({column})
                     WHEN 16 THEN {column} || ':00'
                     ELSE {column} || ' 00:00:00'
                 END
                 WHERE length({column}) IN (10, 16)"
            ),
            [],
        )?;
        if changed > 0 {
            info!(column, changed, "normalized stored timestamps");
        }
        total += changed;
    }
    Ok(total)
}

fn warn_on_unknown_columns(columns: &[String]) {
    let known = |c: &str| LEGACY_COLUMNS.contains(&c) || NEWER_COLUMNS.iter().any(|(n, _)| *n == c);
    for column in columns.iter().filter(|c| !known(c.as_str())) {
        warn!(column = %column, "dropping unknown legacy column during migration");
    }
}

fn seed_categories(conn: &Connection) -> Result<bool, StoreError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(false);
    }
    let mut stmt = conn.prepare("INSERT OR IGNORE INTO categories (name) VALUES (?1)")?;
    for name in STANDARD_CATEGORIES {
        let _ = stmt.execute([name])?;
    }
    info!(count = STANDARD_CATEGORIES.len(), "seeded standard categories");
    Ok(true)
}
