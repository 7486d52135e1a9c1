//! Category records and the implicit registration used by task writes.

use rusqlite::Connection;
use todo_core::{DEFAULT_CATEGORY, validate_category_name};
use tracing::{debug, info, instrument};

use crate::database::Database;
use crate::error::StoreError;

/// Category bookkeeping: the explicit list used for listing and autocomplete.
///
/// Any string a task uses is a valid category; records here exist
/// independently of whether a task currently refers to them.
#[derive(Clone, Debug)]
pub struct CategoryRepo {
    db: Database,
}

impl CategoryRepo {
    /// Repository over `db`. The schema must already be initialized.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All category names, alphabetical.
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT DISTINCT name FROM categories ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            debug!(count = names.len(), "listed categories");
            Ok(names)
        })
    }

    /// Explicitly add a category. Fails with `DuplicateCategory` when the name
    /// is already recorded.
    #[instrument(skip(self))]
    pub fn add(&self, name: &str) -> Result<(), StoreError> {
        let name = validate_category_name(name)?;
        self.db.with_conn(|conn| {
            if register(conn, &name)? {
                info!(category = %name, "category added");
                Ok(())
            } else {
                Err(StoreError::DuplicateCategory(name.clone()))
            }
        })
    }

    /// Delete a category record and move its tasks to the default category.
    ///
    /// Returns the number of reassigned tasks. Deleting the default category
    /// itself only removes the record.
    #[instrument(skip(self))]
    pub fn delete(&self, name: &str) -> Result<usize, StoreError> {
        self.db.with_tx(|conn| {
            let removed = conn.execute("DELETE FROM categories WHERE name = ?1", [name])?;
            if name == DEFAULT_CATEGORY {
                info!(category = %name, removed, "category deleted");
                return Ok(0);
            }

            let reassigned = conn.execute(
                "UPDATE tasks SET category = ?1 WHERE category = ?2",
                [DEFAULT_CATEGORY, name],
            )?;
            if reassigned > 0 {
                let _ = register(conn, DEFAULT_CATEGORY)?;
            }
            info!(category = %name, removed, reassigned, "category deleted");
            Ok(reassigned)
        })
    }
}

/// Insert-or-ignore a category name. Returns whether a record was created.
pub(crate) fn register(conn: &Connection, name: &str) -> Result<bool, StoreError> {
    let inserted = conn.execute("INSERT OR IGNORE INTO categories (name) VALUES (?1)", [name])?;
    Ok(inserted > 0)
}
