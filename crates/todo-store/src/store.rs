//! The [`TaskStore`] facade.

use std::path::Path;

use tracing::info;

use crate::categories::CategoryRepo;
use crate::database::{Database, DatabaseConfig};
use crate::error::StoreError;
use crate::schema::{self, SchemaReport};
use crate::tasks::TaskRepo;

/// Entry point to the persistence layer, bound to one storage location.
///
/// Opening runs the schema manager once; afterwards every call goes through
/// [`TaskStore::tasks`] or [`TaskStore::categories`].
#[derive(Clone, Debug)]
pub struct TaskStore {
    db: Database,
    tasks: TaskRepo,
    categories: CategoryRepo,
    report: SchemaReport,
}

impl TaskStore {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with(path, DatabaseConfig::default())
    }

    /// Open with explicit connection settings.
    pub fn open_with(path: &Path, config: DatabaseConfig) -> Result<Self, StoreError> {
        Self::from_database(Database::open(path, config)?)
    }

    /// A private in-memory store (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_database(Database::in_memory()?)
    }

    /// Initialize the schema on `db` and wrap it.
    pub fn from_database(db: Database) -> Result<Self, StoreError> {
        let report = db.with_tx(schema::initialize)?;
        info!(
            path = %db.path().display(),
            action = ?report.action,
            seeded = report.seeded,
            normalized = report.normalized,
            "task store ready"
        );
        Ok(Self {
            tasks: TaskRepo::new(db.clone()),
            categories: CategoryRepo::new(db.clone()),
            db,
            report,
        })
    }

    /// Task operations.
    pub fn tasks(&self) -> &TaskRepo {
        &self.tasks
    }

    /// Category operations.
    pub fn categories(&self) -> &CategoryRepo {
        &self.categories
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// What the schema manager did when this store was opened.
    pub fn schema_report(&self) -> &SchemaReport {
        &self.report
    }
}
