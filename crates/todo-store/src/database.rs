//! Scoped SQLite connections.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{Connection, TransactionBehavior};
use tracing::{info, trace};

use crate::error::StoreError;
use crate::schema;

/// Connection settings applied every time a connection is opened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// How long to wait on a locked database. Zero fails immediately.
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    /// Config with the given busy timeout in milliseconds.
    pub fn with_busy_timeout_ms(ms: u32) -> Self {
        Self {
            busy_timeout: Duration::from_millis(u64::from(ms)),
        }
    }
}

#[derive(Clone, Debug)]
enum Backend {
    /// A fresh connection per operation, closed when the operation ends.
    File(PathBuf),
    /// One shared connection; an in-memory database dies with its last handle.
    Memory(Arc<Mutex<Connection>>),
}

/// Handle to the task database.
///
/// Holds no open connection for file databases: [`Database::with_conn`] and
/// [`Database::with_tx`] open one, run the closure, and drop it on every exit
/// path.
#[derive(Clone, Debug)]
pub struct Database {
    backend: Backend,
    config: DatabaseConfig,
}

impl Database {
    /// Bind to a database file, creating parent directories as needed.
    ///
    /// Opens one connection up front so an unusable path fails here.
    pub fn open(path: &Path, config: DatabaseConfig) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let db = Self {
            backend: Backend::File(path.to_owned()),
            config,
        };
        db.with_conn(|_| Ok(()))?;

        info!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let config = DatabaseConfig::default();
        let conn = Connection::open_in_memory()?;
        configure(&conn, &config)?;
        Ok(Self {
            backend: Backend::Memory(Arc::new(Mutex::new(conn))),
            config,
        })
    }

    /// Path of the database file, or `:memory:`.
    pub fn path(&self) -> &Path {
        match &self.backend {
            Backend::File(path) => path,
            Backend::Memory(_) => Path::new(":memory:"),
        }
    }

    /// Execute a closure with a scoped connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        match &self.backend {
            Backend::File(path) => {
                let conn = connect(path, &self.config)?;
                f(&conn)
            }
            Backend::Memory(shared) => {
                let conn = shared.lock();
                f(&conn)
            }
        }
    }

    /// Execute a closure inside an IMMEDIATE transaction.
    ///
    /// Commits when the closure returns `Ok`; any error rolls back.
    pub fn with_tx<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        match &self.backend {
            Backend::File(path) => {
                let mut conn = connect(path, &self.config)?;
                run_tx(&mut conn, f)
            }
            Backend::Memory(shared) => {
                let mut conn = shared.lock();
                run_tx(&mut conn, f)
            }
        }
    }
}

fn connect(path: &Path, config: &DatabaseConfig) -> Result<Connection, StoreError> {
    trace!(path = %path.display(), "opening connection");
    let conn = Connection::open(path)?;
    configure(&conn, config)?;
    Ok(conn)
}

fn configure(conn: &Connection, config: &DatabaseConfig) -> Result<(), StoreError> {
    conn.busy_timeout(config.busy_timeout)?;
    conn.execute_batch(schema::PRAGMAS)?;
    Ok(())
}

fn run_tx<F, T>(conn: &mut Connection, f: F) -> Result<T, StoreError>
where
    F: FnOnce(&Connection) -> Result<T, StoreError>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pragma<T: rusqlite::types::FromSql>(db: &Database, name: &str) -> T {
        db.with_conn(|conn| Ok(conn.query_row(&format!("PRAGMA {name}"), [], |row| row.get(0))?))
            .unwrap()
    }

    #[test]
    fn open_in_memory() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.path(), Path::new(":memory:"));
    }

    #[test]
    fn open_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("todo.db");
        let db = Database::open(&path, DatabaseConfig::default()).unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), path.as_path());
    }

    #[test]
    fn file_connections_apply_pragmas() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("todo.db"), DatabaseConfig::default()).unwrap();
        assert_eq!(pragma::<String>(&db, "journal_mode"), "wal");
        assert_eq!(pragma::<i64>(&db, "foreign_keys"), 1);
        // NORMAL
        assert_eq!(pragma::<i64>(&db, "synchronous"), 1);
        assert_eq!(pragma::<i64>(&db, "busy_timeout"), 0);
    }

    #[test]
    fn busy_timeout_is_configurable() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(
            &dir.path().join("todo.db"),
            DatabaseConfig::with_busy_timeout_ms(250),
        )
        .unwrap();
        assert_eq!(pragma::<i64>(&db, "busy_timeout"), 250);
    }

    #[test]
    fn with_tx_commits_on_ok() {
        let db = Database::in_memory().unwrap();
        db.with_tx(|conn| {
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1);")?;
            Ok(())
        })
        .unwrap();
        let count: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn with_tx_rolls_back_on_err() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| Ok(conn.execute_batch("CREATE TABLE t (x INTEGER)")?))
            .unwrap();

        let result: Result<(), StoreError> = db.with_tx(|conn| {
            let _ = conn.execute("INSERT INTO t VALUES (1)", [])?;
            Err(StoreError::Migration("boom".to_string()))
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }
}
