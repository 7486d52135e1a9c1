//! # todo-store
//!
//! SQLite persistence for the task tracker: schema creation and legacy
//! migration, task CRUD with search and filtering, and category bookkeeping.
//! Every operation runs on its own scoped connection.

#![deny(unsafe_code)]

pub mod categories;
pub mod database;
pub mod error;
pub mod row_helpers;
pub mod schema;
pub mod store;
pub mod tasks;

pub use categories::CategoryRepo;
pub use database::{Database, DatabaseConfig};
pub use error::StoreError;
pub use schema::{SchemaAction, SchemaReport};
pub use store::TaskStore;
pub use tasks::TaskRepo;
