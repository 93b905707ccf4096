//! Persistence layer: libSQL-backed storage for work items, workers and decisions.

mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{AssignmentCommit, Database};
