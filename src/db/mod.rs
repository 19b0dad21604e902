//! Database abstraction layer.
//!
//! Provides a trait-based interface for running SQL, so the executor can be
//! driven by PostgreSQL in production and by in-memory doubles in tests.

mod mock;
mod postgres;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use types::{ColumnInfo, IntervalParts, QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the interface for database clients.
///
/// Implementations must tolerate concurrent calls and must not corrupt shared
/// state when a caller stops waiting on a call that is still running.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL statement and returns the columns and rows it produced.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
