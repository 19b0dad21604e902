//! Time-bounded execution of catalog queries.
//!
//! The database call runs as its own task and is raced against a timer.
//! Whichever settles first decides the outcome. When the timer wins the task
//! is detached, not aborted: the statement may keep running on the server.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::catalog::{QueryCatalog, QuerySummary};
use crate::db::{DatabaseClient, QueryResult, Row};
use crate::error::ExecutionError;
use crate::normalize::normalize_row;
use crate::sanitize::{filter_columns, EXCLUDED_COLUMNS};

/// Runs catalog queries against a database with a timeout.
///
/// Cheap to clone; clones share the database client and the catalog.
#[derive(Clone)]
pub struct QueryExecutor {
    db: Arc<dyn DatabaseClient>,
    catalog: Arc<QueryCatalog>,
    timeout: Duration,
}

impl QueryExecutor {
    /// Creates a new query executor.
    pub fn new(db: Arc<dyn DatabaseClient>, catalog: Arc<QueryCatalog>, timeout: Duration) -> Self {
        Self {
            db,
            catalog,
            timeout,
        }
    }

    /// Queries the executor will accept, in catalog order.
    pub fn list_available_queries(&self) -> Vec<QuerySummary> {
        self.catalog.list()
    }

    /// Executes the catalog query named `query_id`.
    ///
    /// Unknown ids fail before the database is touched. Every failure is
    /// reported in the outcome; nothing is retried.
    pub async fn execute(&self, query_id: &str) -> ExecutionOutcome {
        let Some(definition) = self.catalog.get(query_id) else {
            return ExecutionOutcome::Failure {
                error: ExecutionError::InvalidQuery {
                    id: query_id.to_string(),
                },
                elapsed: Duration::ZERO,
            };
        };

        info!(query_id, "EXECUTE QUERY");

        let start = Instant::now();
        let timeout_ms = self.timeout.as_millis() as u64;

        let db = Arc::clone(&self.db);
        let sql = definition.sql.clone();
        let call = tokio::spawn(async move { db.execute_query(&sql).await });

        let settled = tokio::select! {
            biased;
            joined = call => match joined {
                Ok(result) => result.map_err(ExecutionError::from),
                Err(e) => Err(ExecutionError::Database(format!("Query task failed: {e}"))),
            },
            _ = tokio::time::sleep(self.timeout) => {
                debug!(query_id, timeout_ms, "abandoning query that outlived its timeout");
                Err(ExecutionError::Timeout { timeout_ms })
            }
        };

        let elapsed = start.elapsed();
        match settled {
            Ok(raw) => ExecutionOutcome::Success {
                payload: QueryPayload::from_raw(raw),
                elapsed,
            },
            Err(error) => ExecutionOutcome::Failure { error, elapsed },
        }
    }
}

/// Sanitized result of a successful query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPayload {
    /// Rows with their duration field normalized to milliseconds.
    pub rows: Vec<Row>,
    /// Column names with the excluded columns removed.
    pub columns: Vec<String>,
}

impl QueryPayload {
    /// Applies column filtering and duration normalization to a raw result.
    pub fn from_raw(raw: QueryResult) -> Self {
        let columns = filter_columns(&raw.columns, EXCLUDED_COLUMNS);
        let rows = raw
            .rows
            .into_iter()
            .map(|mut row| {
                normalize_row(&mut row);
                row
            })
            .collect();
        Self { rows, columns }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Result of one `execute` call. Both variants carry the wall-clock time spent.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// The query completed before the timeout.
    Success {
        payload: QueryPayload,
        elapsed: Duration,
    },
    /// The id was unknown, the query timed out, or the database failed.
    Failure {
        error: ExecutionError,
        elapsed: Duration,
    },
}

impl ExecutionOutcome {
    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Success { elapsed, .. } | Self::Failure { elapsed, .. } => *elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Human-readable failure message, if this is a failure.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error.to_string()),
        }
    }
}
