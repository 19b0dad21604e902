//! Mock database clients for testing.
//!
//! Provides in-memory database implementations that record how they are used,
//! so executor and gateway tests can run without PostgreSQL.

use super::{DatabaseClient, QueryResult};
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock database client that returns a predefined result.
///
/// Counts calls as they start and as they finish, and remembers the SQL it
/// was given. An optional delay makes each call take that long to settle.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    result: QueryResult,
    delay: Option<Duration>,
    calls: AtomicUsize,
    completed: AtomicUsize,
    statements: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a mock client that answers every query with an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock client that answers every query with `result`.
    pub fn with_result(result: QueryResult) -> Self {
        Self {
            result,
            ..Self::default()
        }
    }

    /// Makes every call wait `delay` before settling.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Wraps the client for sharing with an executor.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Number of calls that have been issued.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of calls that have settled.
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// SQL statements received, in call order.
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut statements) = self.statements.lock() {
            statements.push(sql.to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A mock database client whose every query fails with a fixed message.
#[derive(Debug)]
pub struct FailingDatabaseClient {
    message: String,
    calls: AtomicUsize,
}

impl FailingDatabaseClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GatewayError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
