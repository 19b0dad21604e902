//! Error types for the diagnostics gateway.
//!
//! `GatewayError` covers process-level failures (startup, configuration,
//! connecting). `ExecutionError` is the per-request failure taxonomy carried
//! inside an execution outcome and never aborts the process.

use thiserror::Error;

/// Main error type for gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, constraint violations, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (invalid config file, bad environment values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the bare message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(msg) | Self::Query(msg) | Self::Config(msg) | Self::Internal(msg) => {
                msg
            }
        }
    }
}

/// Result type alias using GatewayError.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Why a single query execution failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The identifier is not in the catalog. Raised before the database is touched.
    #[error("Invalid query ID")]
    InvalidQuery { id: String },

    /// The database did not answer within the configured bound.
    #[error("Query timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The database call failed; the driver message is kept verbatim.
    #[error("{0}")]
    Database(String),
}

/// Coarse classification of an `ExecutionError`, used for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Caller error: the request named something that does not exist.
    InvalidQuery,
    /// Execution error: timeout or database failure.
    Execution,
}

impl ExecutionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidQuery { .. } => FailureKind::InvalidQuery,
            Self::Timeout { .. } | Self::Database(_) => FailureKind::Execution,
        }
    }
}

impl From<GatewayError> for ExecutionError {
    fn from(err: GatewayError) -> Self {
        Self::Database(err.message().to_string())
    }
}
