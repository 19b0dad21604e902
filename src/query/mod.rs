//! Query execution for the gateway.
//!
//! This module isolates catalog lookup, time-bounded execution and result
//! post-processing from the HTTP layer.

pub mod executor;

pub use executor::{ExecutionOutcome, QueryExecutor, QueryPayload};
