//! pg-diag-gateway - run a fixed catalog of PostgreSQL diagnostic queries over HTTP.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod normalize;
pub mod query;
pub mod sanitize;
