//! Integration tests for the gateway.

pub mod common;
pub mod http_test;
pub mod postgres_test;
