//! HTTP round-trip tests against a mock database.

use std::sync::Arc;
use std::time::Duration;

use pg_diag_gateway::db::{
    ColumnInfo, FailingDatabaseClient, IntervalParts, MockDatabaseClient, QueryResult, Row, Value,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as JsonValue};

use super::common::start_server;

fn waiting_result() -> QueryResult {
    let row: Row = vec![
        ("blocked_pid", Value::Int(4242)),
        ("usename", Value::from("app")),
        (
            "age",
            Value::Interval(IntervalParts {
                hours: Some(1.0),
                minutes: Some(30.0),
                ..IntervalParts::default()
            }),
        ),
        ("blocking_pid", Value::Int(17)),
    ]
    .into_iter()
    .collect();

    QueryResult::with_data(
        vec![
            ColumnInfo::new("blocked_pid", "int4"),
            ColumnInfo::new("usename", "name"),
            ColumnInfo::new("age", "interval"),
            ColumnInfo::new("blocking_pid", "int4"),
        ],
        vec![row],
    )
}

#[tokio::test]
async fn test_list_queries() {
    let server = start_server(MockDatabaseClient::new().shared(), Duration::from_secs(1)).await;

    let response = reqwest::get(server.url("/api/queries")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "queries": [
                { "id": "lock", "name": "Lock" },
                { "id": "lockAndWho", "name": "Lock and Who" },
                { "id": "waiting", "name": "Waiting" },
            ]
        })
    );
}

#[tokio::test]
async fn test_execute_success() {
    let db = MockDatabaseClient::with_result(waiting_result()).shared();
    let server = start_server(db.clone(), Duration::from_secs(5)).await;

    let response = reqwest::Client::new()
        .post(server.url("/api/execute"))
        .json(&json!({ "queryId": "waiting" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "success": true,
            "rows": [{
                "blocked_pid": 4242,
                "usename": "app",
                "age": 5400000,
                "blocking_pid": 17,
            }],
            "columns": ["blocked_pid", "age", "blocking_pid"],
        })
    );
    assert_eq!(db.call_count(), 1);
    assert!(db.statements()[0].contains("pg_blocking_pids"));
}

#[tokio::test]
async fn test_execute_unknown_query_is_400_without_database_call() {
    let db = MockDatabaseClient::new().shared();
    let server = start_server(db.clone(), Duration::from_secs(1)).await;

    let response = reqwest::Client::new()
        .post(server.url("/api/execute"))
        .json(&json!({ "queryId": "truncateAll" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid query ID");
    assert_eq!(db.call_count(), 0);
}

#[tokio::test]
async fn test_execute_numeric_query_id_is_invalid_query() {
    let db = MockDatabaseClient::new().shared();
    let server = start_server(db.clone(), Duration::from_secs(1)).await;

    let response = reqwest::Client::new()
        .post(server.url("/api/execute"))
        .json(&json!({ "queryId": 5 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body, json!({ "success": false, "error": "Invalid query ID" }));
    assert_eq!(db.call_count(), 0);
}

#[tokio::test]
async fn test_execute_malformed_body_is_400() {
    let server = start_server(MockDatabaseClient::new().shared(), Duration::from_secs(1)).await;

    let response = reqwest::Client::new()
        .post(server.url("/api/execute"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_execute_timeout_is_500() {
    let db = MockDatabaseClient::new()
        .with_delay(Duration::from_secs(5))
        .shared();
    let server = start_server(db.clone(), Duration::from_millis(100)).await;

    let response = reqwest::Client::new()
        .post(server.url("/api/execute"))
        .json(&json!({ "queryId": "lock" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "success": false, "error": "Query timeout after 100ms" })
    );
    assert_eq!(db.completed_count(), 0);
}

#[tokio::test]
async fn test_execute_database_error_is_500() {
    let db = Arc::new(FailingDatabaseClient::new(
        "permission denied for table pg_authid",
    ));
    let server = start_server(db, Duration::from_secs(1)).await;

    let response = reqwest::Client::new()
        .post(server.url("/api/execute"))
        .json(&json!({ "queryId": "lockAndWho" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(body["error"], "permission denied for table pg_authid");
}

#[tokio::test]
async fn test_cors_headers_present() {
    let server = start_server(MockDatabaseClient::new().shared(), Duration::from_secs(1)).await;

    let response = reqwest::Client::new()
        .get(server.url("/api/queries"))
        .header("origin", "http://dashboard.local")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_healthz() {
    let server = start_server(MockDatabaseClient::new().shared(), Duration::from_secs(1)).await;

    let response = reqwest::get(server.url("/healthz")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}
