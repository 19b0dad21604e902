//! HTTP surface of the gateway.
//!
//! Maps requests onto the query executor and its outcomes onto JSON
//! responses: 400 for unknown ids or unreadable bodies, 500 for timeouts and
//! database failures.

use std::future::Future;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::catalog::QuerySummary;
use crate::db::Row;
use crate::error::{FailureKind, GatewayError, Result};
use crate::query::{ExecutionOutcome, QueryExecutor};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub executor: QueryExecutor,
}

impl AppState {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }
}

/// Builds the router with all routes and permissive CORS.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/queries", get(list_queries))
        .route("/api/execute", post(execute_query))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| GatewayError::internal(format!("HTTP server error: {e}")))
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!("Could not listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueriesResponse {
    pub queries: Vec<QuerySummary>,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    /// Kept loose so a non-string id is an unknown query, not a body error.
    #[serde(rename = "queryId", default)]
    pub query_id: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
struct SuccessBody {
    success: bool,
    rows: Vec<Row>,
    columns: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FailureBody {
    success: bool,
    error: String,
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_queries(State(state): State<AppState>) -> Json<QueriesResponse> {
    Json(QueriesResponse {
        queries: state.executor.list_available_queries(),
    })
}

async fn execute_query(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExecuteRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected execute request: {}", rejection.body_text());
            return failure(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let query_id = match request.query_id {
        Some(JsonValue::String(id)) => id,
        _ => String::new(),
    };

    match state.executor.execute(&query_id).await {
        ExecutionOutcome::Success { payload, elapsed } => {
            info!(
                query_id = %query_id,
                duration_ms = elapsed.as_millis() as u64,
                rows = payload.row_count(),
                "QUERY SUCCESS"
            );
            let body = SuccessBody {
                success: true,
                rows: payload.rows,
                columns: payload.columns,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        ExecutionOutcome::Failure { error, elapsed } => match error.kind() {
            FailureKind::InvalidQuery => {
                error!("Invalid query ID: {query_id}");
                failure(StatusCode::BAD_REQUEST, error.to_string())
            }
            FailureKind::Execution => {
                error!(
                    query_id = %query_id,
                    duration_ms = elapsed.as_millis() as u64,
                    error = %error,
                    "QUERY ERROR"
                );
                failure(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
        },
    }
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body = FailureBody {
        success: false,
        error: message.into(),
    };
    (status, Json(body)).into_response()
}
