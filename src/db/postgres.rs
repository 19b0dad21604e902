//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseClient, IntervalParts, QueryResult, Row, Value};
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use sqlx::postgres::types::{Oid, PgInterval};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono::SecondsFormat;
use sqlx::types::ipnetwork::IpNetwork;
use sqlx::types::{Decimal, JsonValue, Uuid};
use sqlx::{
    Column as SqlxColumn, Decode, Executor, Postgres, Row as SqlxRow, Statement, Type, TypeInfo,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum number of connection retry attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// How long a request may wait for a free pooled connection.
const ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL database client.
#[derive(Debug, Clone)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connects to the database, retrying transient failures with backoff.
    ///
    /// When `statement_timeout_ms` is set, every pooled session gets that
    /// server-side `statement_timeout`.
    pub async fn connect(
        config: &ConnectionConfig,
        statement_timeout_ms: Option<u64>,
    ) -> Result<Self> {
        let options = connect_options(config, statement_timeout_ms);

        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!("Connection attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

            let result = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
                .connect_with(options.clone())
                .await;

            match result {
                Ok(pool) => {
                    debug!("Successfully connected to database");
                    return Ok(Self { pool });
                }
                Err(e) => {
                    let is_transient = is_transient_error(&e);
                    last_error = Some(e);

                    if attempt < MAX_RETRY_ATTEMPTS && is_transient {
                        warn!(
                            "Connection attempt {} failed (transient error), retrying in {:?}",
                            attempt, delay
                        );
                        tokio::time::sleep(delay).await;
                        delay *= 2; // Exponential backoff
                    } else {
                        break;
                    }
                }
            }
        }

        match last_error {
            Some(e) => Err(map_connection_error(e, config)),
            None => Err(GatewayError::internal("no connection attempt was made")),
        }
    }

    /// Column metadata for a statement, without fetching rows.
    ///
    /// Used when a query returns no rows, so callers still see its columns.
    async fn describe_columns(&self, sql: &str) -> Vec<ColumnInfo> {
        match self.pool.prepare(sql).await {
            Ok(statement) => statement
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            Err(e) => {
                debug!("Could not describe empty result columns: {e}");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let result = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_query_error)?;

        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            None => self.describe_columns(sql).await,
        };

        let rows: Vec<Row> = result.iter().map(convert_row).collect();

        Ok(QueryResult::with_data(columns, rows))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Builds sqlx connect options, filling in the service defaults.
fn connect_options(config: &ConnectionConfig, statement_timeout_ms: Option<u64>) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(config.host_or_default())
        .port(config.port)
        .database(config.database_or_default())
        .username(config.user_or_default())
        .password(config.password_or_default());

    match statement_timeout_ms {
        Some(ms) => options.options([("statement_timeout", ms.to_string())]),
        None => options,
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| {
            (
                col.name().to_string(),
                convert_value(row, i, col.type_info().name()),
            )
        })
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
///
/// Types without a dedicated decoder fall back to their text form.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    let decoded = match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => decode::<bool>(row, index).map(Value::from),

        "INT2" | "SMALLINT" => decode::<i16>(row, index).map(|v| Value::from(v.map(i64::from))),

        "INT4" | "INT" | "INTEGER" => decode::<i32>(row, index).map(Value::from),

        "INT8" | "BIGINT" => decode::<i64>(row, index).map(Value::from),

        "OID" => decode::<Oid>(row, index).map(|v| Value::from(v.map(|oid| i64::from(oid.0)))),

        // Transaction and command ids are unsigned on the wire and reported as text.
        "XID" | "CID" => decode_unchecked::<i32>(row, index)
            .map(|v| Value::from(v.map(|id| (id as u32).to_string()))),

        "XID8" => decode_unchecked::<i64>(row, index)
            .map(|v| Value::from(v.map(|id| (id as u64).to_string()))),

        "FLOAT4" | "REAL" => decode::<f32>(row, index).map(|v| Value::from(v.map(f64::from))),

        "FLOAT8" | "DOUBLE PRECISION" => decode::<f64>(row, index).map(Value::from),

        "NUMERIC" => decode::<Decimal>(row, index).map(|v| Value::from(v.map(|d| d.to_string()))),

        "BYTEA" => decode::<Vec<u8>>(row, index).map(Value::from),

        // Months carry no fixed length in milliseconds and are dropped.
        "INTERVAL" => decode::<PgInterval>(row, index).map(|v| {
            Value::from(v.map(|iv| IntervalParts::from_days_micros(iv.days, iv.microseconds)))
        }),

        "TIMESTAMPTZ" => decode::<DateTime<Utc>>(row, index)
            .map(|v| Value::from(v.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)))),

        "TIMESTAMP" => decode::<NaiveDateTime>(row, index)
            .map(|v| Value::from(v.map(|t| t.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()))),

        "DATE" => decode::<NaiveDate>(row, index).map(|v| Value::from(v.map(|d| d.to_string()))),

        "TIME" => decode::<NaiveTime>(row, index).map(|v| Value::from(v.map(|t| t.to_string()))),

        "UUID" => decode::<Uuid>(row, index).map(|v| Value::from(v.map(|id| id.to_string()))),

        "JSON" | "JSONB" => decode::<JsonValue>(row, index).map(|v| v.map_or(Value::Null, Value::Json)),

        "INET" => decode::<IpNetwork>(row, index).map(|v| Value::from(v.map(inet_text))),

        "CIDR" => decode::<IpNetwork>(row, index).map(|v| Value::from(v.map(|net| net.to_string()))),

        _ => None,
    };

    decoded.unwrap_or_else(|| decode_text(row, index))
}

/// Decodes a nullable column, or `None` if the value does not decode as `T`.
fn decode<'r, T>(row: &'r PgRow, index: usize) -> Option<Option<T>>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index).ok()
}

/// Like `decode`, for wire formats that match `T` although the type does not.
fn decode_unchecked<'r, T>(row: &'r PgRow, index: usize) -> Option<Option<T>>
where
    T: Decode<'r, Postgres>,
{
    row.try_get_unchecked::<Option<T>, _>(index).ok()
}

/// Text fallback for everything else.
///
/// `name`, enum and domain values are UTF-8 on the wire and read unchecked.
/// Binary payloads that do not read as text are reported as `Null`.
fn decode_text(row: &PgRow, index: usize) -> Value {
    if let Some(text) = decode::<String>(row, index) {
        return Value::from(text);
    }

    match decode_unchecked::<String>(row, index) {
        Some(None) => Value::Null,
        Some(Some(text)) if !text.chars().any(|c| c.is_control() && !c.is_whitespace()) => {
            Value::String(text)
        }
        _ => {
            debug!(column = index, "column has no text form, reporting null");
            Value::Null
        }
    }
}

/// Formats an `inet` the way PostgreSQL prints it: host addresses without a prefix.
fn inet_text(net: IpNetwork) -> String {
    let host_prefix = if net.is_ipv4() { 32 } else { 128 };
    if net.prefix() == host_prefix {
        net.ip().to_string()
    } else {
        net.to_string()
    }
}

/// Determines if an error is transient and worth retrying.
fn is_transient_error(error: &sqlx::Error) -> bool {
    if matches!(error, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) {
        return true;
    }

    let error_str = error.to_string().to_lowercase();

    // Authentication and database-not-found errors are not transient
    if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
        || error_str.contains("does not exist")
    {
        return false;
    }

    error_str.contains("connection refused")
        || error_str.contains("timed out")
        || error_str.contains("timeout")
        || error_str.contains("temporarily unavailable")
        || error_str.contains("connection reset")
        || error_str.contains("broken pipe")
        || error_str.contains("starting up")
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> GatewayError {
    let host = config.host_or_default();
    let port = config.port;
    let user = config.user_or_default();
    let database = config.database_or_default();

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        GatewayError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        GatewayError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        GatewayError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        GatewayError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        GatewayError::connection(error.to_string())
    }
}

/// Maps a query failure to a `Query` error carrying the server's message verbatim.
///
/// Detail and hint fields are logged but not returned to callers.
fn map_query_error(error: sqlx::Error) -> GatewayError {
    match error.as_database_error() {
        Some(db_error) => {
            if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
            {
                debug!(
                    code = pg_error.code(),
                    detail = pg_error.detail(),
                    hint = pg_error.hint(),
                    "database rejected query"
                );
            }
            GatewayError::query(db_error.message())
        }
        None => GatewayError::query(error.to_string()),
    }
}
