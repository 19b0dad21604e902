//! The fixed catalog of diagnostic queries.
//!
//! Built once at startup and shared read-only for the life of the process.

use crate::error::{GatewayError, Result};
use serde::Serialize;
use std::path::Path;

/// A query the gateway knows by id, with the SQL shipped for it.
struct BuiltinQuery {
    id: &'static str,
    name: &'static str,
    sql: &'static str,
}

/// Known queries in listing order.
const BUILTIN_QUERIES: &[BuiltinQuery] = &[
    BuiltinQuery {
        id: "lock",
        name: "Lock",
        sql: include_str!("../queries/lock.sql"),
    },
    BuiltinQuery {
        id: "lockAndWho",
        name: "Lock and Who",
        sql: include_str!("../queries/lockAndWho.sql"),
    },
    BuiltinQuery {
        id: "waiting",
        name: "Waiting",
        sql: include_str!("../queries/waiting.sql"),
    },
];

/// A named diagnostic query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefinition {
    pub id: String,
    pub name: String,
    pub sql: String,
}

/// What the catalog advertises for each query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySummary {
    pub id: String,
    pub name: String,
}

/// Immutable id → query mapping.
#[derive(Debug, Clone, Default)]
pub struct QueryCatalog {
    definitions: Vec<QueryDefinition>,
}

impl QueryCatalog {
    /// Creates a catalog from explicit definitions, keeping their order.
    pub fn new(definitions: Vec<QueryDefinition>) -> Self {
        Self { definitions }
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Self {
        let definitions = BUILTIN_QUERIES
            .iter()
            .map(|query| QueryDefinition {
                id: query.id.to_string(),
                name: query.name.to_string(),
                sql: query.sql.to_string(),
            })
            .collect();
        Self { definitions }
    }

    /// Reads `<id>.sql` for every known id from `dir`, in place of the shipped SQL.
    ///
    /// Fails if any file is missing or unreadable.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let mut definitions = Vec::with_capacity(BUILTIN_QUERIES.len());

        for BuiltinQuery { id, name, .. } in BUILTIN_QUERIES {
            let path = dir.join(format!("{id}.sql"));
            let sql = std::fs::read_to_string(&path).map_err(|e| {
                GatewayError::config(format!(
                    "Failed to read query '{id}' from {}: {e}",
                    path.display()
                ))
            })?;
            definitions.push(QueryDefinition {
                id: id.to_string(),
                name: name.to_string(),
                sql,
            });
        }

        Ok(Self { definitions })
    }

    /// Looks up a query by id. Ids are case-sensitive.
    pub fn get(&self, id: &str) -> Option<&QueryDefinition> {
        self.definitions.iter().find(|def| def.id == id)
    }

    /// Lists ids and display names in catalog order.
    pub fn list(&self) -> Vec<QuerySummary> {
        self.definitions
            .iter()
            .map(|def| QuerySummary {
                id: def.id.clone(),
                name: def.name.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
