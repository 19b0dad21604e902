//! Column list sanitization.

use crate::db::ColumnInfo;

/// Columns never reported to callers. Compared against lowercased names.
pub const EXCLUDED_COLUMNS: &[&str] = &["transactionid", "usename"];

/// Returns the names of `columns` whose lowercased name is not in `denylist`,
/// keeping their original order.
pub fn filter_columns(columns: &[ColumnInfo], denylist: &[&str]) -> Vec<String> {
    columns
        .iter()
        .filter(|col| !denylist.contains(&col.name.to_lowercase().as_str()))
        .map(|col| col.name.clone())
        .collect()
}
