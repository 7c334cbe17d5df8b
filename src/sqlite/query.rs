use rusqlite::Statement;
use rusqlite::types::ValueRef;

use crate::error::SqlPoolError;
use crate::results::{NULL_SENTINEL, ResultSet, Row};

/// Render one `SQLite` value as text.
#[must_use]
pub fn sqlite_value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => NULL_SENTINEL.to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

/// Build a result set from a prepared `SQLite` statement.
///
/// Column names come from the statement, so a query matching no rows still
/// reports its schema.
///
/// # Errors
/// Returns `SqlPoolError::SqliteError` if stepping the statement or reading a column fails.
pub fn build_result_set(stmt: &mut Statement<'_>) -> Result<ResultSet, SqlPoolError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut table: Vec<Row> = Vec::new();
    let mut rows_iter = stmt.query([])?;
    while let Some(row) = rows_iter.next()? {
        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            values.push(sqlite_value_to_text(row.get_ref(i)?));
        }
        table.push(values);
    }

    Ok(ResultSet::new(column_names, table))
}
