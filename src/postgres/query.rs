use tokio_postgres::SimpleQueryMessage;

use crate::error::SqlPoolError;
use crate::results::{NULL_SENTINEL, ResultSet, Row};

/// Build a result set from the messages of a simple (text protocol) query.
///
/// Column names come from the row description, so a read matching no rows keeps
/// its schema. When the text held several statements, the last one that
/// described rows wins.
#[must_use]
pub fn build_result_set(messages: &[SimpleQueryMessage]) -> ResultSet {
    let mut columns: Vec<String> = Vec::new();
    let mut table: Vec<Row> = Vec::new();

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(desc) => {
                columns = desc.iter().map(|c| c.name().to_string()).collect();
                table.clear();
            }
            SimpleQueryMessage::Row(row) => {
                if columns.is_empty() {
                    columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                }
                let values = (0..row.len())
                    .map(|i| row.get(i).unwrap_or(NULL_SENTINEL).to_string())
                    .collect();
                table.push(values);
            }
            _ => {}
        }
    }

    ResultSet::new(columns, table)
}

/// Sum the rows reported by every completed command.
///
/// # Errors
/// Returns `SqlPoolError::ExecutionError` if the count does not fit in `usize`.
pub fn rows_affected(messages: &[SimpleQueryMessage]) -> Result<usize, SqlPoolError> {
    let total: u64 = messages
        .iter()
        .filter_map(|m| match m {
            SimpleQueryMessage::CommandComplete(n) => Some(*n),
            _ => None,
        })
        .sum();
    usize::try_from(total).map_err(|e| {
        SqlPoolError::ExecutionError(format!("postgres affected rows conversion error: {e}"))
    })
}
