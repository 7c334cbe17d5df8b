use std::collections::HashMap;
use std::sync::Arc;

/// Text stored in place of a database NULL.
pub const NULL_SENTINEL: &str = "NULL";

/// One row of text fields, in column order.
pub type Row = Vec<String>;

/// Rectangular, immutable projection of a completed read.
///
/// Every backend value is carried as text; NULL becomes [`NULL_SENTINEL`]. A result
/// with zero rows still knows its columns when the backend reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    columns: Vec<String>,
    table: Vec<Row>,
    // Column name -> index, built once and shared by clones.
    column_index_cache: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    /// Build a result set from column names and rows.
    #[must_use]
    pub fn new(columns: Vec<String>, table: Vec<Row>) -> Self {
        let cache = Arc::new(
            columns
                .iter()
                .enumerate()
                .rev()
                .map(|(i, name)| (name.clone(), i))
                .collect::<HashMap<_, _>>(),
        );
        Self {
            columns,
            table,
            column_index_cache: cache,
        }
    }

    /// True when there are no rows (the columns may still be known).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn data(&self) -> &[Row] {
        &self.table
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.table.iter()
    }

    /// Cell at `(row, col)`, or `None` when either index is out of range.
    #[must_use]
    pub fn at(&self, row: usize, col: usize) -> Option<&str> {
        self.table
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
    }

    /// Index of the first column with this name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_index_cache.get(name).copied()
    }

    /// Cell in `row` under the named column.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        self.column_index(column).and_then(|col| self.at(row, col))
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.iter()
    }
}
