use std::fmt;

mod render;

pub use render::escape_literal;

/// Which statement a [`StatementBuilder`] renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatementKind {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Join {
    pub(crate) kind: JoinKind,
    pub(crate) table: String,
    pub(crate) left: String,
    pub(crate) right: String,
}

/// Fluent accumulator for one SQL statement.
///
/// The builder knows nothing about the backend it will run on; the same calls
/// always render the same text.
/// ```rust
/// use sql_pool_access::prelude::*;
///
/// let sql = StatementBuilder::new()
///     .table("users")
///     .select("id")
///     .select("name")
///     .where_clause("active = 1")
///     .limit(10)
///     .offset(0)
///     .render();
/// assert_eq!(sql, "SELECT id, name FROM users WHERE active = 1 LIMIT 10 OFFSET 0");
/// ```
///
/// Only inserted and updated values are escaped (single quotes doubled). Table
/// names, column names, predicates, join conditions and ordering expressions are
/// written verbatim, so they must come from trusted code, never from user input.
///
/// Calling an operation-setting method (`select` on a non-select builder,
/// `insert`, `update`, `remove`, `raw`) drops whatever the previous operation
/// accumulated that the new one cannot use. The table and the `WHERE`
/// predicates survive a switch between `Select`, `Update` and `Delete`; `raw`
/// drops the table, but a table set after `raw` is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementBuilder {
    pub(crate) kind: StatementKind,
    pub(crate) table: String,
    pub(crate) raw: String,
    pub(crate) selects: Vec<String>,
    pub(crate) joins: Vec<Join>,
    pub(crate) insert_pairs: Vec<(String, String)>,
    pub(crate) update_pairs: Vec<(String, String)>,
    pub(crate) predicates: Vec<String>,
    pub(crate) order_by: Option<String>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl StatementBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Set the target table.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Add one projected column. Repeated calls accumulate; none means `*`.
    #[must_use]
    pub fn select(mut self, column: impl Into<String>) -> Self {
        self.switch_to(StatementKind::Select);
        self.selects.push(column.into());
        self
    }

    /// Add several projected columns at once.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.switch_to(StatementKind::Select);
        self.selects.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Start an `INSERT INTO table`.
    #[must_use]
    pub fn insert(mut self, table: impl Into<String>) -> Self {
        self.switch_to(StatementKind::Insert);
        self.table = table.into();
        self
    }

    /// Column/value pairs for an insert, appended in order.
    #[must_use]
    pub fn values<I, C, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: Into<String>,
    {
        self.insert_pairs
            .extend(pairs.into_iter().map(|(c, v)| (c.into(), v.into())));
        self
    }

    /// Start an `UPDATE table`.
    #[must_use]
    pub fn update(mut self, table: impl Into<String>) -> Self {
        self.switch_to(StatementKind::Update);
        self.table = table.into();
        self
    }

    /// One `col='value'` assignment for an update.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.update_pairs.push((column.into(), value.into()));
        self
    }

    /// Start a `DELETE FROM table`.
    #[must_use]
    pub fn remove(mut self, table: impl Into<String>) -> Self {
        self.switch_to(StatementKind::Delete);
        self.table = table.into();
        self
    }

    /// Literal SQL, rendered verbatim with no other clauses.
    #[must_use]
    pub fn raw(mut self, sql: impl Into<String>) -> Self {
        self.switch_to(StatementKind::Raw);
        self.raw = sql.into();
        self
    }

    /// Add a predicate; multiple predicates are AND-joined in call order.
    #[must_use]
    pub fn where_clause(mut self, condition: impl Into<String>) -> Self {
        self.predicates.push(condition.into());
        self
    }

    #[must_use]
    pub fn and_where(self, condition: impl Into<String>) -> Self {
        self.where_clause(condition)
    }

    /// `JOIN table ON left = right` (select only).
    #[must_use]
    pub fn join(
        self,
        table: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        self.push_join(JoinKind::Inner, table.into(), left.into(), right.into())
    }

    /// `LEFT JOIN table ON left = right` (select only).
    #[must_use]
    pub fn left_join(
        self,
        table: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        self.push_join(JoinKind::Left, table.into(), left.into(), right.into())
    }

    #[must_use]
    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by = Some(expr.into());
        self
    }

    /// Applied even when zero; only a never-set limit is omitted.
    #[must_use]
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Applied even when zero; only a never-set offset is omitted.
    #[must_use]
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    fn push_join(mut self, kind: JoinKind, table: String, left: String, right: String) -> Self {
        self.joins.push(Join {
            kind,
            table,
            left,
            right,
        });
        self
    }

    fn switch_to(&mut self, next: StatementKind) {
        if self.kind == next {
            return;
        }
        let prev = self.kind;
        self.kind = next;

        if next != StatementKind::Raw {
            self.raw.clear();
        }
        if next != StatementKind::Select {
            self.selects.clear();
            self.joins.clear();
            self.order_by = None;
            self.limit = None;
            self.offset = None;
        }
        if next != StatementKind::Insert {
            self.insert_pairs.clear();
        }
        if next != StatementKind::Update {
            self.update_pairs.clear();
        }
        let keeps_predicates = matches!(
            (prev, next),
            (
                StatementKind::Select | StatementKind::Update | StatementKind::Delete,
                StatementKind::Select | StatementKind::Update | StatementKind::Delete
            )
        );
        if !keeps_predicates {
            self.predicates.clear();
        }
        if next == StatementKind::Raw {
            self.table.clear();
        }
    }
}

impl fmt::Display for StatementBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
