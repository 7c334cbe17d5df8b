use std::borrow::Cow;
use std::fmt::Write;

use super::{JoinKind, StatementBuilder, StatementKind};

/// Double every single quote so the value can sit inside a SQL string literal.
#[must_use]
pub fn escape_literal(value: &str) -> Cow<'_, str> {
    if value.contains('\'') {
        Cow::Owned(value.replace('\'', "''"))
    } else {
        Cow::Borrowed(value)
    }
}

impl StatementBuilder {
    /// Render the accumulated calls as SQL text.
    ///
    /// Pure: rendering twice yields the same string. A builder with neither a
    /// table nor raw text renders as an empty string.
    #[must_use]
    pub fn render(&self) -> String {
        if self.kind == StatementKind::Raw {
            return self.raw.clone();
        }
        if self.table.is_empty() {
            return String::new();
        }

        let mut sql = String::with_capacity(64);
        match self.kind {
            StatementKind::Select => self.render_select(&mut sql),
            StatementKind::Insert => self.render_insert(&mut sql),
            StatementKind::Update => {
                self.render_update(&mut sql);
                self.render_predicates(&mut sql);
            }
            StatementKind::Delete => {
                let _ = write!(sql, "DELETE FROM {}", self.table);
                self.render_predicates(&mut sql);
            }
            StatementKind::Raw => sql.push_str(&self.raw),
        }
        sql
    }

    fn render_select(&self, sql: &mut String) {
        sql.push_str("SELECT ");
        if self.selects.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.selects.join(", "));
        }
        let _ = write!(sql, " FROM {}", self.table);

        for join in &self.joins {
            let keyword = match join.kind {
                JoinKind::Inner => "JOIN",
                JoinKind::Left => "LEFT JOIN",
            };
            let _ = write!(
                sql,
                " {keyword} {} ON {} = {}",
                join.table, join.left, join.right
            );
        }

        self.render_predicates(sql);

        if let Some(order) = &self.order_by {
            let _ = write!(sql, " ORDER BY {order}");
        }
        if let Some(limit) = self.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }
        if let Some(offset) = self.offset {
            let _ = write!(sql, " OFFSET {offset}");
        }
    }

    fn render_insert(&self, sql: &mut String) {
        let columns: Vec<&str> = self.insert_pairs.iter().map(|(c, _)| c.as_str()).collect();
        let values: Vec<String> = self
            .insert_pairs
            .iter()
            .map(|(_, v)| format!("'{}'", escape_literal(v)))
            .collect();
        let _ = write!(
            sql,
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            values.join(", ")
        );
    }

    fn render_update(&self, sql: &mut String) {
        let assignments: Vec<String> = self
            .update_pairs
            .iter()
            .map(|(c, v)| format!("{c}='{}'", escape_literal(v)))
            .collect();
        let _ = write!(sql, "UPDATE {} SET {}", self.table, assignments.join(", "));
    }

    fn render_predicates(&self, sql: &mut String) {
        if !self.predicates.is_empty() {
            let _ = write!(sql, " WHERE {}", self.predicates.join(" AND "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_only_allocates_when_needed() {
        assert!(matches!(escape_literal("plain"), Cow::Borrowed("plain")));
        assert_eq!(escape_literal("O'Brien"), "O''Brien");
        assert_eq!(escape_literal("''"), "''''");
    }

    #[test]
    fn select_with_joins_renders_in_clause_order() {
        let sql = StatementBuilder::new()
            .table("users u")
            .select("u.id")
            .select("o.total")
            .join("orders o", "u.id", "o.user_id")
            .left_join("roles r", "u.role_id", "r.id")
            .where_clause("u.active = true")
            .order_by("o.total DESC")
            .limit(10)
            .offset(20)
            .render();
        assert_eq!(
            sql,
            "SELECT u.id, o.total FROM users u JOIN orders o ON u.id = o.user_id \
             LEFT JOIN roles r ON u.role_id = r.id WHERE u.active = true \
             ORDER BY o.total DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn empty_builder_renders_empty_string() {
        assert_eq!(StatementBuilder::new().render(), "");
    }

    #[test]
    fn table_only_selects_star() {
        assert_eq!(
            StatementBuilder::new().table("posts").render(),
            "SELECT * FROM posts"
        );
    }

    #[test]
    fn delete_without_predicates() {
        assert_eq!(
            StatementBuilder::new().remove("sessions").render(),
            "DELETE FROM sessions"
        );
    }
}
