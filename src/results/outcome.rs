use super::ResultSet;

/// Result of a read, tagged so a failed query is not mistaken for an empty one.
///
/// `Rows` with zero rows means the query ran and matched nothing (its columns
/// are still reported); `Failed` means the schema is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Rows(ResultSet),
    Failed(String),
}

impl QueryOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Rows(_))
    }

    #[must_use]
    pub fn result_set(&self) -> Option<&ResultSet> {
        match self {
            QueryOutcome::Rows(rs) => Some(rs),
            QueryOutcome::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            QueryOutcome::Rows(_) => None,
            QueryOutcome::Failed(msg) => Some(msg),
        }
    }

    /// Collapse to a plain result set; a failure becomes the column-less default.
    #[must_use]
    pub fn into_result_set(self) -> ResultSet {
        match self {
            QueryOutcome::Rows(rs) => rs,
            QueryOutcome::Failed(_) => ResultSet::default(),
        }
    }
}

impl From<ResultSet> for QueryOutcome {
    fn from(rs: ResultSet) -> Self {
        QueryOutcome::Rows(rs)
    }
}
