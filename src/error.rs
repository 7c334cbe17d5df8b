use thiserror::Error;

use crate::types::DatabaseType;

#[derive(Debug, Error)]
pub enum SqlPoolError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("{0} connection is not open")]
    NotOpen(DatabaseType),

    #[error("Connection pool exhausted (max size {max_size})")]
    PoolExhausted { max_size: usize },

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl SqlPoolError {
    /// True for the expected "no capacity right now" condition.
    #[must_use]
    pub fn is_pool_exhausted(&self) -> bool {
        matches!(self, SqlPoolError::PoolExhausted { .. })
    }
}

impl From<tokio::task::JoinError> for SqlPoolError {
    fn from(err: tokio::task::JoinError) -> Self {
        SqlPoolError::ExecutionError(format!("spawn_blocking join error: {err}"))
    }
}
