use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Supported database backends.
///
/// Both variants are always nameable; a backend whose cargo feature is off fails at
/// connection time with [`SqlPoolError::Unimplemented`](crate::SqlPoolError::Unimplemented).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `PostgreSQL` database
    Postgres,
    /// `SQLite` database file
    Sqlite,
}

impl DatabaseType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::Postgres => "postgres",
            DatabaseType::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the factory hands out connections.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// One-shot connection owned by the caller.
    #[default]
    Direct,
    /// Connection checked out of a shared per-configuration pool.
    Pooled,
}
