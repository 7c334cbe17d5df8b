//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::{ConnectionConfig, ConnectionConfigBuilder};
pub use crate::database::Database;
pub use crate::error::SqlPoolError;
pub use crate::factory::{DatabaseFactory, DatabaseHandle, connect_direct};
pub use crate::pool::{ConnectionId, ConnectionPool, PoolStatus, PooledConnection};
pub use crate::query_builder::{StatementBuilder, StatementKind};
pub use crate::results::{NULL_SENTINEL, QueryOutcome, ResultSet};
pub use crate::types::{ConnectionMode, DatabaseType};

#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresDatabase;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteDatabase;
