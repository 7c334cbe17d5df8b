//! Backend-agnostic data access over Postgres and `SQLite`.
//!
//! - [`StatementBuilder`] renders one SQL statement from chained calls.
//! - [`Database`] is the CRUD surface every backend implements.
//! - [`ConnectionPool`] bounds how many backend connections exist for one
//!   configuration and hands them out without blocking.
//! - [`DatabaseFactory`] chooses a direct connection or a pooled one based on
//!   [`ConnectionConfig::mode`].
//!
//! Logging goes through `tracing`; install a subscriber in the application to see it.

pub mod config;
pub mod database;
pub mod error;
pub mod factory;
pub mod pool;
pub mod prelude;
pub mod query_builder;
pub mod results;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{ConnectionConfig, ConnectionConfigBuilder};
pub use database::Database;
pub use error::SqlPoolError;
pub use factory::{DatabaseFactory, DatabaseHandle, connect_direct};
pub use pool::{ConnectionId, ConnectionPool, PoolStatus, PooledConnection};
pub use query_builder::{StatementBuilder, StatementKind, escape_literal};
pub use results::{NULL_SENTINEL, QueryOutcome, ResultSet};
pub use types::{ConnectionMode, DatabaseType};
