use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::database::Database;
use crate::error::SqlPoolError;
use crate::pool::{ConnectionPool, PooledConnection};
use crate::types::{ConnectionMode, DatabaseType};

/// Build an unopened backend connection for `kind`.
///
/// # Errors
/// Returns `SqlPoolError::Unimplemented` when the backend's cargo feature is disabled.
#[allow(unused_variables)]
pub fn connect_direct(
    kind: DatabaseType,
    config: ConnectionConfig,
) -> Result<Box<dyn Database>, SqlPoolError> {
    match kind {
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => Ok(Box::new(crate::postgres::PostgresDatabase::new(config))),
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => Ok(Box::new(crate::sqlite::SqliteDatabase::new(config))),
        #[allow(unreachable_patterns)]
        _ => Err(SqlPoolError::Unimplemented(format!(
            "{kind} support is not enabled in the current build"
        ))),
    }
}

/// A connection handed out by [`DatabaseFactory::create_database`].
///
/// Both variants deref to [`Database`].
#[derive(Debug)]
pub enum DatabaseHandle {
    /// Unpooled, owned by the caller. Starts closed; call `open()`.
    Direct(Box<dyn Database>),
    /// Checked out of a shared pool and already open.
    Pooled(PooledConnection),
}

impl DatabaseHandle {
    #[must_use]
    pub fn is_pooled(&self) -> bool {
        matches!(self, DatabaseHandle::Pooled(_))
    }

    #[must_use]
    pub fn as_pooled(&self) -> Option<&PooledConnection> {
        match self {
            DatabaseHandle::Pooled(conn) => Some(conn),
            DatabaseHandle::Direct(_) => None,
        }
    }
}

impl Deref for DatabaseHandle {
    type Target = dyn Database;

    fn deref(&self) -> &Self::Target {
        match self {
            DatabaseHandle::Direct(db) => db.as_ref(),
            DatabaseHandle::Pooled(conn) => &**conn,
        }
    }
}

impl DerefMut for DatabaseHandle {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            DatabaseHandle::Direct(db) => db.as_mut(),
            DatabaseHandle::Pooled(conn) => &mut **conn,
        }
    }
}

/// Entry point that routes to a direct connection or a shared pool based on
/// `config.mode`.
///
/// Owns the pool registry: one pool per pool key (backend, host, database or
/// `SQLite` file), created on first use and kept for the factory's lifetime.
/// Clones share the registry.
#[derive(Debug, Clone, Default)]
pub struct DatabaseFactory {
    pools: Arc<Mutex<HashMap<String, ConnectionPool>>>,
}

impl DatabaseFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle for `kind`, pooled or direct depending on `config.mode`.
    ///
    /// # Errors
    /// Returns `SqlPoolError::ConfigError` for an invalid configuration or one that
    /// conflicts with the pool already registered under its key,
    /// `SqlPoolError::Unimplemented` for a disabled backend, and in pooled mode any
    /// error from [`ConnectionPool::acquire`] (including exhaustion).
    pub async fn create_database(
        &self,
        kind: DatabaseType,
        config: &ConnectionConfig,
    ) -> Result<DatabaseHandle, SqlPoolError> {
        config.validate(kind)?;
        match config.mode {
            ConnectionMode::Direct => {
                debug!(backend = %kind, "creating direct connection");
                connect_direct(kind, config.clone()).map(DatabaseHandle::Direct)
            }
            ConnectionMode::Pooled => {
                let pool = self.pool_for(kind, config)?;
                pool.acquire().await.map(DatabaseHandle::Pooled)
            }
        }
    }

    /// Hand a handle back. Pooled handles return to their pool (`true`); direct
    /// handles are simply dropped, which closes them (`false`).
    pub fn release_connection(&self, handle: DatabaseHandle) -> bool {
        match handle {
            DatabaseHandle::Pooled(conn) => {
                match self.pool_by_key(&conn.config().pool_key(conn.kind())) {
                    Some(pool) => pool.release(conn),
                    // Not from this registry; dropping still routes it to its own pool.
                    None => {
                        drop(conn);
                        false
                    }
                }
            }
            DatabaseHandle::Direct(db) => {
                debug!(backend = %db.kind(), "dropping direct connection");
                false
            }
        }
    }

    /// The pool registered for this backend and configuration, if any.
    #[must_use]
    pub fn pool(&self, kind: DatabaseType, config: &ConnectionConfig) -> Option<ConnectionPool> {
        self.pool_by_key(&config.pool_key(kind))
    }

    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.lock_pools().len()
    }

    fn pool_by_key(&self, key: &str) -> Option<ConnectionPool> {
        self.lock_pools().get(key).cloned()
    }

    /// Registered pool for this key, created on first use.
    ///
    /// A configuration that shares a key with a registered pool but reaches a
    /// different server or user is rejected rather than handed the other pool.
    fn pool_for(
        &self,
        kind: DatabaseType,
        config: &ConnectionConfig,
    ) -> Result<ConnectionPool, SqlPoolError> {
        let key = config.pool_key(kind);
        let pool = self
            .lock_pools()
            .entry(key)
            .or_insert_with_key(|key| {
                info!(pool_key = %key, "registering new connection pool");
                ConnectionPool::new(kind, config.clone(), config.pool_size)
            })
            .clone();

        if !pool.config().same_target(kind, config) {
            warn!(pool_key = %pool.key(), "configuration conflicts with the registered pool");
            return Err(SqlPoolError::ConfigError(format!(
                "pool {} is registered for a different connection target",
                pool.key()
            )));
        }
        if pool.max_size() != config.pool_size {
            warn!(
                pool_key = %pool.key(),
                registered = pool.max_size(),
                requested = config.pool_size,
                "pool_size differs from the registered pool; keeping the registered size"
            );
        }
        Ok(pool)
    }

    fn lock_pools(&self) -> std::sync::MutexGuard<'_, HashMap<String, ConnectionPool>> {
        self.pools.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
