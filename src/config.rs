use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SqlPoolError;
use crate::types::{ConnectionMode, DatabaseType};

pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POOL_SIZE: usize = 5;
pub const DEFAULT_SQLITE_PATH: &str = "mydb.db";

/// Connection settings shared by every backend.
///
/// Network fields are used by Postgres, `path` by `SQLite`. Missing fields in a
/// deserialized document fall back to the defaults below:
/// ```rust
/// use sql_pool_access::prelude::*;
///
/// let cfg = ConnectionConfig::default();
/// assert_eq!(cfg.port, 5432);
/// assert_eq!(cfg.connect_timeout, 10);
/// assert_eq!(cfg.pool_size, 5);
/// assert_eq!(cfg.mode, ConnectionMode::Direct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Seconds.
    pub connect_timeout: u64,
    pub path: String,
    pub mode: ConnectionMode,
    pub pool_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            dbname: String::new(),
            user: String::new(),
            password: String::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            path: DEFAULT_SQLITE_PATH.to_string(),
            mode: ConnectionMode::Direct,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl ConnectionConfig {
    #[must_use]
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    #[must_use]
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Identifier used to share one pool across callers targeting the same database.
    ///
    /// `SQLite` has no database name, so its file path stands in for it.
    #[must_use]
    pub fn pool_key(&self, kind: DatabaseType) -> String {
        format!("{}_{}_{}", kind, self.host, self.database_name(kind))
    }

    fn database_name(&self, kind: DatabaseType) -> &str {
        match kind {
            DatabaseType::Postgres => &self.dbname,
            DatabaseType::Sqlite => &self.path,
        }
    }

    /// Whether both configurations open connections to the same place as the same
    /// user. Pool sizing, mode and timeouts are ignored.
    #[must_use]
    pub fn same_target(&self, kind: DatabaseType, other: &ConnectionConfig) -> bool {
        match kind {
            DatabaseType::Postgres => {
                self.host == other.host
                    && self.port == other.port
                    && self.dbname == other.dbname
                    && self.user == other.user
                    && self.password == other.password
            }
            DatabaseType::Sqlite => self.path == other.path,
        }
    }

    /// libpq key/value connection string.
    #[must_use]
    pub fn to_postgres_connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={} connect_timeout={}",
            self.host, self.port, self.dbname, self.user, self.password, self.connect_timeout
        )
    }

    #[cfg(feature = "postgres")]
    #[must_use]
    pub fn to_postgres_config(&self) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .connect_timeout(self.connect_timeout_duration());
        if !self.user.is_empty() {
            pg.user(&self.user);
        }
        if !self.password.is_empty() {
            pg.password(&self.password);
        }
        pg
    }

    /// Check the fields the given backend needs.
    ///
    /// # Errors
    /// Returns `SqlPoolError::ConfigError` naming the first missing or invalid field.
    pub fn validate(&self, kind: DatabaseType) -> Result<(), SqlPoolError> {
        match kind {
            DatabaseType::Postgres => {
                if self.host.is_empty() {
                    return Err(SqlPoolError::ConfigError("host is required".to_string()));
                }
                if self.dbname.is_empty() {
                    return Err(SqlPoolError::ConfigError(
                        "dbname is required".to_string(),
                    ));
                }
            }
            DatabaseType::Sqlite => {
                if self.path.is_empty() {
                    return Err(SqlPoolError::ConfigError("path is required".to_string()));
                }
            }
        }
        if self.mode == ConnectionMode::Pooled && self.pool_size == 0 {
            return Err(SqlPoolError::ConfigError(
                "pool_size must be at least 1 in pooled mode".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`ConnectionConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfigBuilder {
    cfg: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.cfg.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.cfg.port = port;
        self
    }

    #[must_use]
    pub fn dbname(mut self, dbname: impl Into<String>) -> Self {
        self.cfg.dbname = dbname.into();
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.cfg.user = user.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.cfg.password = password.into();
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, secs: u64) -> Self {
        self.cfg.connect_timeout = secs;
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.cfg.path = path.into();
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: ConnectionMode) -> Self {
        self.cfg.mode = mode;
        self
    }

    #[must_use]
    pub fn pooled(self, pool_size: usize) -> Self {
        self.mode(ConnectionMode::Pooled).pool_size(pool_size)
    }

    #[must_use]
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.cfg.pool_size = pool_size;
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionConfig {
        self.cfg
    }
}
