use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::ConnectionConfig;
use crate::database::Database;
use crate::error::SqlPoolError;
use crate::results::ResultSet;
use crate::types::DatabaseType;

use super::query::build_result_set;

pub(crate) type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// Run blocking `rusqlite` work off the async runtime.
pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlPoolError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlPoolError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await?
}

/// `SQLite` variant of [`Database`], backed by the file at `config.path`.
///
/// `:memory:` and `file:` URIs are accepted as rusqlite accepts them. Each
/// write runs in its own transaction.
pub struct SqliteDatabase {
    config: ConnectionConfig,
    conn: Option<SharedSqliteConnection>,
}

impl SqliteDatabase {
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config, conn: None }
    }

    fn conn_handle(&self) -> Result<SharedSqliteConnection, SqlPoolError> {
        self.conn
            .as_ref()
            .map(Arc::clone)
            .ok_or(SqlPoolError::NotOpen(DatabaseType::Sqlite))
    }
}

impl fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDatabase")
            .field("path", &self.config.path)
            .field("open", &self.conn.is_some())
            .finish()
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    fn kind(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn connect(&mut self) -> Result<(), SqlPoolError> {
        if self.conn.is_some() {
            return Ok(());
        }
        let path = self.config.path.clone();
        let busy_timeout = self.config.connect_timeout_duration();
        info!(path = %path, "opening sqlite database");

        let conn = tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&path)?;
            conn.busy_timeout(busy_timeout)?;
            Ok::<_, SqlPoolError>(conn)
        })
        .await??;

        self.conn = Some(Arc::new(Mutex::new(conn)));
        Ok(())
    }

    async fn close(&mut self) {
        let Some(shared) = self.conn.take() else {
            return;
        };
        info!(path = %self.config.path, "closing sqlite database");
        // A blocking task still holding a clone closes the connection when it finishes.
        if let Ok(mutex) = Arc::try_unwrap(shared) {
            if let Err((_, e)) = mutex.into_inner().close() {
                warn!(path = %self.config.path, error = %e, "sqlite close reported an error");
            }
        }
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    async fn execute_sql(&mut self, sql: &str) -> Result<usize, SqlPoolError> {
        let handle = self.conn_handle()?;
        let sql_owned = sql.to_owned();
        run_blocking(handle, move |conn| {
            let tx = conn.transaction()?;
            let affected = tx.execute(&sql_owned, [])?;
            tx.commit()?;
            Ok(affected)
        })
        .await
    }

    async fn query_sql(&mut self, sql: &str) -> Result<ResultSet, SqlPoolError> {
        let handle = self.conn_handle()?;
        let sql_owned = sql.to_owned();
        run_blocking(handle, move |conn| {
            let mut stmt = conn.prepare(&sql_owned)?;
            build_result_set(&mut stmt)
        })
        .await
    }
}
