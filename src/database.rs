use std::fmt;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::config::ConnectionConfig;
use crate::error::SqlPoolError;
use crate::query_builder::StatementBuilder;
use crate::results::{QueryOutcome, ResultSet};
use crate::types::DatabaseType;

/// One CRUD surface over any backend.
///
/// Implementors provide the driver-level primitives (`connect`, `execute_sql`,
/// `query_sql`, `close`, `is_open`). The CRUD methods are provided on top of them
/// and never return an error: a write reports `false`, a read reports an empty
/// [`ResultSet`], and the cause is logged through `tracing`.
///
/// A handle is single-owner; it must not be shared between tasks while in use.
///
/// ```rust,no_run
/// use sql_pool_access::prelude::*;
///
/// # async fn demo() {
/// let cfg = ConnectionConfig::builder().path("app.db").finish();
/// let mut db = connect_direct(DatabaseType::Sqlite, cfg).expect("sqlite enabled");
/// if db.open().await {
///     db.insert(&StatementBuilder::new().raw("CREATE TABLE t (name TEXT)")).await;
///     db.insert(&StatementBuilder::new().insert("t").values([("name", "ali")])).await;
///     db.select(&StatementBuilder::new().table("t")).await.print();
/// }
/// # }
/// ```
#[async_trait]
pub trait Database: Send + fmt::Debug {
    fn kind(&self) -> DatabaseType;

    fn config(&self) -> &ConnectionConfig;

    /// Establish the backend connection; a no-op when already open.
    ///
    /// # Errors
    /// Returns the driver's connection error.
    async fn connect(&mut self) -> Result<(), SqlPoolError>;

    /// Release the backend connection; a no-op when already closed.
    async fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Run one statement atomically (begin/execute/commit) and report rows affected.
    ///
    /// # Errors
    /// Returns `SqlPoolError::NotOpen` on a closed handle, or the driver error; on error
    /// the unit is rolled back.
    async fn execute_sql(&mut self, sql: &str) -> Result<usize, SqlPoolError>;

    /// Run a read and convert the rows to text.
    ///
    /// # Errors
    /// Returns `SqlPoolError::NotOpen` on a closed handle, or the driver error.
    async fn query_sql(&mut self, sql: &str) -> Result<ResultSet, SqlPoolError>;

    /// Open the handle, logging any failure. Idempotent.
    async fn open(&mut self) -> bool {
        if self.is_open() {
            debug!(backend = %self.kind(), "database already open");
            return true;
        }
        match self.connect().await {
            Ok(()) => {
                debug!(backend = %self.kind(), "database opened");
                true
            }
            Err(e) => {
                error!(backend = %self.kind(), error = %e, "failed to open database");
                false
            }
        }
    }

    /// Render and execute a write, returning rows affected.
    ///
    /// # Errors
    /// Returns `SqlPoolError::ExecutionError` for an empty statement, otherwise as
    /// [`Database::execute_sql`].
    async fn execute(&mut self, qb: &StatementBuilder) -> Result<usize, SqlPoolError> {
        let sql = checked_render(qb)?;
        self.execute_sql(&sql).await
    }

    async fn insert(&mut self, qb: &StatementBuilder) -> bool {
        write_flag(self, "insert", qb).await
    }

    async fn update(&mut self, qb: &StatementBuilder) -> bool {
        write_flag(self, "update", qb).await
    }

    async fn remove(&mut self, qb: &StatementBuilder) -> bool {
        write_flag(self, "delete", qb).await
    }

    /// Run a read and tag the outcome, so "failed" and "no rows" stay distinct.
    async fn query(&mut self, qb: &StatementBuilder) -> QueryOutcome {
        if !self.is_open() {
            warn!(backend = %self.kind(), "cannot select: database not open");
            return QueryOutcome::Failed(SqlPoolError::NotOpen(self.kind()).to_string());
        }
        let sql = match checked_render(qb) {
            Ok(sql) => sql,
            Err(e) => return QueryOutcome::Failed(e.to_string()),
        };
        debug!(backend = %self.kind(), sql = %sql, "executing select");
        match self.query_sql(&sql).await {
            Ok(rs) => QueryOutcome::Rows(rs),
            Err(e) => {
                error!(backend = %self.kind(), sql = %sql, error = %e, "select failed");
                QueryOutcome::Failed(e.to_string())
            }
        }
    }

    /// Run a read; a failure yields a result set with no columns.
    async fn select(&mut self, qb: &StatementBuilder) -> ResultSet {
        self.query(qb).await.into_result_set()
    }
}

fn checked_render(qb: &StatementBuilder) -> Result<String, SqlPoolError> {
    let sql = qb.render();
    if sql.trim().is_empty() {
        return Err(SqlPoolError::ExecutionError(
            "statement renders to empty SQL".to_string(),
        ));
    }
    Ok(sql)
}

async fn write_flag<D>(db: &mut D, op: &'static str, qb: &StatementBuilder) -> bool
where
    D: Database + ?Sized,
{
    if !db.is_open() {
        warn!(backend = %db.kind(), op, "cannot execute: database not open");
        return false;
    }
    let sql = match checked_render(qb) {
        Ok(sql) => sql,
        Err(e) => {
            warn!(backend = %db.kind(), op, error = %e, "nothing to execute");
            return false;
        }
    };
    debug!(backend = %db.kind(), op, sql = %sql, "executing statement");
    match db.execute_sql(&sql).await {
        Ok(rows) => {
            debug!(backend = %db.kind(), op, rows, "statement committed");
            true
        }
        Err(e) => {
            error!(backend = %db.kind(), op, sql = %sql, error = %e, "statement failed");
            false
        }
    }
}
