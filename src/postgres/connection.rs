use std::fmt;

use async_trait::async_trait;
use tokio_postgres::{Client, NoTls};
use tracing::{error, info};

use crate::config::ConnectionConfig;
use crate::database::Database;
use crate::error::SqlPoolError;
use crate::results::ResultSet;
use crate::types::DatabaseType;

use super::query::{build_result_set, rows_affected};

/// Postgres variant of [`Database`].
///
/// Statements go through the simple query protocol inside a transaction, so
/// values must already be inlined in the SQL text.
pub struct PostgresDatabase {
    config: ConnectionConfig,
    client: Option<Client>,
}

impl PostgresDatabase {
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    fn client_mut(&mut self) -> Result<&mut Client, SqlPoolError> {
        match self.client.as_mut() {
            Some(client) if !client.is_closed() => Ok(client),
            _ => Err(SqlPoolError::NotOpen(DatabaseType::Postgres)),
        }
    }
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("dbname", &self.config.dbname)
            .field("open", &self.is_open())
            .finish()
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    fn kind(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn connect(&mut self) -> Result<(), SqlPoolError> {
        if self.is_open() {
            return Ok(());
        }
        info!(
            host = %self.config.host,
            port = self.config.port,
            dbname = %self.config.dbname,
            "connecting to postgres"
        );

        let (client, connection) = self
            .config
            .to_postgres_config()
            .connect(NoTls)
            .await
            .map_err(|e| SqlPoolError::ConnectionError(format!("postgres connect error: {e}")))?;

        let dbname = self.config.dbname.clone();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(dbname = %dbname, error = %e, "postgres connection terminated");
            }
        });

        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) {
        // Dropping the client ends the spawned connection task.
        if self.client.take().is_some() {
            info!(dbname = %self.config.dbname, "closing postgres connection");
        }
    }

    fn is_open(&self) -> bool {
        self.client.as_ref().is_some_and(|c| !c.is_closed())
    }

    async fn execute_sql(&mut self, sql: &str) -> Result<usize, SqlPoolError> {
        let client = self.client_mut()?;
        let tx = client.transaction().await?;
        let messages = tx.simple_query(sql).await?;
        tx.commit().await?;
        rows_affected(&messages)
    }

    async fn query_sql(&mut self, sql: &str) -> Result<ResultSet, SqlPoolError> {
        let client = self.client_mut()?;
        let tx = client.transaction().await?;
        let messages = tx.simple_query(sql).await?;
        tx.commit().await?;
        Ok(build_result_set(&messages))
    }
}
