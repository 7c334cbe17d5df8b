#![cfg(feature = "postgres")]

use std::env;

use sql_pool_access::prelude::*;

/// Live tests need a reachable server; they are skipped unless `TESTING_PG_HOST` is set.
fn live_config() -> Option<ConnectionConfig> {
    let host = env::var("TESTING_PG_HOST").ok()?;
    Some(
        ConnectionConfig::builder()
            .host(host)
            .port(
                env::var("TESTING_PG_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(5432),
            )
            .dbname(env::var("TESTING_PG_DBNAME").unwrap_or_else(|_| "postgres".to_string()))
            .user(env::var("TESTING_PG_USER").unwrap_or_else(|_| "postgres".to_string()))
            .password(env::var("TESTING_PG_PASSWORD").unwrap_or_default())
            .connect_timeout(5)
            .finish(),
    )
}

fn unreachable_config() -> ConnectionConfig {
    ConnectionConfig::builder()
        .host("127.0.0.1")
        .port(1)
        .dbname("nowhere")
        .user("nobody")
        .connect_timeout(1)
        .finish()
}

#[tokio::test]
async fn unreachable_server_fails_to_open() {
    let mut db = PostgresDatabase::new(unreachable_config());
    assert!(!db.open().await);
    assert!(!db.is_open());
    assert!(matches!(
        db.connect().await,
        Err(SqlPoolError::ConnectionError(_))
    ));

    // CRUD on the unopened handle is a logged no-op.
    assert!(!db.insert(&StatementBuilder::new().insert("t").values([("a", "b")])).await);
    assert!(!db.query(&StatementBuilder::new().table("t")).await.is_success());
    db.close().await;
}

#[tokio::test]
async fn failed_pool_connect_does_not_grow_the_pool() {
    let pool = ConnectionPool::new(DatabaseType::Postgres, unreachable_config(), 2);
    for _ in 0..3 {
        let err = pool.acquire().await.unwrap_err();
        assert!(!err.is_pool_exhausted());
    }
    let status = pool.status();
    assert_eq!(status.total(), 0);
    assert_eq!(status.connecting, 0);
}

#[tokio::test]
async fn factory_surfaces_connect_errors_in_pooled_mode() {
    let factory = DatabaseFactory::new();
    let mut cfg = unreachable_config();
    cfg.mode = ConnectionMode::Pooled;
    cfg.pool_size = 1;

    let err = factory
        .create_database(DatabaseType::Postgres, &cfg)
        .await
        .unwrap_err();
    assert!(matches!(err, SqlPoolError::ConnectionError(_)));
    assert_eq!(factory.pool_count(), 1);
}

#[tokio::test]
async fn conflicting_target_under_one_pool_key_is_rejected() {
    let factory = DatabaseFactory::new();
    let mut first = unreachable_config();
    first.mode = ConnectionMode::Pooled;
    first.pool_size = 1;
    let mut other_port = first.clone();
    other_port.port = 2;
    assert_eq!(
        first.pool_key(DatabaseType::Postgres),
        other_port.pool_key(DatabaseType::Postgres)
    );

    // Registers the pool even though the server is unreachable.
    assert!(factory.create_database(DatabaseType::Postgres, &first).await.is_err());

    let err = factory
        .create_database(DatabaseType::Postgres, &other_port)
        .await
        .unwrap_err();
    assert!(matches!(err, SqlPoolError::ConfigError(_)));
    assert_eq!(factory.pool_count(), 1);
    let pool = factory
        .pool(DatabaseType::Postgres, &first)
        .expect("first configuration registered the pool");
    assert_eq!(pool.config().port, 1);
}

#[tokio::test]
async fn postgres_crud_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let Some(cfg) = live_config() else {
        eprintln!("TESTING_PG_HOST not set; skipping live postgres test");
        return Ok(());
    };
    let mut db = PostgresDatabase::new(cfg);
    assert!(db.open().await, "could not open postgres");

    let table = format!("sql_pool_access_users_{}", std::process::id());
    db.execute(&StatementBuilder::new().raw(format!(
        "CREATE TABLE IF NOT EXISTS {table} (id SERIAL PRIMARY KEY, username TEXT, city TEXT)"
    )))
    .await?;

    assert!(
        db.insert(
            &StatementBuilder::new()
                .insert(&table)
                .values([("username", "O'Brien"), ("city", "Cork")])
        )
        .await
    );
    assert!(
        db.update(
            &StatementBuilder::new()
                .update(&table)
                .set("city", "Dublin")
                .where_clause("username = 'O''Brien'")
        )
        .await
    );

    let rs = db
        .select(
            &StatementBuilder::new()
                .table(&table)
                .columns(["username", "city"]),
        )
        .await;
    assert_eq!(rs.rows(), 1);
    assert_eq!(rs.get(0, "username"), Some("O'Brien"));
    assert_eq!(rs.get(0, "city"), Some("Dublin"));

    let none = db
        .query(
            &StatementBuilder::new()
                .table(&table)
                .columns(["id", "username", "city"])
                .where_clause("username = 'nobody'"),
        )
        .await;
    assert!(none.is_success());
    let none = none.into_result_set();
    assert_eq!(none.rows(), 0);
    assert_eq!(none.cols(), 3);

    let nulls = db
        .select(&StatementBuilder::new().raw("SELECT NULL::text AS missing"))
        .await;
    assert_eq!(nulls.get(0, "missing"), Some(NULL_SENTINEL));

    assert!(
        db.remove(
            &StatementBuilder::new()
                .remove(&table)
                .where_clause("city = 'Dublin'")
        )
        .await
    );
    assert!(!db.insert(&StatementBuilder::new().insert(&table).values([("nope", "x")])).await);

    db.execute(&StatementBuilder::new().raw(format!("DROP TABLE IF EXISTS {table}")))
        .await?;
    db.close().await;
    assert!(!db.is_open());
    Ok(())
}

#[tokio::test]
async fn postgres_pooled_handles_are_reused() -> Result<(), Box<dyn std::error::Error>> {
    let Some(mut cfg) = live_config() else {
        return Ok(());
    };
    cfg.mode = ConnectionMode::Pooled;
    cfg.pool_size = 2;
    let factory = DatabaseFactory::new();

    let mut handle = factory.create_database(DatabaseType::Postgres, &cfg).await?;
    let id = handle.as_pooled().map(PooledConnection::id);
    let rs = handle
        .select(&StatementBuilder::new().raw("SELECT 1 AS one"))
        .await;
    assert_eq!(rs.get(0, "one"), Some("1"));
    assert!(factory.release_connection(handle));

    let again = factory.create_database(DatabaseType::Postgres, &cfg).await?;
    assert_eq!(again.as_pooled().map(PooledConnection::id), id);
    Ok(())
}
