#![cfg(feature = "sqlite")]

use sql_pool_access::prelude::*;
use tempfile::TempDir;

const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS users (\
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    username TEXT, \
    password TEXT, \
    city TEXT, \
    email TEXT)";

fn sqlite_config(dir: &TempDir, name: &str) -> ConnectionConfig {
    let path = dir.path().join(name);
    ConnectionConfig::builder()
        .path(path.to_string_lossy())
        .finish()
}

async fn open_users_db(dir: &TempDir) -> SqliteDatabase {
    let mut db = SqliteDatabase::new(sqlite_config(dir, "users.db"));
    assert!(db.open().await);
    assert!(db.insert(&StatementBuilder::new().raw(CREATE_USERS)).await);
    db
}

#[tokio::test]
async fn sqlite_crud_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut db = open_users_db(&dir).await;

    let insert = StatementBuilder::new().insert("users").values([
        ("username", "sara"),
        ("password", "abc"),
        ("city", "tabriz"),
        ("email", "sara@example.com"),
    ]);
    assert!(db.insert(&insert).await);

    let update = StatementBuilder::new()
        .update("users")
        .set("city", "rasht")
        .where_clause("username = 'sara'");
    assert!(db.update(&update).await);

    let select = StatementBuilder::new()
        .table("users")
        .select("id")
        .select("username")
        .select("city")
        .select("email")
        .where_clause("username = 'sara'");
    let rs = db.select(&select).await;
    assert_eq!(rs.rows(), 1);
    assert_eq!(rs.columns(), ["id", "username", "city", "email"]);
    assert_eq!(rs.get(0, "city"), Some("rasht"));
    assert_eq!(rs.at(0, 0), Some("1"));

    let delete = StatementBuilder::new()
        .remove("users")
        .where_clause("username = 'sara'");
    assert!(db.remove(&delete).await);
    assert_eq!(db.select(&select).await.rows(), 0);

    db.close().await;
    assert!(!db.is_open());
    Ok(())
}

#[tokio::test]
async fn zero_rows_keep_known_schema() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut db = open_users_db(&dir).await;

    let select = StatementBuilder::new()
        .table("users")
        .columns(["id", "username", "city", "email"])
        .where_clause("username = 'nobody'");
    let outcome = db.query(&select).await;
    assert!(outcome.is_success());
    let rs = outcome.into_result_set();
    assert_eq!(rs.rows(), 0);
    assert_eq!(rs.columns().len(), 4);
    assert_eq!(rs.cols(), 4);
    Ok(())
}

#[tokio::test]
async fn failed_read_is_tagged_and_schema_less() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut db = open_users_db(&dir).await;

    let bad = StatementBuilder::new().table("no_such_table");
    let outcome = db.query(&bad).await;
    assert!(!outcome.is_success());
    assert!(outcome.error().is_some_and(|e| e.contains("no_such_table")));

    let rs = db.select(&bad).await;
    assert_eq!(rs.rows(), 0);
    assert_eq!(rs.cols(), 0);
    Ok(())
}

#[tokio::test]
async fn nulls_and_quotes_survive_the_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut db = open_users_db(&dir).await;

    assert!(
        db.insert(
            &StatementBuilder::new()
                .insert("users")
                .values([("username", "O'Brien")])
        )
        .await
    );

    let rs = db
        .select(
            &StatementBuilder::new()
                .table("users")
                .columns(["username", "city"]),
        )
        .await;
    assert_eq!(rs.rows(), 1);
    assert_eq!(rs.at(0, 0), Some("O'Brien"));
    assert_eq!(rs.at(0, 1), Some(NULL_SENTINEL));
    Ok(())
}

#[tokio::test]
async fn failed_write_returns_false_and_leaves_no_partial_state()
-> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut db = open_users_db(&dir).await;

    let bad = StatementBuilder::new()
        .insert("users")
        .values([("no_such_column", "x")]);
    assert!(!db.insert(&bad).await);

    let rs = db.select(&StatementBuilder::new().table("users")).await;
    assert_eq!(rs.rows(), 0);
    assert_eq!(rs.cols(), 5);

    let err = db.execute(&bad).await.unwrap_err();
    assert!(matches!(err, SqlPoolError::SqliteError(_)));
    Ok(())
}

#[tokio::test]
async fn execute_reports_rows_affected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut db = open_users_db(&dir).await;
    for name in ["a", "b", "c"] {
        db.execute(
            &StatementBuilder::new()
                .insert("users")
                .values([("username", name), ("city", "x")]),
        )
        .await?;
    }
    let changed = db
        .execute(&StatementBuilder::new().update("users").set("city", "y"))
        .await?;
    assert_eq!(changed, 3);
    Ok(())
}

#[tokio::test]
async fn closed_handle_is_a_safe_no_op() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut db = SqliteDatabase::new(sqlite_config(&dir, "closed.db"));
    assert!(!db.is_open());

    let select = StatementBuilder::new().table("users");
    assert!(!db.insert(&StatementBuilder::new().raw(CREATE_USERS)).await);
    assert!(!db.update(&StatementBuilder::new().update("users").set("a", "b")).await);
    assert!(!db.remove(&StatementBuilder::new().remove("users")).await);
    assert_eq!(db.select(&select).await.cols(), 0);
    assert!(matches!(
        db.execute(&select).await,
        Err(SqlPoolError::NotOpen(DatabaseType::Sqlite))
    ));

    // Closing twice is harmless.
    db.close().await;
    db.close().await;
    Ok(())
}

#[tokio::test]
async fn open_is_idempotent_and_reopens_after_close() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut db = open_users_db(&dir).await;
    assert!(db.open().await);
    assert!(db.is_open());

    db.insert(
        &StatementBuilder::new()
            .insert("users")
            .values([("username", "kept")]),
    )
    .await;
    db.close().await;
    assert!(db.open().await);
    let rs = db.select(&StatementBuilder::new().table("users")).await;
    assert_eq!(rs.rows(), 1);
    Ok(())
}

#[tokio::test]
async fn unopenable_path_reports_failure() {
    let cfg = ConnectionConfig::builder()
        .path("/nonexistent-dir/for/sure/db.sqlite")
        .finish();
    let mut db = SqliteDatabase::new(cfg);
    assert!(!db.open().await);
    assert!(!db.is_open());
    assert!(db.connect().await.is_err());
}

#[tokio::test]
async fn empty_statement_is_rejected_without_io() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut db = open_users_db(&dir).await;
    assert!(!db.insert(&StatementBuilder::new()).await);
    assert!(matches!(
        db.execute(&StatementBuilder::new()).await,
        Err(SqlPoolError::ExecutionError(_))
    ));
    Ok(())
}
