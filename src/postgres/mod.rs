// PostgreSQL backend
//
// - connection: the `Database` implementation over a tokio-postgres client
// - query: conversion of simple-query (text protocol) messages into a `ResultSet`

pub mod connection;
pub mod query;

pub use connection::PostgresDatabase;
pub use query::{build_result_set, rows_affected};
