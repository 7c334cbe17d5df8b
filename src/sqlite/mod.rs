// SQLite backend
//
// - connection: the `Database` implementation over a file-backed rusqlite connection
// - query: conversion of rusqlite rows into the text `ResultSet`

pub mod connection;
pub mod query;

pub use connection::SqliteDatabase;
pub use query::build_result_set;
