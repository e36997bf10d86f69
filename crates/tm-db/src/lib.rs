//! tm-db - Database collaborator contract for Tidemark
//!
//! This crate provides the `Commands`, `Connection` and `Transaction` traits
//! the migrator drives, plus a DuckDB implementation of them.

pub mod duckdb;
pub mod error;
pub(crate) mod row_helpers;
pub mod traits;
pub mod value;

pub use self::duckdb::{DuckDbBackend, DuckDbTransaction};
pub use error::{DbError, DbResult};
pub use traits::{Commands, Connection, Transaction};
pub use value::{Row, SqlValue};
