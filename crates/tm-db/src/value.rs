//! Driver-neutral parameter and row values

use crate::error::{DbError, DbResult};
use std::fmt;

/// A single SQL value, used both as a bind parameter and as a column value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "null"),
            SqlValue::Integer(n) => write!(f, "{n}"),
            SqlValue::Real(r) => write!(f, "{r}"),
            SqlValue::Text(s) => write!(f, "{s}"),
            SqlValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<usize> for SqlValue {
    fn from(value: usize) -> Self {
        SqlValue::Integer(value as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Boolean(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

/// One result row, columns in select-list order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&SqlValue> {
        self.values.get(idx)
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Read column `idx` as an integer.
    pub fn get_i64(&self, idx: usize) -> DbResult<i64> {
        match self.values.get(idx) {
            Some(SqlValue::Integer(n)) => Ok(*n),
            Some(other) => Err(DbError::Internal(format!(
                "column {idx} is not an integer: {other:?}"
            ))),
            None => Err(DbError::Internal(format!(
                "column {idx} out of range (row has {} columns)",
                self.values.len()
            ))),
        }
    }

    /// Read column `idx` as text.
    pub fn get_str(&self, idx: usize) -> DbResult<&str> {
        match self.values.get(idx) {
            Some(SqlValue::Text(s)) => Ok(s),
            Some(other) => Err(DbError::Internal(format!(
                "column {idx} is not text: {other:?}"
            ))),
            None => Err(DbError::Internal(format!(
                "column {idx} out of range (row has {} columns)",
                self.values.len()
            ))),
        }
    }
}

impl From<Vec<SqlValue>> for Row {
    fn from(values: Vec<SqlValue>) -> Self {
        Self::new(values)
    }
}
