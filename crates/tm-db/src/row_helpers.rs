//! Conversions between [`SqlValue`] and DuckDB's parameter and row types.

use crate::value::{Row, SqlValue};
use duckdb::types::{ToSql, ToSqlOutput, Value, ValueRef};

impl ToSql for SqlValue {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            SqlValue::Null => Value::Null,
            SqlValue::Integer(n) => Value::BigInt(*n),
            SqlValue::Real(r) => Value::Double(*r),
            SqlValue::Text(s) => Value::Text(s.clone()),
            SqlValue::Boolean(b) => Value::Boolean(*b),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// Read a column value according to the type DuckDB reports for it.
///
/// Text columns stay text even when their contents look numeric, so a
/// `VARCHAR` holding `"001"` reads back as [`SqlValue::Text`]. Other types
/// (DECIMAL, dates) are read as a float, then as a string, then NULL.
fn get_column_value(row: &duckdb::Row<'_>, idx: usize) -> SqlValue {
    let value = match row.get_ref(idx) {
        Ok(value) => value,
        Err(_) => return SqlValue::Null,
    };
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Boolean(b) => SqlValue::Boolean(b),
        ValueRef::TinyInt(n) => SqlValue::Integer(n.into()),
        ValueRef::SmallInt(n) => SqlValue::Integer(n.into()),
        ValueRef::Int(n) => SqlValue::Integer(n.into()),
        ValueRef::BigInt(n) => SqlValue::Integer(n),
        ValueRef::UTinyInt(n) => SqlValue::Integer(n.into()),
        ValueRef::USmallInt(n) => SqlValue::Integer(n.into()),
        ValueRef::UInt(n) => SqlValue::Integer(n.into()),
        ValueRef::UBigInt(n) => i64::try_from(n).map_or(SqlValue::Real(n as f64), SqlValue::Integer),
        ValueRef::Float(f) => SqlValue::Real(f.into()),
        ValueRef::Double(f) => SqlValue::Real(f),
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        _ => {
            if let Ok(Some(f)) = row.get::<_, Option<f64>>(idx) {
                return SqlValue::Real(f);
            }
            match row.get::<_, Option<String>>(idx) {
                Ok(Some(s)) => SqlValue::Text(s),
                _ => SqlValue::Null,
            }
        }
    }
}

/// Read every column of a DuckDB row.
///
/// DuckDB panics on `stmt.column_count()` before execution, so the count is
/// taken from the row's statement, which has run by the time a row exists.
pub(crate) fn read_row(row: &duckdb::Row<'_>) -> Row {
    let col_count = row.as_ref().column_count();
    Row::new((0..col_count).map(|i| get_column_value(row, i)).collect())
}
