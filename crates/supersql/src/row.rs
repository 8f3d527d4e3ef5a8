//! Result rows returned by [`Query::execute`](crate::Query::execute).

use crate::error::{SqlError, SqlResult};
use crate::value::Value;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;
use tokio_postgres::types::Type;

/// A single result row: ordered column names and their decoded values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Decode a driver row into owned values.
    ///
    /// Types without a dedicated [`Value`] variant are read as text when the
    /// driver allows it.
    pub fn from_pg(row: &tokio_postgres::Row) -> SqlResult<Self> {
        let columns: Arc<[String]> = row
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let values = row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                decode_column(row, idx, col.type_())
                    .map_err(|e| SqlError::decode(col.name(), e.to_string()))
            })
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(Self { columns, values })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the named column.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Value at a 0-based column index.
    pub fn column(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Typed value of the named column.
    pub fn try_get<T: FromValue>(&self, name: &str) -> SqlResult<T> {
        let value = self
            .get(name)
            .ok_or_else(|| SqlError::decode(name, "no such column"))?;
        T::from_value(value).map_err(|message| SqlError::decode(name, message))
    }
}

fn decode_column(
    row: &tokio_postgres::Row,
    idx: usize,
    ty: &Type,
) -> Result<Value, tokio_postgres::Error> {
    let value: Value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)?.into()
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)?.into()
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)?.into()
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)?.into()
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)?.into()
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)?.into()
    } else if *ty == Type::BYTEA {
        row.try_get::<_, Option<Vec<u8>>>(idx)?.into()
    } else if *ty == Type::UUID {
        row.try_get::<_, Option<uuid::Uuid>>(idx)?.into()
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<DateTime<Utc>>>(idx)?.into()
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(|ts| ts.and_utc())
            .into()
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        row.try_get::<_, Option<serde_json::Value>>(idx)?.into()
    } else {
        // TEXT, VARCHAR, BPCHAR, NAME and anything else with a text form.
        row.try_get::<_, Option<String>>(idx)?.into()
    };
    Ok(value)
}

/// Typed extraction from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &Value) -> String {
    format!("expected {expected}, found {}", value.kind())
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        value.as_int().ok_or_else(|| mismatch("integer", value))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        let v = i64::from_value(value)?;
        i32::try_from(v).map_err(|e| e.to_string())
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => Err(mismatch("float", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(v) => Ok(*v),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(v) => Ok(v.clone()),
            other => Err(mismatch("string", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bytes(v) => Ok(v.clone()),
            other => Err(mismatch("bytes", other)),
        }
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Uuid(v) => Ok(*v),
            other => Err(mismatch("uuid", other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Timestamp(v) => Ok(*v),
            other => Err(mismatch("timestamp", other)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            other => Err(mismatch("json", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Maps a [`Row`] into a user-defined shape.
///
/// ```ignore
/// struct Member {
///     id: i64,
///     username: String,
/// }
///
/// impl FromRow for Member {
///     fn from_row(row: &Row) -> SqlResult<Self> {
///         Ok(Self {
///             id: row.try_get("id")?,
///             username: row.try_get("username")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> SqlResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> SqlResult<Self> {
        Ok(row.clone())
    }
}

/// The rows produced by one execution.
///
/// Iteration is a single pass from the first row; [`Rows::row`] gives random
/// access by 1-based position without moving the cursor.
#[derive(Debug, Clone, Default)]
pub struct Rows {
    rows: Vec<Row>,
    affected: Option<u64>,
    cursor: usize,
}

impl Rows {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            affected: None,
            cursor: 0,
        }
    }

    /// Result of a statement that returned no rows, only a count.
    pub fn affected_only(count: u64) -> Self {
        Self {
            rows: Vec::new(),
            affected: Some(count),
            cursor: 0,
        }
    }

    /// Row at a 1-based position.
    pub fn row(&self, n: usize) -> SqlResult<&Row> {
        if n < 1 {
            return Err(SqlError::not_found("row positions start at 1"));
        }
        self.rows
            .get(n - 1)
            .ok_or_else(|| SqlError::not_found(format!("no row {n}, result has {}", self.rows.len())))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows affected, for statements executed without a result set.
    pub fn affected(&self) -> Option<u64> {
        self.affected
    }

    /// Map every row (regardless of the cursor) into `T`.
    pub fn into_models<T: FromRow>(self) -> SqlResult<Vec<T>> {
        self.rows.iter().map(T::from_row).collect()
    }
}

impl Iterator for Rows {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let row = self.rows.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: i64, name: &str) -> Row {
        let columns: Arc<[String]> = vec!["id".to_string(), "username".to_string()].into();
        Row::new(columns, vec![Value::Int(id), Value::from(name)])
    }

    struct Member {
        id: i64,
        username: String,
    }

    impl FromRow for Member {
        fn from_row(row: &Row) -> SqlResult<Self> {
            Ok(Self {
                id: row.try_get("id")?,
                username: row.try_get("username")?,
            })
        }
    }

    #[test]
    fn row_access_by_name_and_index() {
        let row = member(7, "obi");
        assert_eq!(row.get("username"), Some(&Value::from("obi")));
        assert_eq!(row.column(0), Some(&Value::Int(7)));
        assert_eq!(row.try_get::<i64>("id").unwrap(), 7);
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn typed_access_reports_mismatches() {
        let row = member(7, "obi");
        let err = row.try_get::<bool>("id").unwrap_err();
        assert!(matches!(err, SqlError::Decode { ref column, .. } if column == "id"));
        assert!(row.try_get::<i64>("nope").is_err());
    }

    #[test]
    fn optional_values() {
        let columns: Arc<[String]> = vec!["email".to_string()].into();
        let row = Row::new(columns, vec![Value::Null]);
        assert_eq!(row.try_get::<Option<String>>("email").unwrap(), None);
    }

    #[test]
    fn row_positions_are_one_based() {
        let rows = Rows::new(vec![member(1, "a"), member(2, "b")]);
        assert_eq!(rows.row(1).unwrap().try_get::<i64>("id").unwrap(), 1);
        assert_eq!(rows.row(2).unwrap().try_get::<i64>("id").unwrap(), 2);
        assert!(rows.row(0).unwrap_err().is_not_found());
        assert!(rows.row(3).unwrap_err().is_not_found());
    }

    #[test]
    fn iteration_is_single_pass() {
        let mut rows = Rows::new(vec![member(1, "a"), member(2, "b")]);
        assert_eq!(rows.next().map(|r| r.len()), Some(2));
        assert!(rows.next().is_some());
        assert!(rows.next().is_none());
        // Positional access is unaffected by the cursor.
        assert!(rows.row(1).is_ok());
    }

    #[test]
    fn materializes_models() {
        let rows = Rows::new(vec![member(1, "a"), member(2, "b")]);
        let members: Vec<Member> = rows.into_models().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].id, 2);
        assert_eq!(members[1].username, "b");
    }

    #[test]
    fn affected_only_has_no_rows() {
        let rows = Rows::affected_only(3);
        assert_eq!(rows.affected(), Some(3));
        assert!(rows.is_empty());
    }
}
