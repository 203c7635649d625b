//! Row values and the typed user record decoded from them.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names of the user table, in schema order.
pub const COLUMNS: [&str; 4] = ["user_id", "name", "email", "age"];

/// A single cell produced by a result cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Text(String),
    Null,
}

impl Value {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Text(s) => f.write_str(s),
            Value::Null => f.write_str("NULL"),
        }
    }
}

/// An untyped row, one value per selected column.
pub type Row = Vec<Value>;

/// One row of the user table.
///
/// Records are plain owned values: once yielded they belong to the consumer and
/// stay valid after the stream that produced them is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "user_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: u32,
}

impl Record {
    /// Cells in [`COLUMNS`] order.
    pub fn into_row(self) -> Row {
        vec![
            Value::Text(self.id),
            Value::Text(self.name),
            Value::Text(self.email),
            Value::Integer(i64::from(self.age)),
        ]
    }
}

/// Decoding of a typed item from a raw row.
pub trait FromRow: Sized {
    fn from_row(row: Row) -> Result<Self>;
}

impl FromRow for Row {
    fn from_row(row: Row) -> Result<Self> {
        Ok(row)
    }
}

impl FromRow for Record {
    fn from_row(row: Row) -> Result<Self> {
        let [id, name, email, age]: [Value; 4] = row.try_into().map_err(|row: Row| {
            Error::Query(format!(
                "expected {} columns for a user record, found {}",
                COLUMNS.len(),
                row.len()
            ))
        })?;

        Ok(Record {
            id: identifier(id)?,
            name: text(name, "name")?,
            email: text(email, "email")?,
            age: age_value(age)?,
        })
    }
}

/// Single-column `age` rows, the input of the streaming aggregation.
impl FromRow for u32 {
    fn from_row(row: Row) -> Result<Self> {
        let [value]: [Value; 1] = row.try_into().map_err(|row: Row| {
            Error::Query(format!("expected a single age column, found {}", row.len()))
        })?;
        age_value(value)
    }
}

fn identifier(value: Value) -> Result<String> {
    match value {
        Value::Text(s) => Ok(s),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Null => Err(Error::Query("column 'user_id' is NULL".to_string())),
    }
}

fn text(value: Value, column: &str) -> Result<String> {
    match value {
        Value::Text(s) => Ok(s),
        other => Err(Error::Query(format!(
            "column '{column}' expected text, found {other:?}"
        ))),
    }
}

fn age_value(value: Value) -> Result<u32> {
    match value {
        Value::Integer(i) => u32::try_from(i)
            .map_err(|_| Error::Query(format!("column 'age' out of range: {i}"))),
        other => Err(Error::Query(format!(
            "column 'age' expected a non-negative integer, found {other:?}"
        ))),
    }
}
