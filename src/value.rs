//! Values bound to statements and returned in rows

use crate::error::{Error, Result};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

/// A single CQL value
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    /// Absent value
    Null,
    /// `text` / `varchar`
    Text(String),
    /// `boolean`
    Boolean(bool),
    /// `int`
    Int(i32),
    /// `bigint` / `counter`
    BigInt(i64),
    /// `double`
    Double(f64),
    /// `uuid` / `timeuuid`
    Uuid(Uuid),
    /// `timestamp`
    Timestamp(DateTime<Utc>),
    /// `blob`
    Blob(Vec<u8>),
    /// `list<...>` / `set<...>`
    List(Vec<CqlValue>),
}

impl CqlValue {
    /// Returns true for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, CqlValue::Null)
    }

    /// Borrow the text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON value into a bind value.
    ///
    /// Integers that fit in 32 bits become `Int`, wider ones `BigInt`. Strings stay
    /// text. Objects have no positional meaning and are rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(match value {
            Value::Null => CqlValue::Null,
            Value::Bool(b) => CqlValue::Boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => CqlValue::Int(small),
                        Err(_) => CqlValue::BigInt(i),
                    }
                } else if let Some(f) = n.as_f64() {
                    CqlValue::Double(f)
                } else {
                    return Err(Error::InvalidBody(format!("unsupported number {}", n)));
                }
            }
            Value::String(s) => CqlValue::Text(s.clone()),
            Value::Array(items) => CqlValue::List(
                items
                    .iter()
                    .map(CqlValue::from_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Object(_) => {
                return Err(Error::InvalidBody(
                    "JSON objects cannot be bound positionally".to_string(),
                ))
            }
        })
    }

    /// Converts this value to JSON
    pub fn to_json(&self) -> Value {
        match self {
            CqlValue::Null => Value::Null,
            CqlValue::Text(s) => Value::String(s.clone()),
            CqlValue::Boolean(b) => Value::Bool(*b),
            CqlValue::Int(i) => Value::from(*i),
            CqlValue::BigInt(i) => Value::from(*i),
            CqlValue::Double(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            CqlValue::Uuid(u) => Value::String(u.to_string()),
            CqlValue::Timestamp(ts) => Value::String(ts.to_rfc3339()),
            CqlValue::Blob(bytes) => Value::String(STANDARD.encode(bytes)),
            CqlValue::List(items) => Value::Array(items.iter().map(CqlValue::to_json).collect()),
        }
    }
}

impl Serialize for CqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CqlValue::Null => serializer.serialize_none(),
            CqlValue::Text(s) => serializer.serialize_str(s),
            CqlValue::Boolean(b) => serializer.serialize_bool(*b),
            CqlValue::Int(i) => serializer.serialize_i32(*i),
            CqlValue::BigInt(i) => serializer.serialize_i64(*i),
            CqlValue::Double(f) => serializer.serialize_f64(*f),
            CqlValue::Uuid(u) => serializer.collect_str(u),
            CqlValue::Timestamp(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            CqlValue::Blob(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            CqlValue::List(items) => serializer.collect_seq(items),
        }
    }
}

impl From<&str> for CqlValue {
    fn from(s: &str) -> Self {
        CqlValue::Text(s.to_string())
    }
}

impl From<String> for CqlValue {
    fn from(s: String) -> Self {
        CqlValue::Text(s)
    }
}

impl From<bool> for CqlValue {
    fn from(b: bool) -> Self {
        CqlValue::Boolean(b)
    }
}

impl From<i32> for CqlValue {
    fn from(i: i32) -> Self {
        CqlValue::Int(i)
    }
}

impl From<i64> for CqlValue {
    fn from(i: i64) -> Self {
        CqlValue::BigInt(i)
    }
}

impl From<f64> for CqlValue {
    fn from(f: f64) -> Self {
        CqlValue::Double(f)
    }
}

impl From<Uuid> for CqlValue {
    fn from(u: Uuid) -> Self {
        CqlValue::Uuid(u)
    }
}

impl From<DateTime<Utc>> for CqlValue {
    fn from(ts: DateTime<Utc>) -> Self {
        CqlValue::Timestamp(ts)
    }
}

impl From<Vec<CqlValue>> for CqlValue {
    fn from(items: Vec<CqlValue>) -> Self {
        CqlValue::List(items)
    }
}

impl<T: Into<CqlValue>> From<Option<T>> for CqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CqlValue::Null, Into::into)
    }
}

/// A result row, columns kept in select order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, CqlValue)>,
}

impl Row {
    /// Creates an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column, builder style
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CqlValue>) -> Self {
        self.push(column, value);
        self
    }

    /// Appends a column
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<CqlValue>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Looks up a column by name
    pub fn get(&self, column: &str) -> Option<&CqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the row has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates over `(column, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CqlValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Converts the row to a JSON object
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .columns
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<CqlValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.columns.iter().map(|(name, value)| (name, value)))
    }
}

/// Rows returned by a statement execution
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    rows: Vec<Row>,
    applied: bool,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            applied: true,
        }
    }
}

impl ResultSet {
    /// An applied result with no rows, as returned by plain writes
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a result from rows
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            applied: true,
        }
    }

    /// Sets whether a conditional (`IF ...`) statement was applied
    pub fn with_applied(mut self, applied: bool) -> Self {
        self.applied = applied;
        self
    }

    /// Whether the statement was applied
    pub fn was_applied(&self) -> bool {
        self.applied
    }

    /// Borrow the rows
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consume into rows
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows were returned
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
