use std::collections::BTreeMap;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::ToSql;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A dynamically typed column value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Real(r) => Some(*r),
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Text(s) => s.parse().ok(),
            FieldValue::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self { FieldValue::Integer(v) }
}
impl From<i32> for FieldValue {
    fn from(v: i32) -> Self { FieldValue::Integer(v as i64) }
}
impl From<f64> for FieldValue {
    fn from(v: f64) -> Self { FieldValue::Real(v) }
}
impl From<&str> for FieldValue {
    fn from(v: &str) -> Self { FieldValue::Text(v.to_string()) }
}
impl From<String> for FieldValue {
    fn from(v: String) -> Self { FieldValue::Text(v) }
}
impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Null => ToSqlOutput::Owned(Value::Null),
            FieldValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            FieldValue::Real(r) => ToSqlOutput::Owned(Value::Real(*r)),
            FieldValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl From<ValueRef<'_>> for FieldValue {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => FieldValue::Null,
            ValueRef::Integer(i) => FieldValue::Integer(i),
            ValueRef::Real(r) => FieldValue::Real(r),
            // No blob columns in either table
            ValueRef::Text(t) | ValueRef::Blob(t) => FieldValue::Text(String::from_utf8_lossy(t).into_owned()),
        }
    }
}

/// Column values for an insert or update, keyed by column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    pub fn new() -> Self {
        Fields(BTreeMap::new())
    }

    /// Builder style variant of `put`
    pub fn with(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.put(column, value);
        self
    }

    pub fn put(&mut self, column: &str, value: impl Into<FieldValue>) {
        self.0.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.0.get(column)
    }

    pub fn contains_key(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Raw outcome of a select: the column names and the rows in result order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<FieldValue>>,
}

impl QueryResult {
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row { columns: &self.columns, values })
    }
}

/// One row of a result, addressable by column name or position
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [FieldValue],
}

impl<'a> Row<'a> {
    /// Returns the value of the first column with the given name
    pub fn get(&self, column: &str) -> Option<&'a FieldValue> {
        self.columns.iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn get_index(&self, index: usize) -> Option<&'a FieldValue> {
        self.values.get(index)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(FieldValue::as_i64)
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(FieldValue::as_f64)
    }

    pub fn get_str(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(FieldValue::as_str)
    }

    pub fn columns(&self) -> &'a [String] {
        self.columns
    }
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
