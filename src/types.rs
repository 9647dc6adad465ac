//! Core record-set types.
//!
//! Listing files are read into an in-memory [`DataSet`] described by a [`Schema`] (a list of
//! typed [`Field`]s). Every pipeline stage takes a `DataSet` and returns a new one; nothing is
//! mutated in place.

use std::fmt;

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A list of fields describing the shape of a record set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the string payload, if this is a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Wrap an optional string, mapping `None` to [`Value::Null`].
    pub fn from_opt(s: Option<String>) -> Self {
        s.map(Value::Utf8).unwrap_or(Value::Null)
    }
}

/// Renders the value the way it is written to a delimited output cell (nulls are empty).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Utf8(s) => f.write_str(s),
        }
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Create a new dataset containing only rows that match `predicate`.
    ///
    /// The returned dataset preserves the original schema.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Create a new dataset with `field` set to `derive(row)` for every row.
    ///
    /// If a field with the same name already exists it is replaced in place (keeping its
    /// position); otherwise the field is appended at the end of the schema.
    pub fn with_column<F>(&self, field: Field, mut derive: F) -> Self
    where
        F: FnMut(&[Value]) -> Value,
    {
        let existing = self.schema.index_of(&field.name);
        let mut schema = self.schema.clone();
        match existing {
            Some(idx) => schema.fields[idx] = field,
            None => schema.fields.push(field),
        }

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let v = derive(row.as_slice());
                let mut out = row.clone();
                match existing {
                    Some(idx) => out[idx] = v,
                    None => out.push(v),
                }
                out
            })
            .collect();

        Self { schema, rows }
    }

    /// Create a new dataset keeping only the named columns, in the given order.
    ///
    /// Unknown column names are ignored.
    pub fn project<S: AsRef<str>>(&self, columns: &[S]) -> Self {
        let idxs: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.schema.index_of(c.as_ref()))
            .collect();
        let schema = Schema::new(idxs.iter().map(|&i| self.schema.fields[i].clone()).collect());
        let rows = self
            .rows
            .iter()
            .map(|row| idxs.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Self { schema, rows }
    }
}
