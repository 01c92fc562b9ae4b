//! Result rows.

use crate::Result;
use crate::error::{Error, TypeError};
use crate::record::Record;
use crate::value::Value;
use std::sync::Arc;

/// Column names of a result set, shared by its rows.
///
/// Wide rows carry their own column names (lookup rows are named by ids), so
/// drivers usually build one of these per row; sharing is for drivers that
/// decode a fixed projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnInfo {
    names: Vec<String>,
}

impl ColumnInfo {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of `name`, first match wins.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A single row returned by the store.
///
/// A row exposes its column hash (column name to stored value) and, when the
/// driver reports it, the row key. A row with an empty column hash is what
/// the store returns for a key that has no live columns.
#[derive(Debug, Clone)]
pub struct Row {
    key: Option<Value>,
    columns: Arc<ColumnInfo>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row from parallel name and value lists.
    pub fn new(names: Vec<String>, values: Vec<Value>) -> Self {
        Self::with_columns(Arc::new(ColumnInfo::new(names)), values)
    }

    /// Build a row over shared column names.
    pub fn with_columns(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self {
            key: None,
            columns,
            values,
        }
    }

    /// A row with a key and no columns.
    pub fn empty(key: impl Into<Value>) -> Self {
        Self::with_columns(Arc::default(), Vec::new()).keyed(key)
    }

    /// Attach the row key reported by the driver.
    pub fn keyed(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// The row key, if the driver reported one.
    pub fn key(&self) -> Option<&Value> {
        self.key.as_ref()
    }

    /// Number of live columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column hash is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns.position(name).and_then(|i| self.values.get(i))
    }

    /// Convert the named column, reporting the column on failure.
    #[allow(clippy::result_large_err)]
    pub fn get_named<T>(&self, name: &str) -> Result<T>
    where
        T: TryFrom<Value, Error = Error>,
    {
        let Some(value) = self.get_by_name(name) else {
            return Err(Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: "missing column".to_string(),
                column: Some(name.to_string()),
            }));
        };
        match T::try_from(value.clone()) {
            Err(Error::Type(te)) => Err(Error::Type(TypeError {
                column: Some(name.to_string()),
                ..te
            })),
            other => other,
        }
    }

    /// (column, value) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(&self.values)
    }

    /// The column hash as an ordered record.
    pub fn col_hash(&self) -> Record {
        self.iter()
            .map(|(name, value)| (name, value.clone()))
            .collect()
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.values == other.values
            && self.columns.names() == other.columns.names()
    }
}
