//! Row key specifications.
//!
//! A [`Key`] selects rows for UPDATE, DELETE, SELECT and counter updates.
//! Its shape is decided when it is constructed: each column carries an
//! explicit [`KeyPredicate`] (equality, candidate list or range), so the
//! statement builder never inspects raw data to guess intent.

use crate::error::{Error, Result, StatementErrorKind};
use crate::value::Value;

/// Column name a bare scalar key is matched against.
pub const ROW_KEY_COLUMN: &str = "KEY";

/// Open-ended bounds on one column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Range {
    /// Exclusive lower bound (`col > ?`)
    pub greater_than: Option<Value>,
    /// Exclusive upper bound (`col < ?`)
    pub less_than: Option<Value>,
}

impl Range {
    /// An unbounded range.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the exclusive lower bound.
    pub fn greater_than(mut self, value: impl Into<Value>) -> Self {
        self.greater_than = Some(value.into());
        self
    }

    /// Alias for [`greater_than`](Self::greater_than).
    pub fn from(self, value: impl Into<Value>) -> Self {
        self.greater_than(value)
    }

    /// Set the exclusive upper bound.
    pub fn less_than(mut self, value: impl Into<Value>) -> Self {
        self.less_than = Some(value.into());
        self
    }

    /// Alias for [`less_than`](Self::less_than).
    pub fn until(self, value: impl Into<Value>) -> Self {
        self.less_than(value)
    }

    /// Whether neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.greater_than.is_none() && self.less_than.is_none()
    }
}

/// How one key column restricts the selected rows.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPredicate {
    /// `col = ?`
    Eq(Value),
    /// `col IN (...)`; a single candidate is treated as `Eq` when the
    /// WHERE clause is derived
    In(Vec<Value>),
    /// `col > ?` and/or `col < ?`
    Range(Range),
}

impl KeyPredicate {
    /// Classify a candidate set by cardinality.
    ///
    /// A single candidate is plain equality; several become an IN-list.
    /// An empty set is kept as an empty IN-list and rejected when a
    /// statement is built from it.
    pub fn any_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.len() == 1 {
            KeyPredicate::Eq(values.remove(0))
        } else {
            KeyPredicate::In(values)
        }
    }
}

/// Which rows a statement addresses.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    /// A single row key, matched against the `KEY` column.
    Row(Value),
    /// Per-column predicates, joined with AND in order.
    Columns(Vec<(String, KeyPredicate)>),
}

impl Key {
    /// Key a single row.
    pub fn row(value: impl Into<Value>) -> Self {
        Key::Row(value.into())
    }

    /// Start an empty column key.
    pub fn columns() -> Self {
        Key::Columns(Vec::new())
    }

    /// Add an equality predicate.
    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column.into(), KeyPredicate::Eq(value.into()))
    }

    /// Add a candidate-set predicate, classified by cardinality.
    pub fn any_of<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push(column.into(), KeyPredicate::any_of(values))
    }

    /// Add a range predicate.
    pub fn range(self, column: impl Into<String>, range: Range) -> Self {
        self.push(column.into(), KeyPredicate::Range(range))
    }

    /// A column keyed twice is rejected when a statement is built.
    fn push(self, column: String, predicate: KeyPredicate) -> Self {
        let mut entries = self.into_predicates();
        entries.push((column, predicate));
        Key::Columns(entries)
    }

    /// The key as per-column predicates, with a row key normalized to
    /// `KEY = value`.
    pub fn into_predicates(self) -> Vec<(String, KeyPredicate)> {
        match self {
            Key::Row(value) => vec![(ROW_KEY_COLUMN.to_string(), KeyPredicate::Eq(value))],
            Key::Columns(entries) => entries,
        }
    }

    /// Borrowing variant of [`into_predicates`](Self::into_predicates).
    pub fn predicates(&self) -> Vec<(String, KeyPredicate)> {
        self.clone().into_predicates()
    }

    /// Classify a JSON key description.
    ///
    /// Scalars key a single row. A top-level array is a candidate set for
    /// `KEY`. An object maps columns to scalars (equality), arrays
    /// (candidate sets) or objects carrying `greater_than`/`from` and
    /// `less_than`/`until` (ranges).
    #[allow(clippy::result_large_err)]
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (column, value) in map {
                    let predicate = predicate_from_json(&column, value)?;
                    entries.push((column, predicate));
                }
                Ok(Key::Columns(entries))
            }
            serde_json::Value::Array(items) => Ok(Key::Columns(vec![(
                ROW_KEY_COLUMN.to_string(),
                KeyPredicate::any_of(items.into_iter().map(Value::from_json)),
            )])),
            serde_json::Value::Null => Err(Error::statement_error(
                StatementErrorKind::InvalidKey,
                "a key cannot be null",
            )),
            scalar => Ok(Key::Row(Value::from_json(scalar))),
        }
    }
}

fn predicate_from_json(column: &str, value: serde_json::Value) -> Result<KeyPredicate> {
    match value {
        serde_json::Value::Array(items) => Ok(KeyPredicate::any_of(
            items.into_iter().map(Value::from_json),
        )),
        serde_json::Value::Object(mut bounds) => {
            let mut take = |primary: &str, alias: &str| {
                [primary, alias]
                    .into_iter()
                    .filter_map(|name| bounds.remove(name))
                    .map(Value::from_json)
                    .find(|value| !value.is_null())
            };
            let range = Range {
                greater_than: take("greater_than", "from"),
                less_than: take("less_than", "until"),
            };
            if range.is_unbounded() {
                return Err(Error::statement_error(
                    StatementErrorKind::InvalidKey,
                    format!("key column '{column}' has an object without range bounds"),
                ));
            }
            Ok(KeyPredicate::Range(range))
        }
        serde_json::Value::Null => Err(Error::statement_error(
            StatementErrorKind::InvalidKey,
            format!("key column '{column}' cannot be null"),
        )),
        scalar => Ok(KeyPredicate::Eq(Value::from_json(scalar))),
    }
}

impl From<Value> for Key {
    fn from(value: Value) -> Self {
        Key::Row(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Row(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Row(value.into())
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Row(value.into())
    }
}
