//! Statement builders for INSERT, UPDATE, counter UPDATE, DELETE and lookup
//! inserts.

use crate::clause::Where;
use cassy_core::error::StatementErrorKind;
use cassy_core::{
    Error, InListMode, Key, ROW_KEY_COLUMN, Record, Result, StatementSpec, Value, generate_id,
    quote_dynamic_column, quote_ident,
};

/// Column the default insert key is taken from.
pub const ID_COLUMN: &str = "id";

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// INSERT statement builder.
///
/// The row key is written to the `KEY` column ahead of the data columns.
/// Without an explicit key, a non-null `id` entry is used, otherwise a
/// fresh time-ordered id is generated.
#[derive(Debug)]
pub struct InsertBuilder<'a> {
    family: &'a str,
    data: &'a Record,
    key: Option<Value>,
}

impl<'a> InsertBuilder<'a> {
    /// Create a new INSERT builder for `data` in `family`.
    pub fn new(family: &'a str, data: &'a Record) -> Self {
        Self {
            family,
            data,
            key: None,
        }
    }

    /// Use an explicit row key.
    pub fn key(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Derive the row key from the data.
    pub fn key_with<F>(self, make_key: F) -> Self
    where
        F: FnOnce(&Record) -> Value,
    {
        let key = make_key(self.data);
        self.key(key)
    }

    fn resolve_key(&self) -> Value {
        if let Some(key) = &self.key {
            return key.clone();
        }
        match self.data.get(ID_COLUMN) {
            Some(id) if !id.is_null() => id.clone(),
            _ => generate_id(),
        }
    }

    /// Build the INSERT statement.
    #[allow(clippy::result_large_err)]
    pub fn build(&self) -> Result<StatementSpec> {
        let family = quote_ident(self.family)?;
        let mut columns = vec![format!("'{ROW_KEY_COLUMN}'")];
        for column in self.data.columns() {
            columns.push(quote_ident(column)?);
        }

        let key = self.resolve_key();
        let mut values = Vec::with_capacity(self.data.len() + 1);
        values.push(key.clone());
        values.extend(self.data.values().cloned());

        let statement = format!(
            "INSERT INTO {family} ({}) VALUES ({})",
            columns.join(", "),
            placeholders(values.len())
        );
        tracing::trace!(family = self.family, key = %key.render(), "Built insert");
        Ok(StatementSpec::with_key(statement, values, vec![key.render()]))
    }
}

/// UPDATE statement builder.
#[derive(Debug)]
pub struct UpdateBuilder<'a> {
    family: &'a str,
    data: &'a Record,
    key: Option<&'a Key>,
    in_list: InListMode,
}

impl<'a> UpdateBuilder<'a> {
    /// Create a new UPDATE builder setting every column of `data`.
    pub fn new(family: &'a str, data: &'a Record) -> Self {
        Self {
            family,
            data,
            key: None,
            in_list: InListMode::default(),
        }
    }

    /// Restrict the update to the rows matched by `key`.
    pub fn filter(mut self, key: &'a Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Choose how multi-candidate key columns are rendered.
    pub fn in_list(mut self, mode: InListMode) -> Self {
        self.in_list = mode;
        self
    }

    /// Build the UPDATE statement.
    #[allow(clippy::result_large_err)]
    pub fn build(&self) -> Result<StatementSpec> {
        if self.data.is_empty() {
            return Err(Error::statement_error(
                StatementErrorKind::Empty,
                format!("update of '{}' sets no columns", self.family),
            ));
        }
        let family = quote_ident(self.family)?;
        let mut set_clauses = Vec::with_capacity(self.data.len());
        for column in self.data.columns() {
            set_clauses.push(format!("{} = ?", quote_ident(column)?));
        }
        let data_values = self.data.values().cloned();
        keyed_spec(
            format!("UPDATE {family} SET {}", set_clauses.join(", ")),
            data_values,
            Where::from_optional(self.key, self.in_list)?,
        )
    }
}

/// Operator applied by a counter update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterOp {
    #[default]
    Add,
    Subtract,
}

impl CounterOp {
    /// The operator as written in statement text.
    pub const fn as_str(self) -> &'static str {
        match self {
            CounterOp::Add => "+",
            CounterOp::Subtract => "-",
        }
    }

    /// Parse `+` or `-`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "+" => Some(CounterOp::Add),
            "-" => Some(CounterOp::Subtract),
            _ => None,
        }
    }
}

/// Ordered counter adjustments: column, operator, amount.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CounterUpdate {
    entries: Vec<(String, CounterOp, Value)>,
}

impl CounterUpdate {
    /// Create an empty set of adjustments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to `column`.
    pub fn increment(mut self, column: impl Into<String>, amount: impl Into<Value>) -> Self {
        self.entries
            .push((column.into(), CounterOp::Add, amount.into()));
        self
    }

    /// Subtract `amount` from `column`.
    pub fn decrement(mut self, column: impl Into<String>, amount: impl Into<Value>) -> Self {
        self.entries
            .push((column.into(), CounterOp::Subtract, amount.into()));
        self
    }

    /// Number of adjusted columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no column is adjusted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse `{col: amount}` or `{col: {"operator": "-", "value": amount}}`.
    ///
    /// A missing operator means `+`.
    #[allow(clippy::result_large_err)]
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(Error::statement_error(
                StatementErrorKind::Empty,
                "counter update must be an object",
            ));
        };
        let mut update = Self::new();
        for (column, entry) in map {
            let (op, amount) = match entry {
                serde_json::Value::Object(mut spec) => {
                    let op = match spec.remove("operator") {
                        None | Some(serde_json::Value::Null) => CounterOp::Add,
                        Some(serde_json::Value::String(s)) => {
                            CounterOp::parse(&s).ok_or_else(|| {
                                Error::statement_error(
                                    StatementErrorKind::InvalidIdentifier,
                                    format!("unsupported counter operator '{s}' on '{column}'"),
                                )
                            })?
                        }
                        Some(other) => {
                            return Err(Error::statement_error(
                                StatementErrorKind::InvalidIdentifier,
                                format!("unsupported counter operator {other} on '{column}'"),
                            ));
                        }
                    };
                    let amount = spec
                        .remove("value")
                        .map(Value::from_json)
                        .unwrap_or(Value::Null);
                    (op, amount)
                }
                raw => (CounterOp::Add, Value::from_json(raw)),
            };
            update.entries.push((column, op, amount));
        }
        Ok(update)
    }
}

/// Counter UPDATE statement builder (`'c' = 'c' + ?`).
#[derive(Debug)]
pub struct CounterUpdateBuilder<'a> {
    family: &'a str,
    update: &'a CounterUpdate,
    key: Option<&'a Key>,
    in_list: InListMode,
}

impl<'a> CounterUpdateBuilder<'a> {
    /// Create a new counter UPDATE builder.
    pub fn new(family: &'a str, update: &'a CounterUpdate) -> Self {
        Self {
            family,
            update,
            key: None,
            in_list: InListMode::default(),
        }
    }

    /// Restrict the update to the rows matched by `key`.
    pub fn filter(mut self, key: &'a Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Choose how multi-candidate key columns are rendered.
    pub fn in_list(mut self, mode: InListMode) -> Self {
        self.in_list = mode;
        self
    }

    /// Build the counter UPDATE statement.
    #[allow(clippy::result_large_err)]
    pub fn build(&self) -> Result<StatementSpec> {
        if self.update.is_empty() {
            return Err(Error::statement_error(
                StatementErrorKind::Empty,
                format!("counter update of '{}' adjusts no columns", self.family),
            ));
        }
        let family = quote_ident(self.family)?;
        let mut set_clauses = Vec::with_capacity(self.update.len());
        for (column, op, _) in &self.update.entries {
            let column = quote_ident(column)?;
            set_clauses.push(format!("{column} = {column} {} ?", op.as_str()));
        }
        let amounts = self.update.entries.iter().map(|(_, _, v)| v.clone());
        keyed_spec(
            format!("UPDATE {family} SET {}", set_clauses.join(", ")),
            amounts,
            Where::from_optional(self.key, self.in_list)?,
        )
    }
}

/// DELETE statement builder.
///
/// Column names to delete are bound as placeholders; with no columns the
/// whole row is removed.
#[derive(Debug)]
pub struct DeleteBuilder<'a> {
    family: &'a str,
    columns: Vec<&'a str>,
    key: Option<&'a Key>,
    in_list: InListMode,
}

impl<'a> DeleteBuilder<'a> {
    /// Create a new DELETE builder for `family`.
    pub fn new(family: &'a str) -> Self {
        Self {
            family,
            columns: Vec::new(),
            key: None,
            in_list: InListMode::default(),
        }
    }

    /// Delete only these columns.
    pub fn columns(mut self, columns: &[&'a str]) -> Self {
        self.columns = columns.to_vec();
        self
    }

    /// Restrict the delete to the rows matched by `key`.
    pub fn filter(mut self, key: &'a Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Choose how multi-candidate key columns are rendered.
    pub fn in_list(mut self, mode: InListMode) -> Self {
        self.in_list = mode;
        self
    }

    /// Build the DELETE statement.
    #[allow(clippy::result_large_err)]
    pub fn build(&self) -> Result<StatementSpec> {
        let family = quote_ident(self.family)?;
        let statement = if self.columns.is_empty() {
            format!("DELETE FROM {family}")
        } else {
            format!("DELETE {} FROM {family}", placeholders(self.columns.len()))
        };
        keyed_spec(
            statement,
            self.columns.iter().map(|c| Value::from(*c)),
            Where::from_optional(self.key, self.in_list)?,
        )
    }
}

/// One column of a lookup row.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupId {
    /// Column named by the id, with no value.
    Name(String),
    /// Column named by `id`; a missing value is stored as an empty string.
    Entry { id: String, value: Option<Value> },
}

impl LookupId {
    fn column(&self) -> &str {
        match self {
            LookupId::Name(id) | LookupId::Entry { id, .. } => id,
        }
    }

    fn value(&self) -> Value {
        match self {
            LookupId::Name(_) => Value::Null,
            LookupId::Entry { value: Some(v), .. } => v.clone(),
            LookupId::Entry { value: None, .. } => Value::Text(String::new()),
        }
    }

    /// Parse a name string or an `{id, value}` object.
    #[allow(clippy::result_large_err)]
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(id) => Ok(LookupId::Name(id)),
            serde_json::Value::Object(mut map) => {
                let id = match map.remove("id") {
                    Some(serde_json::Value::String(s)) => s,
                    Some(serde_json::Value::Number(n)) => n.to_string(),
                    _ => {
                        return Err(Error::statement_error(
                            StatementErrorKind::InvalidIdentifier,
                            "lookup entry needs a string or numeric 'id'",
                        ));
                    }
                };
                let value = map
                    .remove("value")
                    .map(Value::from_json)
                    .filter(|v| !v.is_null());
                Ok(LookupId::Entry { id, value })
            }
            other => Err(Error::statement_error(
                StatementErrorKind::InvalidIdentifier,
                format!("unsupported lookup entry {other}"),
            )),
        }
    }
}

impl From<&str> for LookupId {
    fn from(id: &str) -> Self {
        LookupId::Name(id.to_string())
    }
}

impl From<String> for LookupId {
    fn from(id: String) -> Self {
        LookupId::Name(id)
    }
}

/// Lookup INSERT builder: one row under `key` whose column names are ids.
#[derive(Debug)]
pub struct LookupBuilder<'a> {
    family: &'a str,
    key: Value,
    ids: &'a [LookupId],
}

impl<'a> LookupBuilder<'a> {
    /// Create a new lookup builder.
    pub fn new(family: &'a str, key: impl Into<Value>, ids: &'a [LookupId]) -> Self {
        Self {
            family,
            key: key.into(),
            ids,
        }
    }

    /// Build the lookup INSERT, or `None` when there are no ids.
    #[allow(clippy::result_large_err)]
    pub fn build(&self) -> Result<Option<StatementSpec>> {
        if self.ids.is_empty() {
            return Ok(None);
        }
        let family = quote_ident(self.family)?;
        let mut columns = vec![format!("'{ROW_KEY_COLUMN}'")];
        for id in self.ids {
            columns.push(quote_dynamic_column(id.column())?);
        }
        let mut values = Vec::with_capacity(self.ids.len() + 1);
        values.push(self.key.clone());
        values.extend(self.ids.iter().map(LookupId::value));

        let statement = format!(
            "INSERT INTO {family} ({}) VALUES ({})",
            columns.join(", "),
            placeholders(values.len())
        );
        Ok(Some(StatementSpec::new(statement, values)))
    }
}

/// Append the WHERE clause and report its equality keys.
#[allow(clippy::result_large_err)]
fn keyed_spec(
    mut statement: String,
    leading: impl Iterator<Item = Value>,
    clause: Where,
) -> Result<StatementSpec> {
    let (sql, where_values, row_keys) = clause.into_parts();
    statement.push_str(&sql);
    let mut values: Vec<Value> = leading.collect();
    values.extend(where_values);
    Ok(StatementSpec::with_key(statement, values, row_keys))
}
