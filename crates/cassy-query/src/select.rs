//! SELECT statement builder.

use crate::clause::Where;
use cassy_core::{InListMode, Key, Result, StatementSpec, Value, quote_ident};

/// SELECT statement builder.
///
/// Requested column names are bound as placeholders rather than written
/// into the text. A SELECT reports no row key.
#[derive(Debug)]
pub struct SelectBuilder<'a> {
    family: &'a str,
    columns: Option<Vec<&'a str>>,
    key: Option<&'a Key>,
    in_list: InListMode,
}

impl<'a> SelectBuilder<'a> {
    /// Create a new `SELECT *` builder for `family`.
    pub fn new(family: &'a str) -> Self {
        Self {
            family,
            columns: None,
            key: None,
            in_list: InListMode::default(),
        }
    }

    /// Select only these columns.
    pub fn columns(mut self, columns: &[&'a str]) -> Self {
        self.columns = Some(columns.to_vec());
        self
    }

    /// Restrict to the rows matched by `key`.
    pub fn filter(mut self, key: &'a Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Choose how multi-candidate key columns are rendered.
    pub fn in_list(mut self, mode: InListMode) -> Self {
        self.in_list = mode;
        self
    }

    /// Build the SELECT statement.
    #[allow(clippy::result_large_err)]
    pub fn build(&self) -> Result<StatementSpec> {
        let family = quote_ident(self.family)?;
        let (projection, mut values) = match &self.columns {
            Some(columns) => (
                vec!["?"; columns.len()].join(", "),
                columns.iter().map(|c| Value::from(*c)).collect(),
            ),
            None => ("*".to_string(), Vec::new()),
        };
        let clause = Where::from_optional(self.key, self.in_list)?;
        let (sql, where_values, _) = clause.into_parts();
        values.extend(where_values);
        Ok(StatementSpec::new(
            format!("SELECT {projection} FROM {family}{sql}"),
            values,
        ))
    }
}
