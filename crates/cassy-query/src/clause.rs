//! WHERE clause derivation.
//!
//! Every statement that addresses existing rows (update, counter update,
//! delete, select) turns its [`Key`] into predicates here, so the
//! equality/IN/range rules exist exactly once.

use cassy_core::error::StatementErrorKind;
use cassy_core::{Error, InListMode, Key, KeyPredicate, Result, Value, check_identifier};

/// Predicates, bound values and reported row keys derived from a [`Key`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Where {
    predicates: Vec<String>,
    values: Vec<Value>,
    row_keys: Vec<String>,
}

impl Where {
    /// No restriction at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Derive the clause for `key`.
    ///
    /// For each column, in order:
    /// - `Eq(v)` → `col = ?`, binds `v`, reports `v` as a row key
    /// - `In(vs)` → `col IN (?, ...)` binding every candidate, or inlined
    ///   escaped literals in [`InListMode::Inline`]
    /// - `Range` → `col > ?` and/or `col < ?`, binding only present bounds
    ///
    /// A one-member `In` is treated as `Eq`. A column may appear only once.
    pub fn from_key(key: &Key, in_list: InListMode) -> Result<Self> {
        let mut clause = Self::none();
        let mut seen: Vec<String> = Vec::new();
        for (column, predicate) in key.predicates() {
            let column = check_identifier(&column)?;
            if seen.iter().any(|c| *c == column) {
                return Err(Error::statement_error(
                    StatementErrorKind::InvalidKey,
                    format!("key column '{column}' has more than one predicate"),
                ));
            }
            seen.push(column.to_string());
            match predicate {
                KeyPredicate::Eq(value) => clause.push_eq(&column, value),
                KeyPredicate::In(mut candidates) if candidates.len() == 1 => {
                    clause.push_eq(&column, candidates.remove(0));
                }
                KeyPredicate::In(candidates) => {
                    if candidates.is_empty() {
                        return Err(Error::statement_error(
                            StatementErrorKind::InvalidKey,
                            format!("key column '{column}' has an empty candidate list"),
                        ));
                    }
                    let members: Vec<String> = match in_list {
                        InListMode::Bind => candidates.iter().map(|_| "?".to_string()).collect(),
                        InListMode::Inline => candidates.iter().map(Value::to_literal).collect(),
                    };
                    clause
                        .predicates
                        .push(format!("{column} IN ({})", members.join(", ")));
                    if in_list == InListMode::Bind {
                        clause.values.extend(candidates);
                    }
                }
                KeyPredicate::Range(range) => {
                    if let Some(lower) = range.greater_than {
                        clause.predicates.push(format!("{column} > ?"));
                        clause.values.push(lower);
                    }
                    if let Some(upper) = range.less_than {
                        clause.predicates.push(format!("{column} < ?"));
                        clause.values.push(upper);
                    }
                }
            }
        }
        Ok(clause)
    }

    fn push_eq(&mut self, column: &str, value: Value) {
        self.predicates.push(format!("{column} = ?"));
        self.row_keys.push(value.render());
        self.values.push(value);
    }

    /// Derive the clause for an optional key.
    pub fn from_optional(key: Option<&Key>, in_list: InListMode) -> Result<Self> {
        key.map_or_else(|| Ok(Self::none()), |key| Self::from_key(key, in_list))
    }

    /// Whether the clause restricts anything.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// ` WHERE a AND b`, or an empty string when there are no predicates.
    pub fn to_sql(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicates.join(" AND "))
        }
    }

    /// Values bound by the predicates, in clause order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// String forms of the equality key values.
    pub fn row_keys(&self) -> &[String] {
        &self.row_keys
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Value>, Vec<String>) {
        let sql = self.to_sql();
        (sql, self.values, self.row_keys)
    }
}
