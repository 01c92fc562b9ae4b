//! Built statements ready for execution.

use crate::value::Value;

/// Statement text plus its ordered parameter list.
///
/// Produced by the statement builders and consumed by the session. The
/// `key` reports which row(s) a mutation addressed; SELECT and lookup
/// statements carry none.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementSpec {
    statement: String,
    values: Vec<Value>,
    key: Option<Vec<String>>,
}

impl StatementSpec {
    /// Create a statement without a row key.
    pub fn new(statement: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            statement: statement.into(),
            values,
            key: None,
        }
    }

    /// Create a statement reporting the given row key(s).
    pub fn with_key(statement: impl Into<String>, values: Vec<Value>, key: Vec<String>) -> Self {
        Self {
            statement: statement.into(),
            values,
            key: Some(key),
        }
    }

    /// The statement text.
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Bound values in placeholder order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Row key(s) addressed by this statement, if reported.
    pub fn key(&self) -> Option<&[String]> {
        self.key.as_deref()
    }

    /// Number of `?` placeholders outside quoted literals.
    pub fn placeholder_count(&self) -> usize {
        placeholder_positions(&self.statement).len()
    }

    /// Human-readable form with each placeholder replaced, in order, by
    /// its bound value in double quotes.
    ///
    /// Used for logging only; never send the result to the store.
    pub fn debug_line(&self) -> String {
        let positions = placeholder_positions(&self.statement);
        let mut line = String::with_capacity(self.statement.len());
        let mut last = 0;
        for (pos, value) in positions.iter().zip(self.values.iter()) {
            line.push_str(&self.statement[last..*pos]);
            line.push('"');
            line.push_str(&value.render());
            line.push('"');
            last = pos + 1;
        }
        line.push_str(&self.statement[last..]);
        line
    }

    /// Split into parts.
    pub fn into_parts(self) -> (String, Vec<Value>, Option<Vec<String>>) {
        (self.statement, self.values, self.key)
    }
}

/// Byte offsets of `?` placeholders, skipping single-quoted literals.
fn placeholder_positions(statement: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut in_literal = false;
    for (i, c) in statement.char_indices() {
        match c {
            '\'' => in_literal = !in_literal,
            '?' if !in_literal => positions.push(i),
            _ => {}
        }
    }
    positions
}
