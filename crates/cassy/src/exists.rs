//! Row existence checks.

use cassy_core::{Cx, Driver, Error, Key, Outcome, Record, Row};

use crate::callback::Response;
use crate::session::Session;

/// Result of [`Session::check_if_exists`].
#[derive(Debug, Clone, PartialEq)]
pub struct Existence {
    /// Whether the row has live columns.
    pub exists: bool,
    /// Column hash of the first returned row; empty when no row came back.
    pub data: Record,
}

impl Existence {
    /// Classify a SELECT result.
    ///
    /// The store answers a SELECT on a deleted or never-written key with
    /// either no rows or a single row with no columns; both mean the row
    /// does not exist.
    pub fn from_rows(rows: &[Row]) -> Self {
        let data = rows.first().map(Row::col_hash).unwrap_or_default();
        let exists = match rows {
            [] => false,
            [_] => !data.is_empty(),
            _ => true,
        };
        Self { exists, data }
    }
}

impl<D: Driver> Session<D> {
    /// Check whether the row at `key` in `family` exists.
    #[tracing::instrument(level = "debug", skip(self, cx, key))]
    pub async fn check_if_exists(
        &self,
        cx: &Cx,
        family: &str,
        key: &Key,
    ) -> Outcome<Existence, Error> {
        let spec = match self.statements().select(family, Some(key), None) {
            Ok(spec) => spec,
            Err(e) => return Outcome::Err(e),
        };
        self.query(cx, &spec).await.map(|response| match response {
            Response::Rows(rows) => Existence::from_rows(&rows),
            _ => Existence::from_rows(&[]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassy_core::Value;

    #[test]
    fn test_no_rows() {
        let existence = Existence::from_rows(&[]);
        assert!(!existence.exists);
        assert!(existence.data.is_empty());
    }

    #[test]
    fn test_single_empty_row_is_a_tombstone() {
        let existence = Existence::from_rows(&[Row::empty("u1")]);
        assert!(!existence.exists);
        assert!(existence.data.is_empty());
    }

    #[test]
    fn test_row_with_columns_exists() {
        let row = Row::new(vec!["name".to_string()], vec![Value::from("Ann")]);
        let existence = Existence::from_rows(&[row]);
        assert!(existence.exists);
        assert_eq!(existence.data.get("name"), Some(&Value::from("Ann")));
    }

    #[test]
    fn test_several_rows_exist_even_if_first_is_empty() {
        let existence = Existence::from_rows(&[Row::empty("a"), Row::empty("b")]);
        assert!(existence.exists);
        assert!(existence.data.is_empty());
    }
}
