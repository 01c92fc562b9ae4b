//! Identifier allow-listing and quoting.
//!
//! Column family and column names are written directly into statement
//! text, so they are checked against a strict allow-list first: an ASCII
//! letter or underscore followed by ASCII letters, digits or underscores.
//! Anything else is rejected rather than escaped.
//!
//! Lookup families use row ids (UUIDs, numeric ids) as column names, so
//! those get a second, slightly wider allow-list that also admits leading
//! digits and hyphens.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Error, Result, StatementErrorKind};

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";
const DYNAMIC_COLUMN_PATTERN: &str = r"^[A-Za-z0-9_][A-Za-z0-9_\-]*$";

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(
                pattern = pattern,
                error = %e,
                "Identifier pattern failed to compile, rejecting all names"
            );
            None
        }
    }
}

fn identifier_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| compile(IDENTIFIER_PATTERN)).as_ref()
}

fn dynamic_column_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| compile(DYNAMIC_COLUMN_PATTERN))
        .as_ref()
}

/// Check whether `name` is an allowed identifier.
///
/// # Examples
///
/// ```
/// use cassy_core::is_valid_identifier;
///
/// assert!(is_valid_identifier("users"));
/// assert!(is_valid_identifier("_by_date2"));
/// assert!(!is_valid_identifier("2fast"));
/// assert!(!is_valid_identifier("users'; DROP"));
/// ```
#[inline]
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_pattern().is_some_and(|regex| regex.is_match(name))
}

/// Return `name` unchanged if it is an allowed identifier.
#[allow(clippy::result_large_err)]
pub fn check_identifier(name: &str) -> Result<&str> {
    if is_valid_identifier(name) {
        Ok(name)
    } else {
        Err(Error::statement_error(
            StatementErrorKind::InvalidIdentifier,
            format!("invalid identifier '{name}'"),
        ))
    }
}

/// Check whether `name` may be used as a lookup column name.
#[inline]
pub fn is_valid_dynamic_column(name: &str) -> bool {
    dynamic_column_pattern().is_some_and(|regex| regex.is_match(name))
}

/// Check and wrap a lookup column name (a row id) in single quotes.
#[allow(clippy::result_large_err)]
pub fn quote_dynamic_column(name: &str) -> Result<String> {
    if is_valid_dynamic_column(name) {
        Ok(format!("'{name}'"))
    } else {
        Err(Error::statement_error(
            StatementErrorKind::InvalidIdentifier,
            format!("invalid lookup column '{name}'"),
        ))
    }
}

/// Check and wrap an identifier in single quotes.
///
/// # Examples
///
/// ```
/// use cassy_core::quote_ident;
///
/// assert_eq!(quote_ident("users").unwrap(), "'users'");
/// assert!(quote_ident("a b").is_err());
/// ```
#[allow(clippy::result_large_err)]
pub fn quote_ident(name: &str) -> Result<String> {
    check_identifier(name).map(|name| format!("'{name}'"))
}
