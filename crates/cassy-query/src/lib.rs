//! Statement construction for Cassy.
//!
//! `cassy-query` is the **statement construction layer**. It turns records,
//! counter adjustments and [`Key`] descriptions into CQL-like statement text
//! plus positional values, wrapped as [`StatementSpec`].
//!
//! # Role In The Architecture
//!
//! - **Builders**: INSERT, UPDATE, counter UPDATE, DELETE, SELECT and lookup
//!   inserts, each with a `build()` returning a `StatementSpec`.
//! - **WHERE derivation**: one shared implementation of the equality, IN-list
//!   and range rules ([`Where`]).
//! - **Batching**: [`BatchAssembler`] wraps statements into
//!   `BEGIN BATCH ... APPLY BATCH;` chunks.
//!
//! Statements execute through the `Session` in the `cassy` facade crate.

// The Error type is intentionally large to carry full context
#![allow(clippy::result_large_err)]

pub mod batch;
pub mod builder;
pub mod clause;
pub mod select;

pub use batch::{BatchAssembler, build_batch};
pub use builder::{
    CounterOp, CounterUpdate, CounterUpdateBuilder, DeleteBuilder, ID_COLUMN, InsertBuilder,
    LookupBuilder, LookupId, UpdateBuilder,
};
pub use clause::Where;
pub use select::SelectBuilder;

use cassy_core::{InListMode, Key, Record, Result, StatementSpec, Value};

/// Entry point for building statements with a fixed IN-list rendering.
///
/// # Example
///
/// ```ignore
/// let statements = StatementBuilder::new(InListMode::Bind);
/// let spec = statements.update("users", &data, Some(&Key::row("user2")))?;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementBuilder {
    in_list: InListMode,
}

impl StatementBuilder {
    /// Create a builder rendering IN-lists with `in_list`.
    pub fn new(in_list: InListMode) -> Self {
        Self { in_list }
    }

    /// The IN-list rendering in use.
    pub fn in_list_mode(&self) -> InListMode {
        self.in_list
    }

    /// INSERT `data` with the default key (`id`, else a generated id).
    pub fn insert(&self, family: &str, data: &Record) -> Result<StatementSpec> {
        InsertBuilder::new(family, data).build()
    }

    /// INSERT `data` with a key derived by `make_key`.
    pub fn insert_with_key<F>(&self, family: &str, data: &Record, make_key: F) -> Result<StatementSpec>
    where
        F: FnOnce(&Record) -> Value,
    {
        InsertBuilder::new(family, data).key_with(make_key).build()
    }

    /// UPDATE the rows at `key` with `data`.
    pub fn update(&self, family: &str, data: &Record, key: Option<&Key>) -> Result<StatementSpec> {
        let mut builder = UpdateBuilder::new(family, data).in_list(self.in_list);
        if let Some(key) = key {
            builder = builder.filter(key);
        }
        builder.build()
    }

    /// Adjust counters at `key`.
    pub fn counter_update(
        &self,
        family: &str,
        update: &CounterUpdate,
        key: Option<&Key>,
    ) -> Result<StatementSpec> {
        let mut builder = CounterUpdateBuilder::new(family, update).in_list(self.in_list);
        if let Some(key) = key {
            builder = builder.filter(key);
        }
        builder.build()
    }

    /// DELETE `columns` (or whole rows when empty) at `key`.
    pub fn delete(&self, family: &str, key: Option<&Key>, columns: &[&str]) -> Result<StatementSpec> {
        let mut builder = DeleteBuilder::new(family)
            .columns(columns)
            .in_list(self.in_list);
        if let Some(key) = key {
            builder = builder.filter(key);
        }
        builder.build()
    }

    /// SELECT `columns` (or `*`) at `key`.
    pub fn select(
        &self,
        family: &str,
        key: Option<&Key>,
        columns: Option<&[&str]>,
    ) -> Result<StatementSpec> {
        let mut builder = SelectBuilder::new(family).in_list(self.in_list);
        if let Some(columns) = columns {
            builder = builder.columns(columns);
        }
        if let Some(key) = key {
            builder = builder.filter(key);
        }
        builder.build()
    }

    /// Lookup INSERT under `key`, or `None` when `ids` is empty.
    pub fn lookup(
        &self,
        family: &str,
        key: impl Into<Value>,
        ids: &[LookupId],
    ) -> Result<Option<StatementSpec>> {
        LookupBuilder::new(family, key, ids).build()
    }
}

/// [`StatementBuilder::insert`] with default settings.
pub fn build_insert(family: &str, data: &Record) -> Result<StatementSpec> {
    StatementBuilder::default().insert(family, data)
}

/// [`StatementBuilder::update`] with default settings.
pub fn build_update(family: &str, data: &Record, key: Option<&Key>) -> Result<StatementSpec> {
    StatementBuilder::default().update(family, data, key)
}

/// [`StatementBuilder::counter_update`] with default settings.
pub fn build_counter_update(
    family: &str,
    update: &CounterUpdate,
    key: Option<&Key>,
) -> Result<StatementSpec> {
    StatementBuilder::default().counter_update(family, update, key)
}

/// [`StatementBuilder::delete`] with default settings.
pub fn build_delete(family: &str, key: Option<&Key>, columns: &[&str]) -> Result<StatementSpec> {
    StatementBuilder::default().delete(family, key, columns)
}

/// [`StatementBuilder::select`] with default settings.
pub fn build_select(family: &str, key: Option<&Key>, columns: Option<&[&str]>) -> Result<StatementSpec> {
    StatementBuilder::default().select(family, key, columns)
}

/// [`StatementBuilder::lookup`] with default settings.
pub fn build_lookup(
    family: &str,
    key: impl Into<Value>,
    ids: &[LookupId],
) -> Result<Option<StatementSpec>> {
    StatementBuilder::default().lookup(family, key, ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_applies_in_list_mode() {
        let key = Key::columns().any_of("KEY", ["a", "b"]);
        let inline = StatementBuilder::new(InListMode::Inline)
            .select("users", Some(&key), None)
            .unwrap();
        assert_eq!(inline.statement(), "SELECT * FROM 'users' WHERE KEY IN ('a', 'b')");

        let bound = build_select("users", Some(&key), Some(&["name"])).unwrap();
        assert_eq!(bound.statement(), "SELECT ? FROM 'users' WHERE KEY IN (?, ?)");
        assert_eq!(bound.values().len(), 3);
    }

    #[test]
    fn test_insert_placeholder_property() {
        for n in 0..5 {
            let data: Record = (0..n).map(|i| (format!("c{i}"), i64::from(i))).collect();
            let spec = StatementBuilder::default()
                .insert_with_key("t", &data, |_| Value::from("k"))
                .unwrap();
            assert_eq!(spec.values()[0], Value::from("k"));
            assert_eq!(spec.placeholder_count(), data.len() + 1);
            assert_eq!(spec.values().len(), data.len() + 1);
        }
    }

    #[test]
    fn test_free_functions() {
        let data = Record::new().with("name", "Ann");
        let key = Key::row("u1");
        assert!(build_insert("users", &data).is_ok());
        assert!(build_update("users", &data, Some(&key)).is_ok());
        assert!(build_delete("users", Some(&key), &[]).is_ok());
        let update = CounterUpdate::new().increment("n", 1_i64);
        assert!(build_counter_update("stats", &update, Some(&key)).is_ok());
        assert!(build_lookup("idx", "k", &[]).unwrap().is_none());
    }
}
