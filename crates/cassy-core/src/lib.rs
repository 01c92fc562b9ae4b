//! Core types and traits for Cassy.
//!
//! This crate provides the foundational pieces shared by the statement
//! builders and the session:
//!
//! - `Value`, `Record` and `Key` for describing data and the rows it targets
//! - `StatementSpec`, the built statement handed to the session
//! - `Driver` trait for the external wire driver
//! - `ConnectionConfig` and the error type
//! - `Outcome` re-export from asupersync for cancel-correct operations
//! - `Cx` context for structured concurrency

// The Error type is intentionally large to carry full context
#![allow(clippy::result_large_err)]

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Budget, Cx, Outcome, RegionId, TaskId};

pub mod config;
pub mod driver;
pub mod error;
pub mod id;
pub mod identifiers;
pub mod key;
pub mod record;
pub mod row;
pub mod statement;
pub mod value;

pub use config::{
    ConnectionConfig, DEFAULT_BATCH_CHUNK_SIZE, DEFAULT_KEYSPACE, ErrorPolicy, InListMode,
};
pub use driver::{Driver, DriverLogLevel, QueryResult, forward_driver_log};
pub use error::{Error, Result};
pub use id::generate_id;
pub use identifiers::{
    check_identifier, is_valid_dynamic_column, is_valid_identifier, quote_dynamic_column,
    quote_ident,
};
pub use key::{Key, KeyPredicate, ROW_KEY_COLUMN, Range};
pub use record::Record;
pub use row::{ColumnInfo, Row};
pub use statement::StatementSpec;
pub use value::Value;
