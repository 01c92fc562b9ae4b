//! Cassy - statement building and execution for a CQL-style wide-column store.
//!
//! Cassy provides:
//!
//! - Statement builders for INSERT, UPDATE, counter UPDATE, DELETE, SELECT
//!   and lookup inserts, with one shared set of WHERE rules
//! - BATCH assembly in bounded chunks
//! - A [`Session`] that connects on first use, runs statements strictly in
//!   order and fans results out to per-statement callbacks
//! - Row existence checks
//!
//! The wire driver itself (pooling, host selection, framing) is supplied by
//! the caller through the [`Driver`] trait.
//!
//! # Quick Start
//!
//! ```ignore
//! use cassy::prelude::*;
//!
//! async fn store_user(cx: &Cx, session: &Session<impl Driver>) -> Outcome<Execution, Error> {
//!     let statements = session.statements();
//!     let data = Record::new().with("name", "Ann").with("email", "ann@example.com");
//!     let specs = vec![
//!         statements.insert_with_key("users", &data, |_| Value::from("ann"))?,
//!         statements.lookup("users_by_email", "ann@example.com", &[LookupId::from("ann")])?
//!             .expect("one id"),
//!     ];
//!
//!     session
//!         .execute(
//!             cx,
//!             session.batch(specs),
//!             Callbacks::on_last(|response| println!("stored {:?}", response.key())),
//!             Callbacks::None,
//!         )
//!         .await
//! }
//! ```
//!
//! # Features
//!
//! - **Structured concurrency**: Built on asupersync for cancel-correct operations
//! - **Allow-listed identifiers**: family and column names never carry quotes or
//!   statement fragments into statement text
//! - **Configurable failure delivery**: fail fast, or let the error callback
//!   decide

// The Error type is intentionally large to carry full context
#![allow(clippy::result_large_err)]

// Re-export all public types from sub-crates
pub use cassy_core::{
    // asupersync re-exports
    Budget,
    ColumnInfo,
    // Configuration
    ConnectionConfig,
    Cx,
    DEFAULT_BATCH_CHUNK_SIZE,
    DEFAULT_KEYSPACE,
    // Driver seam
    Driver,
    DriverLogLevel,
    Error,
    ErrorPolicy,
    InListMode,
    // Data model
    Key,
    KeyPredicate,
    Outcome,
    QueryResult,
    ROW_KEY_COLUMN,
    Range,
    Record,
    RegionId,
    Result,
    Row,
    StatementSpec,
    TaskId,
    Value,
    forward_driver_log,
    generate_id,
};

pub use cassy_query::{
    BatchAssembler, CounterOp, CounterUpdate, CounterUpdateBuilder, DeleteBuilder, InsertBuilder,
    LookupBuilder, LookupId, SelectBuilder, StatementBuilder, UpdateBuilder, Where, build_batch,
    build_counter_update, build_delete, build_insert, build_lookup, build_select, build_update,
};

pub use cassy_pool::{ConnectionState, Pool, PoolStats};

pub mod callback;
pub mod exists;
pub mod session;

pub use callback::{Callbacks, ErrorAction, ErrorFn, Execution, Response, SuccessFn};
pub use exists::Existence;
pub use session::Session;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use cassy::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Callbacks, ConnectionConfig, CounterUpdate, Cx, Driver, Error, ErrorAction, ErrorPolicy,
        Execution, Existence, InListMode, Key, LookupId, Outcome, Range, Record, Response, Row,
        Session, StatementBuilder, StatementSpec, Value, build_batch,
    };
}
