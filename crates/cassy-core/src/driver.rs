//! The wire driver seam.
//!
//! This module defines what Cassy consumes from the external driver:
//!
//! - [`Driver`] - connect, execute one statement, report pool liveness
//! - [`QueryResult`] - rows plus driver metadata for one statement
//! - [`DriverLogLevel`] / [`forward_driver_log`] - driver log events routed into `tracing`
//!
//! Pooling, host selection, reconnection, framing and retries all live behind
//! this trait. Timeouts from [`ConnectionConfig`] are handed to the driver on
//! connect and applied by it to every statement.

use crate::config::ConnectionConfig;
use crate::error::Error;
use crate::row::Row;
use crate::value::Value;
use asupersync::{Cx, Outcome};
use std::future::Future;

/// Everything the driver returns for one successful statement.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Result rows (empty for mutations)
    pub rows: Vec<Row>,
    /// Driver-specific metadata, included in failure logs
    pub metadata: Option<serde_json::Value>,
}

impl QueryResult {
    /// A result carrying only rows.
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            metadata: None,
        }
    }

    /// An empty result, as returned for mutations.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A pooled wire-level connection to the store.
///
/// All operations are async and take a `Cx` context for cancellation.
/// Implementations must be `Send + Sync` so one driver can back a shared
/// session.
///
/// # Example
///
/// ```rust,ignore
/// driver.connect(&cx, &config).await?;
/// let result = driver
///     .execute(&cx, "SELECT * FROM 'users' WHERE KEY = ?", &[Value::from("u1")])
///     .await?;
/// ```
pub trait Driver: Send + Sync {
    /// Open the pool's connections using the given configuration.
    fn connect(
        &self,
        cx: &Cx,
        config: &ConnectionConfig,
    ) -> impl Future<Output = Outcome<(), Error>> + Send;

    /// Execute one statement with positional parameters.
    fn execute(
        &self,
        cx: &Cx,
        statement: &str,
        values: &[Value],
    ) -> impl Future<Output = Outcome<QueryResult, Error>> + Send;

    /// Whether at least one pooled connection is healthy and connected.
    fn is_live(&self) -> bool;
}

/// Severity attached to a driver log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverLogLevel {
    Trace,
    Timing,
    Debug,
    Info,
    Warn,
    Error,
}

impl DriverLogLevel {
    /// Parse a driver-supplied level name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "timing" => Some(Self::Timing),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// The level the event is recorded at.
    ///
    /// Driver chatter (trace, timing, info, warn) is demoted to debug;
    /// only driver errors surface as errors.
    pub const fn effective(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            _ => tracing::Level::DEBUG,
        }
    }
}

/// Record a driver log event.
pub fn forward_driver_log(level: DriverLogLevel, message: &str) {
    if level.effective() == tracing::Level::ERROR {
        tracing::error!(target: "cassy::driver", driver_level = ?level, "{message}");
    } else {
        tracing::debug!(target: "cassy::driver", driver_level = ?level, "{message}");
    }
}
