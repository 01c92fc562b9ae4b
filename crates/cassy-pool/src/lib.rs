//! Connection gate for Cassy using asupersync.
//!
//! The driver owns the pooled connections themselves; this crate decides
//! *when* to connect. A [`Pool`] tracks a [`ConnectionState`] and serializes
//! connection attempts behind an asupersync mutex, so concurrent callers
//! arriving while a connect is in flight wait for it instead of polling, and
//! only one connect attempt is ever in flight.

// The Error type is intentionally large to carry full context
#![allow(clippy::result_large_err)]

use asupersync::sync::Mutex;
use cassy_core::error::{ConnectionError, ConnectionErrorKind};
use cassy_core::{ConnectionConfig, Cx, Driver, Error, Outcome};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Where the pool is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connect attempt has succeeded yet (or the last one failed)
    Disconnected,
    /// A connect attempt is in flight
    Connecting,
    /// The driver reported a successful connect
    Connected,
}

impl ConnectionState {
    const fn to_u8(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
        }
    }

    const fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Pool statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    /// Current connection state
    pub state: ConnectionState,
    /// Number of `Driver::connect` calls made
    pub connect_attempts: usize,
    /// Number of those calls that failed
    pub failed_connects: usize,
    /// Connections the driver is asked to open
    pub pool_size: usize,
}

/// A driver plus the state machine that gates statement execution on it.
pub struct Pool<D: Driver> {
    driver: D,
    config: ConnectionConfig,
    state: AtomicU8,
    connect_lock: Mutex<()>,
    connect_attempts: AtomicUsize,
    failed_connects: AtomicUsize,
}

impl<D: Driver> std::fmt::Debug for Pool<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("state", &self.state())
            .field("hosts", &self.config.hosts())
            .field("keyspace", &self.config.keyspace())
            .finish_non_exhaustive()
    }
}

impl<D: Driver> Pool<D> {
    /// Create a disconnected pool. No connection is opened until the first
    /// [`ensure_connected`](Self::ensure_connected).
    pub fn new(driver: D, config: ConnectionConfig) -> Self {
        Self {
            driver,
            config,
            state: AtomicU8::new(ConnectionState::Disconnected.to_u8()),
            connect_lock: Mutex::new(()),
            connect_attempts: AtomicUsize::new(0),
            failed_connects: AtomicUsize::new(0),
        }
    }

    /// Get the pool configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Get the underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }

    /// Whether the driver reports a healthy connection.
    pub fn is_live(&self) -> bool {
        self.driver.is_live()
    }

    /// Get the current pool statistics.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            state: self.state(),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            failed_connects: self.failed_connects.load(Ordering::Relaxed),
            pool_size: self.config.pool_size,
        }
    }

    /// Make sure the driver is connected, connecting if necessary.
    ///
    /// Returns immediately when the driver is live. Otherwise waits for the
    /// connect lock; whoever holds it first performs the single connect
    /// attempt and later waiters see its result. A failed attempt leaves the
    /// pool `Disconnected` so a later call may try again.
    pub async fn ensure_connected(&self, cx: &Cx) -> Outcome<(), Error> {
        if self.driver.is_live() {
            self.set_state(ConnectionState::Connected);
            return Outcome::Ok(());
        }

        let Ok(_guard) = self.connect_lock.lock(cx).await else {
            return Outcome::Err(connection_error(
                ConnectionErrorKind::Connect,
                "Failed to acquire connect lock",
            ));
        };

        // Someone else may have connected while we waited.
        if self.driver.is_live() {
            self.set_state(ConnectionState::Connected);
            return Outcome::Ok(());
        }

        self.set_state(ConnectionState::Connecting);
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            hosts = ?self.config.hosts(),
            keyspace = self.config.keyspace(),
            "Connecting"
        );

        match self.driver.connect(cx, &self.config).await {
            Outcome::Ok(()) => {
                self.set_state(ConnectionState::Connected);
                tracing::debug!("Connected. Ready to execute statements.");
                Outcome::Ok(())
            }
            Outcome::Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                self.failed_connects.fetch_add(1, Ordering::Relaxed);
                tracing::error!(error = %e, "Connect failed");
                Outcome::Err(match e {
                    Error::Connection(_) => e,
                    other => Error::Connection(ConnectionError {
                        kind: ConnectionErrorKind::Connect,
                        message: other.to_string(),
                        source: Some(Box::new(other)),
                    }),
                })
            }
            Outcome::Cancelled(r) => {
                self.set_state(ConnectionState::Disconnected);
                Outcome::Cancelled(r)
            }
            Outcome::Panicked(p) => {
                self.set_state(ConnectionState::Disconnected);
                Outcome::Panicked(p)
            }
        }
    }
}

fn connection_error(kind: ConnectionErrorKind, message: &str) -> Error {
    Error::Connection(ConnectionError {
        kind,
        message: message.to_string(),
        source: None,
    })
}
