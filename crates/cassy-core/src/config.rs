//! Session configuration.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{ConfigError, Error, Result};

/// Keyspace used when none is configured.
pub const DEFAULT_KEYSPACE: &str = "cassy";

/// Maximum statements per generated BATCH.
pub const DEFAULT_BATCH_CHUNK_SIZE: usize = 50;

/// What happens after a statement's error callback has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Always abort with an access error, whatever the callback did.
    #[default]
    FailFast,
    /// The callback decides whether the error was handled.
    CallbackDecides,
}

/// How multi-value key predicates reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InListMode {
    /// `IN (?, ?)` with every candidate bound as a parameter.
    #[default]
    Bind,
    /// `IN ('a', 'b')` with escaped literals and nothing bound.
    Inline,
}

/// Configuration consumed when a session is created.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Store host
    pub host: String,
    /// Store port
    pub port: u16,
    /// Keyspace; see [`keyspace`](Self::keyspace)
    #[serde(alias = "default_keyspace")]
    pub keyspace: Option<String>,
    /// Overall connection setup timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Per-statement timeout in milliseconds
    pub query_timeout_ms: u64,
    /// Pooled connections opened against the host
    pub pool_size: usize,
    /// Statements per BATCH chunk
    pub batch_chunk_size: usize,
    /// Error delivery policy
    pub error_policy: ErrorPolicy,
    /// IN-list rendering
    pub in_list: InListMode,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9160,
            keyspace: None,
            connect_timeout_ms: 10_000,
            query_timeout_ms: 30_000,
            pool_size: 10,
            batch_chunk_size: DEFAULT_BATCH_CHUNK_SIZE,
            error_policy: ErrorPolicy::default(),
            in_list: InListMode::default(),
        }
    }
}

#[derive(Deserialize)]
struct Nested {
    cassandra: ConnectionConfig,
}

impl ConnectionConfig {
    /// Create a config for the given host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Parse a JSON config, either flat or nested under `"cassandra"`.
    #[allow(clippy::result_large_err)]
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(config_error)?;
        let config = if value.get("cassandra").is_some() {
            serde_json::from_value::<Nested>(value)
                .map_err(config_error)?
                .cassandra
        } else {
            serde_json::from_value(value).map_err(config_error)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no session can run with.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        let problem = if self.host.is_empty() {
            Some("host must not be empty")
        } else if self.pool_size == 0 {
            Some("pool_size must be at least 1")
        } else if self.batch_chunk_size == 0 {
            Some("batch_chunk_size must be at least 1")
        } else {
            None
        };
        match problem {
            Some(message) => Err(Error::Config(ConfigError {
                message: message.to_string(),
                source: None,
            })),
            None => Ok(()),
        }
    }

    /// The configured keyspace, or [`DEFAULT_KEYSPACE`].
    pub fn keyspace(&self) -> &str {
        self.keyspace.as_deref().unwrap_or(DEFAULT_KEYSPACE)
    }

    /// One `host:port` entry per pooled connection.
    pub fn hosts(&self) -> Vec<String> {
        vec![format!("{}:{}", self.host, self.port); self.pool_size]
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Set the keyspace.
    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Set the query timeout.
    pub fn query_timeout_ms(mut self, ms: u64) -> Self {
        self.query_timeout_ms = ms;
        self
    }

    /// Set the number of pooled connections.
    pub fn pool_size(mut self, n: usize) -> Self {
        self.pool_size = n;
        self
    }

    /// Set the batch chunk size.
    pub fn batch_chunk_size(mut self, n: usize) -> Self {
        self.batch_chunk_size = n;
        self
    }

    /// Set the error delivery policy.
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Set the IN-list rendering.
    pub fn in_list(mut self, mode: InListMode) -> Self {
        self.in_list = mode;
        self
    }
}

fn config_error(err: serde_json::Error) -> Error {
    Error::Config(ConfigError {
        message: format!("invalid configuration: {err}"),
        source: Some(Box::new(err)),
    })
}
