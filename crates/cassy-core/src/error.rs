//! Error types for Cassy operations.

use std::fmt;

/// The primary error type for all Cassy operations.
#[derive(Debug)]
pub enum Error {
    /// Connection-related errors (connect, pool liveness)
    Connection(ConnectionError),
    /// Errors raised by the driver while executing a statement
    Query(QueryError),
    /// Type conversion errors
    Type(TypeError),
    /// A statement could not be built from the given input
    Statement(StatementError),
    /// Configuration errors
    Config(ConfigError),
    /// Execution of a statement sequence was aborted by a driver failure
    Access(AccessError),
    /// I/O errors
    Io(std::io::Error),
    /// Operation timed out
    Timeout,
    /// Operation was cancelled via asupersync
    Cancelled,
    /// Serialization/deserialization errors
    Serde(String),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to establish connection
    Connect,
    /// Connection lost during operation
    Disconnected,
    /// Connection refused
    Refused,
    /// Connect did not finish within the configured timeout
    Timeout,
}

/// An error reported by the driver for one statement.
#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    /// The statement text that failed
    pub statement: Option<String>,
    pub message: String,
    /// Driver-supplied metadata about the failure, if any
    pub metadata: Option<serde_json::Value>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Statement text rejected by the store
    Syntax,
    /// Column family or column not found
    NotFound,
    /// Per-query timeout elapsed
    Timeout,
    /// Not enough replicas for the requested consistency
    Unavailable,
    /// Other store error
    Database,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug)]
pub struct StatementError {
    pub kind: StatementErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementErrorKind {
    /// Family or column name outside the identifier allow-list
    InvalidIdentifier,
    /// A key predicate that cannot be expressed (e.g. empty IN-list)
    InvalidKey,
    /// SET or column list with no entries
    Empty,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// Raised when a driver failure aborts a statement sequence.
///
/// Carries the logged message (statement id, driver error, metadata) and the
/// underlying driver error as its source.
#[derive(Debug)]
pub struct AccessError {
    pub message: String,
    /// Zero-based position of the failing statement in its sequence
    pub position: usize,
    pub source: Option<Box<Error>>,
}

impl Error {
    /// Is this a connection error that likely requires reconnection?
    pub fn is_connection_error(&self) -> bool {
        match self {
            Error::Connection(c) => matches!(
                c.kind,
                ConnectionErrorKind::Connect
                    | ConnectionErrorKind::Disconnected
                    | ConnectionErrorKind::Refused
            ),
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// Is this the domain access error raised by a failed execution?
    pub fn is_access_error(&self) -> bool {
        matches!(self, Error::Access(_))
    }

    /// Get the statement text that caused this error, if available.
    pub fn statement(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.statement.as_deref(),
            Error::Access(a) => a.source.as_deref().and_then(Error::statement),
            _ => None,
        }
    }

    /// Shorthand for building a [`StatementError`].
    pub fn statement_error(kind: StatementErrorKind, message: impl Into<String>) -> Self {
        Error::Statement(StatementError {
            kind,
            message: message.into(),
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => write!(f, "Query error: {}", e.message),
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Statement(e) => write!(f, "Statement error: {}", e.message),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Access(e) => write!(f, "Database access error: {}", e.message),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Timeout => write!(f, "Operation timed out"),
            Error::Cancelled => write!(f, "Operation cancelled"),
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Access(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for StatementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<StatementError> for Error {
    fn from(err: StatementError) -> Self {
        Error::Statement(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<AccessError> for Error {
    fn from(err: AccessError) -> Self {
        Error::Access(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Result type alias for Cassy operations.
pub type Result<T> = std::result::Result<T, Error>;
