use std::time::Duration;

use thiserror::Error;

/// Result type for cqlbridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the connector
#[derive(Error, Debug)]
pub enum Error {
    /// Endpoint configuration could not be resolved. The owning route must not start.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A cluster refused to open a session for the keyspace
    #[error("Unable to connect to keyspace '{keyspace}': {source}")]
    Connection {
        /// Keyspace the session was requested for
        keyspace: String,
        /// Underlying driver failure
        #[source]
        source: DriverError,
    },

    /// The database failed to execute a statement
    #[error("Failed to execute '{cql}' against keyspace '{keyspace}': {source}")]
    Execution {
        /// Statement text that was executed
        cql: String,
        /// Keyspace the statement ran in
        keyspace: String,
        /// Underlying driver failure
        #[source]
        source: DriverError,
    },

    /// The message body could not be turned into bind values
    #[error("Invalid message body: {0}")]
    InvalidBody(String),

    /// Route wiring or lookup failed
    #[error("Route error: {0}")]
    Route(String),

    /// Errors related to JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a configuration error
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Returns true if this error was raised while resolving endpoint configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// Returns true if this error was raised by a statement execution
    pub fn is_execution(&self) -> bool {
        matches!(self, Error::Execution { .. })
    }

    /// The driver failure behind a connection or execution error
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Error::Connection { source, .. } | Error::Execution { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failures reported by the database collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// Transport-level failure talking to a node
    #[error("network failure: {0}")]
    Network(String),

    /// The statement was rejected or failed server side
    #[error("query failed: {0}")]
    Query(String),

    /// The request did not complete within the allotted time
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Credentials were rejected
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Not enough replicas were available for the requested consistency
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The keyspace does not exist
    #[error("keyspace '{0}' does not exist")]
    KeyspaceNotFound(String),
}

impl DriverError {
    /// Returns true if the failure was a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout(_))
    }
}
