//! Error types for tlc-athena.
//!
//! Defines the main error enum used throughout the application.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Main error type for tlc-athena operations.
#[derive(Error, Debug)]
pub enum TlcError {
    /// Required configuration values are absent. Holds the variable names.
    #[error("Missing configuration: {}", .0.join(", "))]
    ConfigMissing(Vec<String>),

    /// Configuration is present but malformed (bad TOML, bad URL, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials were rejected by the managed service.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A table name is not part of the catalog.
    #[error("Table not found: {0}")]
    NotFound(String),

    /// The service reported that the query failed. The message is the
    /// service diagnostic, unmodified.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The execution did not reach a terminal state in time.
    #[error("Query {execution_id} did not finish within {}s", .waited.as_secs())]
    Timeout {
        execution_id: String,
        waited: Duration,
    },

    /// Transport errors and service errors that are not auth related.
    #[error("Service error: {0}")]
    Service(String),

    /// Caller supplied input that cannot be sent to the service.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error classification reported to the agent host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ConfigMissing,
    ConfigInvalid,
    AuthFailure,
    NotFound,
    QueryFailed,
    Timeout,
    ServiceUnavailable,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigMissing => "ConfigMissing",
            Self::ConfigInvalid => "ConfigInvalid",
            Self::AuthFailure => "AuthFailure",
            Self::NotFound => "NotFound",
            Self::QueryFailed => "QueryFailed",
            Self::Timeout => "Timeout",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::InvalidInput => "InvalidInput",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TlcError {
    /// Creates a missing-configuration error for a single variable.
    pub fn config_missing(var: impl Into<String>) -> Self {
        Self::ConfigMissing(vec![var.into()])
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an authentication error with the given message.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Creates a not-found error for the given table name.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Creates a query failure carrying the service diagnostic.
    pub fn query_failed(msg: impl Into<String>) -> Self {
        Self::QueryFailed(msg.into())
    }

    /// Creates a timeout error for the given execution.
    pub fn timeout(execution_id: impl Into<String>, waited: Duration) -> Self {
        Self::Timeout {
            execution_id: execution_id.into(),
            waited,
        }
    }

    /// Creates a service error with the given message.
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Creates an invalid-input error with the given message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the classification reported to the host.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigMissing(_) => ErrorKind::ConfigMissing,
            Self::Config(_) => ErrorKind::ConfigInvalid,
            Self::Auth(_) => ErrorKind::AuthFailure,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::QueryFailed(_) => ErrorKind::QueryFailed,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Service(_) => ErrorKind::ServiceUnavailable,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error detail without the category prefix.
    ///
    /// For `QueryFailed` this is the service diagnostic exactly as received.
    pub fn message(&self) -> String {
        match self {
            Self::ConfigMissing(vars) => format!("{} not set", vars.join(", ")),
            Self::Config(msg)
            | Self::Auth(msg)
            | Self::QueryFailed(msg)
            | Self::Service(msg)
            | Self::InvalidInput(msg)
            | Self::Internal(msg) => msg.clone(),
            Self::NotFound(name) => format!("unknown table '{name}'"),
            Self::Timeout { .. } => self.to_string(),
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConfigMissing(_) | Self::Config(_) => "Configuration Error",
            Self::Auth(_) => "Authentication Error",
            Self::NotFound(_) => "Catalog Error",
            Self::QueryFailed(_) | Self::Timeout { .. } => "Query Error",
            Self::Service(_) => "Service Error",
            Self::InvalidInput(_) => "Input Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using TlcError.
pub type Result<T> = std::result::Result<T, TlcError>;
