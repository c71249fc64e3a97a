//! Error types for tabula.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for tabula operations.
#[derive(Error, Debug)]
pub enum TabulaError {
    /// Connection errors (open or ping failures). Terminal for the invocation.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution or cursor errors. Aborts only the current statement.
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (unknown engine, border style, mode, bad config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Result file creation or writing errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TabulaError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "IO Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Reclassifies a query failure as a connection failure, e.g. a timed-out ping.
    pub fn into_connection(self) -> Self {
        match self {
            Self::Query(msg) => Self::Connection(msg),
            other => other,
        }
    }
}

/// Result type alias using TabulaError.
pub type Result<T> = std::result::Result<T, TabulaError>;
