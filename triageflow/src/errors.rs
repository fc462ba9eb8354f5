//! Error types for triageflow.
//!
//! The taxonomy mirrors how failures reach the user: transport failures halt
//! the flow, decode failures on a single stream line are dropped, and action
//! failures stay local to the action that produced them.

use thiserror::Error;

/// Convenience result alias.
pub type Result<T, E = TriageflowError> = std::result::Result<T, E>;

/// The main error type for triageflow operations.
#[derive(Debug, Clone, Error)]
pub enum TriageflowError {
    /// A request failed at the network level or returned a non-success status.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// A single streamed line could not be decoded.
    #[error("{0}")]
    Decode(#[from] DecodeError),

    /// A user-triggered action failed server-side.
    #[error("{0}")]
    Action(#[from] ActionError),

    /// Configuration is missing or invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Caller input was rejected before any request was made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The session was cancelled.
    #[error("Session cancelled: {0}")]
    Cancelled(String),
}

impl TriageflowError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Error raised when a backend call fails.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status, when the server answered at all.
    pub status: Option<u16>,
    /// Human readable message.
    pub message: String,
}

impl TransportError {
    /// Creates a transport error for a non-success HTTP status.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            message: format!("Server returned {status}"),
        }
    }

    /// Creates a transport error for a network-level failure.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

/// Error raised when one line of a progress stream is not a valid event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Could not decode stream line {line}: {message}")]
pub struct DecodeError {
    /// 1-based line number within the stream.
    pub line: usize,
    /// Decoder message.
    pub message: String,
}

impl DecodeError {
    /// Creates a new decode error.
    #[must_use]
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Error raised when a side-effecting user action fails.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Action failed for ticket '{ticket_id}': {message}")]
pub struct ActionError {
    /// The ticket the action targeted.
    pub ticket_id: String,
    /// Message reported by the server, or the transport failure.
    pub message: String,
}

impl ActionError {
    /// Creates a new action error.
    #[must_use]
    pub fn new(ticket_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            message: message.into(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No base URL is configured for external ticket links.
    #[error("JIRA base URL not configured")]
    MissingExternalBaseUrl,

    /// An environment variable holds a value that cannot be parsed.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name.
        name: String,
        /// Raw value.
        value: String,
    },

    /// The request timeout is not a positive number of seconds.
    #[error("Invalid request timeout: {value}")]
    InvalidTimeout {
        /// Configured value.
        value: String,
    },
}
