//! Transport error types.

use thiserror::Error;

/// Errors that can occur while starting or running a listener.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {reason}")]
    Bind {
        /// The configured address.
        addr: String,
        /// Reason for failure.
        reason: String,
    },

    /// The serve loop stopped with an error.
    #[error("I/O error: {0}")]
    Io(String),

    /// The server is still configuring and cannot serve requests.
    #[error("server '{0}' has not been started")]
    NotStarted(String),

    /// No transport implementation is compiled in.
    #[error("transport '{transport}' not available, enable the `{feature}` feature")]
    NotAvailable {
        /// The transport that was requested.
        transport: &'static str,
        /// The cargo feature providing it.
        feature: &'static str,
    },
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
