//! Error types for handler binding.
//!
//! Every error here is returned synchronously from a bind or config call.
//! Binding is one-time setup, so nothing is retried or rolled back: entries
//! bound before the failing one stay in place.

use thiserror::Error;

/// Errors that can occur while binding handlers or changing server config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The pattern could not be parsed into a usable route.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern as supplied by the caller.
        pattern: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// The server has left the configuring state.
    #[error("server is already running, handlers and config are frozen")]
    AlreadyRunning,

    /// An explicitly requested method is not in the target's method table.
    #[error("invalid method name: {0}")]
    InvalidMethodName(String),

    /// A hook point name other than `init` or `shut`.
    #[error("unknown hook point: {0}")]
    UnknownHookPoint(String),
}

impl BindError {
    /// Creates an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason,
        }
    }
}

/// Result type for binding operations.
pub type BindResult<T> = Result<T, BindError>;
