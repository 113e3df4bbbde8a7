//! Runtime error types.

use girder_core::BindError;
use girder_transport::TransportError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while building or running an [`App`](crate::App).
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A server refused a state transition or binding.
    #[error("Server '{server}': {source}")]
    Server {
        server: String,
        #[source]
        source: BindError,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The shutdown signal handler could not be installed.
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    pub(crate) fn server(server: &str, source: BindError) -> Self {
        Self::Server {
            server: server.to_string(),
            source,
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
