//! Girder Runtime - composition root for Girder servers.
//!
//! This crate provides:
//! - [`App`], which owns the named servers of a process and runs them
//! - Configuration loading ([`ConfigLoader`]) and validation
//! - Logging configuration ([`LoggingBuilder`])
//!
//! # Transports
//!
//! With the `http-server` feature, [`App::run`] starts one HTTP listener per
//! server on its configured `addr`. Without it, servers are only reachable
//! through [`Server::dispatch`](girder_server::Server::dispatch).
//!
//! ```ignore
//! use girder_runtime::App;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = App::builder().profile("production").build()?;
//!
//!     app.default_server()
//!         .bind_function("GET:/ping", |_req| async { "pong" })?;
//!     app.server("admin").bind_controller::<Dashboard>("/")?;
//!
//!     // Run until Ctrl+C
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

// Re-exports
pub use app::{App, AppBuilder};
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, GirderConfig, LoggingConfig, validate_config,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for application code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
