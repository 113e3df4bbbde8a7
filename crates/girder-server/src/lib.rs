//! # Girder Server
//!
//! Servers own the handler and hook registries of `girder-core` and expose
//! the binding operations applications call during setup.
//!
//! - [`Server`]: lifecycle (configuring → running), config setters, binding
//!   resolvers and lookups
//! - [`Domain`]: binds the same routes under several domain aliases
//! - [`DispatchOutcome`]: the result of [`Server::dispatch`], which runs the
//!   resolved target between its Init and Shut hooks
//!
//! ## Example
//!
//! ```rust,ignore
//! use girder_server::Server;
//!
//! let server = Server::new("default");
//! server.bind_function("GET:/ping", |_req| async { "pong" })?;
//! server.bind_controller::<Cart>("/cart")?;
//! server.domain("shop.example, www.shop.example").bind_object("/api", api)?;
//! server.start()?;
//! ```

mod bind;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod server;

pub use config::ServerConfig;
pub use dispatch::DispatchOutcome;
pub use domain::Domain;
pub use server::{DEFAULT_SERVER, Server};
