//! # Girder
//!
//! Pattern-routed handler binding for HTTP servers.
//!
//! ## Overview
//!
//! Applications register callables under `[METHOD:]URI[@DOMAIN]` patterns.
//! A callable is a plain async function, a method of a shared object, or a
//! method of a controller that is instantiated fresh for every request.
//! Hooks run before (`Init`) and after (`Shut`) the bound target.
//!
//! ```text
//! ┌───────────┐   Host, path   ┌──────────┐  METHOD:URI@domain  ┌─────────────────┐
//! │ transport │───────────────▶│  Server  │────────────────────▶│ HandlerRegistry │
//! └───────────┘                │ dispatch │◀────────────────────│  HookRegistry   │
//!                              └────┬─────┘   target + hooks    └─────────────────┘
//!                                   │
//!                      Init hooks ─▶ target ─▶ Shut hooks
//! ```
//!
//! - **Core** ([`core`]): patterns, registries, method tables, request context
//! - **Server** ([`server`]): binding operations, domains, dispatch
//! - **Runtime** ([`runtime`]): [`App`](runtime::App), configuration, logging
//! - **Transport** ([`transport`]): the axum listener (`http-server` feature)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use girder::prelude::*;
//!
//! struct UserApi;
//!
//! #[object]
//! impl UserApi {
//!     pub async fn get_list(&self, _req: Arc<Request>) -> &'static str {
//!         "[]"
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = App::new();
//!     let server = app.default_server();
//!
//!     server.bind_function("GET:/ping", |_req: Arc<Request>| async { "pong" })?;
//!     server.bind_object("/user", Arc::new(UserApi))?; // GET /user/get-list/
//!
//!     app.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log format
//! - `http-server`: serve every server over HTTP from [`App::run`](runtime::App::run)

pub use girder_core as core;
pub use girder_runtime as runtime;
pub use girder_server as server;
pub use girder_transport as transport;

pub use girder_core::{controller, object};

#[doc(hidden)]
pub use girder_core::__private;

/// Common imports for applications.
///
/// ```rust,ignore
/// use girder::prelude::*;
/// ```
pub mod prelude {
    // Entry points
    pub use girder_runtime::{App, RuntimeError, RuntimeResult};
    pub use girder_server::{DispatchOutcome, Domain, Server, ServerConfig};

    // Binding
    pub use girder_core::{
        BindError, BindResult, Controller, ControllerMethods, HookPoint, IntoResponse, Method,
        ObjectMethods, Request, Response, controller, object,
    };

    pub use std::sync::Arc;
}

#[cfg(test)]
extern crate self as girder;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    struct Shop;

    #[object]
    impl Shop {
        pub fn list_items(&self, _req: Arc<Request>) -> &'static str {
            "apple,pear"
        }
    }

    #[derive(Default)]
    struct Basket {
        items: usize,
    }

    impl Controller for Basket {}

    #[controller]
    impl Basket {
        pub fn count(&mut self, req: Arc<Request>) {
            self.items += 1;
            req.write(self.items.to_string());
        }
    }

    #[tokio::test]
    async fn test_default_macro_path() {
        let server = Server::new("facade");
        server.bind_object("/shop", Arc::new(Shop)).unwrap();
        server.bind_controller::<Basket>("/basket").unwrap();

        let items = server
            .dispatch(Request::new(Method::Get, "default", "/shop/list-items"))
            .await
            .into_response()
            .unwrap();
        assert_eq!(items.body, b"apple,pear");

        for _ in 0..2 {
            let count = server
                .dispatch(Request::new(Method::Get, "default", "/basket/count"))
                .await
                .into_response()
                .unwrap();
            assert_eq!(count.body, b"1");
        }
    }
}
