//! # Girder Core
//!
//! Handler binding and route resolution for the Girder HTTP framework.
//!
//! This crate owns everything between "the application hands us a callable"
//! and "the dispatcher asks which callable serves this request":
//!
//! - **Patterns**: `[METHOD:]URI[@DOMAIN]` registration strings ([`Pattern`])
//! - **Handler registry**: composite `METHOD:URI@domain` keys to bound targets
//!   ([`HandlerRegistry`], [`HandlerItem`])
//! - **Hook registry**: ordered Init/Shut hook lists per key ([`HookRegistry`])
//! - **Method tables**: compile-time method enumeration for objects and
//!   controllers ([`ObjectMethods`], [`ControllerMethods`])
//! - **Request context**: the per-request value every callable receives
//!   ([`Request`])
//!
//! Servers, the domain multiplexer and dispatch live in `girder-server`.
//!
//! ## Key layout
//!
//! ```text
//! pattern "post:/user@A.com"
//!     │ parse
//!     ▼
//! Pattern { method: "post", uri: "/user", domain: "A.com" }
//!     │ fold + expand `all`
//!     ▼
//! POST:/user@a.com ──▶ HandlerItem
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use girder_core::{HandlerRegistry, HandlerItem, Method, MethodFilter, into_handler};
//!
//! let registry = HandlerRegistry::new();
//! let ping = into_handler(|_req| async { "pong" });
//! registry.set("default", MethodFilter::All, "/ping", HandlerItem::Direct(ping));
//!
//! assert!(registry.get("default", Method::Get, "/ping").is_some());
//! ```

pub mod error;
pub mod handler;
pub mod hooks;
pub mod key;
pub mod method;
pub mod method_table;
pub mod naming;
pub mod pattern;
pub mod registry;
pub mod request;

pub use error::{BindError, BindResult};
pub use handler::{
    BoxFuture, DeferredMethod, Handler, HandlerFunc, HandlerItem, IntoResponse, into_handler,
};
pub use hooks::{HookKey, HookPoint, HookRegistry};
pub use key::CompositeKey;
pub use method::{Method, MethodFilter, WILDCARD_METHOD};
pub use method_table::{
    Controller, ControllerMethod, ControllerMethods, ErasedController, LIFECYCLE_METHODS,
    ObjectMethod, ObjectMethods, controller_name, is_lifecycle_method, new_controller,
};
pub use naming::{append_method_name, method_name_to_segment};
pub use pattern::{DEFAULT_DOMAIN, Pattern, parse_pattern};
pub use registry::HandlerRegistry;
pub use request::{Request, Response};

pub use girder_macros::{controller, object};

/// Re-exports used by code generated from the `object` and `controller`
/// macros. Not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use std::boxed::Box;
    pub use std::sync::Arc;

    pub use crate::handler::{BoxFuture, IntoResponse};
    pub use crate::method_table::{
        Controller, ControllerMethod, ControllerMethods, ObjectMethod, ObjectMethods,
    };
    pub use crate::request::Request;
}

/// Prelude for handler code.
pub mod prelude {
    pub use crate::{
        BindError, BindResult, Controller, ControllerMethods, HookPoint, IntoResponse, Method,
        ObjectMethods, Request, Response, controller, object,
    };
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    struct Greeter {
        greeting: &'static str,
    }

    #[object(crate = crate)]
    impl Greeter {
        pub async fn say_hello(&self, req: Arc<Request>) -> String {
            format!("{} {}", self.greeting, req.query_param("name").unwrap_or("world"))
        }

        pub fn version(&self, _req: Arc<Request>) -> &'static str {
            "1"
        }

        #[girder(name = "Ping")]
        pub fn health_check(&self, _req: Arc<Request>) -> (u16, &'static str) {
            (204, "")
        }

        #[girder(skip)]
        pub fn hidden(&self, _req: Arc<Request>) {}

        fn private_helper(&self) -> usize {
            self.greeting.len()
        }

        pub fn not_a_handler(&self) -> usize {
            self.private_helper()
        }
    }

    #[derive(Default)]
    struct Visit {
        steps: Vec<&'static str>,
    }

    impl Controller for Visit {}

    #[controller(crate = crate)]
    impl Visit {
        pub async fn index(&mut self, req: Arc<Request>) {
            self.steps.push("index");
            req.write(self.steps.join(","));
        }

        pub fn show(&self, _req: Arc<Request>) -> &'static str {
            "show"
        }
    }

    #[test]
    fn test_object_table_names() {
        let names: Vec<_> = Greeter::METHODS.iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["SayHello", "Version", "Ping"]);
        assert_eq!(Greeter { greeting: "hi" }.not_a_handler(), 2);
    }

    #[tokio::test]
    async fn test_object_table_calls_method() {
        let greeter = Arc::new(Greeter { greeting: "hello" });
        let req = Arc::new(Request::new(Method::Get, "default", "/x").with_query("name=ann"));
        let method = ObjectMethod::find(Greeter::METHODS, "sayhello").unwrap();
        (method.call)(greeter, Arc::clone(&req)).await;
        assert_eq!(req.take_response().body, b"hello ann");
    }

    #[tokio::test]
    async fn test_renamed_method_keeps_return_handling() {
        let greeter = Arc::new(Greeter { greeting: "hello" });
        let req = Arc::new(Request::new(Method::Get, "default", "/x"));
        let method = ObjectMethod::find(Greeter::METHODS, "Ping").unwrap();
        (method.call)(greeter, Arc::clone(&req)).await;
        assert_eq!(req.status(), 204);
    }

    #[tokio::test]
    async fn test_controller_table_calls_method() {
        let names: Vec<_> = Visit::METHODS.iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Index", "Show"]);

        let req = Arc::new(Request::new(Method::Get, "default", "/visit/index/"));
        let deferred = DeferredMethod {
            controller: controller_name::<Visit>(),
            method: "Index",
            index: 0,
            factory: new_controller::<Visit>,
        };
        deferred.invoke(Arc::clone(&req)).await;
        assert_eq!(req.take_response().body, b"index");
    }
}
