//! The domain multiplexer.
//!
//! A [`Domain`] is a group of domain aliases sharing one set of bindings.
//! Every bind call made on it is forwarded to the owning server once per
//! alias, with `@alias` appended to the pattern:
//!
//! ```text
//! server.domain("a.com, b.com").bind_function("/x", f)
//!     ├─▶ server.bind_function("/x@a.com", f)
//!     └─▶ server.bind_function("/x@b.com", f)
//! ```
//!
//! Patterns that already carry an `@domain` suffix are rejected. Forwarding
//! stops at the first failing alias; aliases before it stay bound.

use std::sync::Arc;

use girder_core::{
    BindError, BindResult, ControllerMethods, Handler, HookPoint, ObjectMethods, into_handler,
};

use crate::server::Server;

/// A set of domain aliases bound together on one server.
#[derive(Debug, Clone)]
pub struct Domain {
    server: Server,
    aliases: Arc<[String]>,
}

impl Domain {
    pub(crate) fn new(server: Server, aliases: Arc<[String]>) -> Self {
        Self { server, aliases }
    }

    /// The aliases, trimmed and de-duplicated, in first-seen order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The server this group binds into.
    pub fn server(&self) -> &Server {
        &self.server
    }

    #[cfg(test)]
    pub(crate) fn aliases_arc(&self) -> Arc<[String]> {
        Arc::clone(&self.aliases)
    }

    fn for_each_alias(&self, pattern: &str, mut bind: impl FnMut(&str) -> BindResult<()>) -> BindResult<()> {
        if pattern.contains('@') {
            return Err(BindError::invalid_pattern(
                pattern,
                "domain suffix not allowed when binding through a domain",
            ));
        }
        for alias in self.aliases.iter() {
            bind(&format!("{pattern}@{alias}"))?;
        }
        Ok(())
    }

    pub fn bind_function<H: Handler>(&self, pattern: &str, handler: H) -> BindResult<()> {
        let handler = into_handler(handler);
        self.for_each_alias(pattern, |p| self.server.bind_direct(p, Arc::clone(&handler)))
    }

    pub fn bind_object<T: ObjectMethods>(&self, pattern: &str, object: Arc<T>) -> BindResult<()> {
        self.for_each_alias(pattern, |p| self.server.bind_object(p, Arc::clone(&object)))
    }

    pub fn bind_object_methods<T: ObjectMethods>(
        &self,
        pattern: &str,
        object: Arc<T>,
        methods: &str,
    ) -> BindResult<()> {
        self.for_each_alias(pattern, |p| {
            self.server
                .bind_object_methods(p, Arc::clone(&object), methods)
        })
    }

    pub fn bind_object_rest<T: ObjectMethods>(&self, pattern: &str, object: Arc<T>) -> BindResult<()> {
        self.for_each_alias(pattern, |p| {
            self.server.bind_object_rest(p, Arc::clone(&object))
        })
    }

    pub fn bind_controller<C: ControllerMethods>(&self, pattern: &str) -> BindResult<()> {
        self.for_each_alias(pattern, |p| self.server.bind_controller::<C>(p))
    }

    pub fn bind_controller_methods<C: ControllerMethods>(
        &self,
        pattern: &str,
        methods: &str,
    ) -> BindResult<()> {
        self.for_each_alias(pattern, |p| {
            self.server.bind_controller_methods::<C>(p, methods)
        })
    }

    pub fn bind_controller_rest<C: ControllerMethods>(&self, pattern: &str) -> BindResult<()> {
        self.for_each_alias(pattern, |p| self.server.bind_controller_rest::<C>(p))
    }

    pub fn bind_hook<H: Handler>(&self, point: HookPoint, pattern: &str, hook: H) -> BindResult<()> {
        let hook = into_handler(hook);
        self.for_each_alias(pattern, |p| {
            self.server.bind_hook_func(point, p, Arc::clone(&hook))
        })
    }

    pub fn bind_hook_init<H: Handler>(&self, pattern: &str, hook: H) -> BindResult<()> {
        self.bind_hook(HookPoint::Init, pattern, hook)
    }

    pub fn bind_hook_shut<H: Handler>(&self, pattern: &str, hook: H) -> BindResult<()> {
        self.bind_hook(HookPoint::Shut, pattern, hook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use girder_core::{Method, Request, object};

    struct Echo;

    #[object(crate = girder_core)]
    impl Echo {
        pub fn say(&self, req: Arc<Request>) -> String {
            req.domain().to_string()
        }
    }

    fn noop() -> impl Handler {
        |_req: Arc<Request>| async {}
    }

    #[test]
    fn test_function_on_two_aliases() {
        let server = Server::new("test");
        server
            .domain("a.com, b.com")
            .bind_function("GET:/x", noop())
            .unwrap();

        assert_eq!(server.handler_count(), 2);
        let a = server.handler("a.com", Method::Get, "/x").unwrap();
        let b = server.handler("b.com", Method::Get, "/x").unwrap();
        assert!(Arc::ptr_eq(a.as_direct().unwrap(), b.as_direct().unwrap()));
        assert!(server.handler("default", Method::Get, "/x").is_none());
    }

    #[test]
    fn test_object_on_aliases() {
        let server = Server::new("test");
        let domain = server.domain("a.com,B.com,a.com");
        assert_eq!(domain.aliases(), ["a.com", "B.com"]);

        domain.bind_object("POST:/echo", Arc::new(Echo)).unwrap();
        assert!(server.handler("a.com", Method::Post, "/echo/say/").is_some());
        assert!(server.handler("b.com", Method::Post, "/echo/say/").is_some());
    }

    #[test]
    fn test_hooks_on_aliases() {
        let server = Server::new("test");
        let domain = server.domain("a.com, b.com");
        domain.bind_hook_init("GET:/x", noop()).unwrap();
        domain.bind_hook_shut("GET:/x", noop()).unwrap();

        for alias in ["a.com", "b.com"] {
            for point in HookPoint::ALL {
                let hooks = server.hooks(point, alias, Method::Get, "/x").unwrap();
                assert_eq!(hooks.len(), 1);
            }
        }
    }

    #[test]
    fn test_first_failure_stops_forwarding() {
        let server = Server::new("test");
        let domain = server.domain("a.com");
        server.start().unwrap();
        assert_eq!(
            domain.bind_function("/x", noop()),
            Err(BindError::AlreadyRunning)
        );
        assert_eq!(
            domain.bind_hook_init("/x", noop()),
            Err(BindError::AlreadyRunning)
        );
    }

    #[test]
    fn test_pattern_with_domain_rejected() {
        let server = Server::new("test");
        let domain = server.domain("a.com, b.com");
        assert!(matches!(
            domain.bind_function("/x@c.com", noop()),
            Err(BindError::InvalidPattern { .. })
        ));
        assert!(matches!(
            domain.bind_object("GET:/echo@a.com", Arc::new(Echo)),
            Err(BindError::InvalidPattern { .. })
        ));
        assert!(matches!(
            domain.bind_hook_init("/x@", noop()),
            Err(BindError::InvalidPattern { .. })
        ));
        assert_eq!(server.handler_count(), 0);
    }
}
