//! Request dispatch.
//!
//! ```text
//! Request ─▶ resolve ─┬─ miss ─▶ NotFound
//!                     └─ hit ──▶ Init hooks ─▶ target ─▶ Shut hooks ─▶ Handled(Response)
//! ```
//!
//! Resolution tries the exact key first, then the URI with a trailing `/`
//! (object and controller URIs end in one), then both again against the
//! `default` domain when fallback is enabled.

use std::borrow::Cow;
use std::sync::Arc;

use girder_core::{DEFAULT_DOMAIN, HandlerItem, HookPoint, Method, Request, Response};
use tracing::{Instrument, debug, info_span};

use crate::server::Server;

/// Result of dispatching one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A target was found and ran; this is its buffered response.
    Handled(Response),
    /// No target is bound for the request.
    NotFound,
}

impl DispatchOutcome {
    /// Returns the response, if the request was handled.
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Handled(resp) => Some(resp),
            Self::NotFound => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// The key a request resolved to.
struct Resolved<'a> {
    domain: &'a str,
    uri: Cow<'a, str>,
    item: HandlerItem,
}

impl Server {
    /// Routes a request to its bound target and runs it with its hooks.
    ///
    /// Requests with id `0` are given a fresh id from this server.
    pub async fn dispatch(&self, req: Request) -> DispatchOutcome {
        let req = if req.id() == 0 {
            req.with_id(self.next_request_id())
        } else {
            req
        };
        let span = info_span!(
            "dispatch",
            server = %self.name(),
            request_id = req.id(),
            method = %req.method(),
            domain = %req.domain(),
            uri = %req.uri(),
        );
        self.dispatch_inner(Arc::new(req)).instrument(span).await
    }

    async fn dispatch_inner(&self, req: Arc<Request>) -> DispatchOutcome {
        let (server_agent, fallback) = {
            let config = self.inner.config.read();
            (config.server_agent.clone(), config.fallback_to_default_domain)
        };

        let Some(resolved) = self.resolve(req.domain(), req.method(), req.uri(), fallback) else {
            debug!("No handler bound");
            return DispatchOutcome::NotFound;
        };
        debug!(
            domain = resolved.domain,
            uri = %resolved.uri,
            "Resolved handler"
        );

        self.run_hooks(HookPoint::Init, &resolved, &req).await;
        resolved.item.invoke(Arc::clone(&req)).await;
        self.run_hooks(HookPoint::Shut, &resolved, &req).await;

        let mut response = req.take_response();
        if response.header("Server").is_none() {
            response.set_header("Server", server_agent);
        }
        DispatchOutcome::Handled(response)
    }

    fn resolve<'a>(
        &self,
        domain: &'a str,
        method: Method,
        uri: &'a str,
        fallback: bool,
    ) -> Option<Resolved<'a>> {
        let mut uris = vec![Cow::Borrowed(uri)];
        if !uri.ends_with('/') {
            uris.push(Cow::Owned(format!("{uri}/")));
        }
        let mut domains = vec![domain];
        if fallback && !domain.eq_ignore_ascii_case(DEFAULT_DOMAIN) {
            domains.push(DEFAULT_DOMAIN);
        }

        domains.into_iter().find_map(|domain| {
            uris.iter().find_map(|uri| {
                self.inner
                    .handlers
                    .get(domain, method, uri)
                    .map(|item| Resolved {
                        domain,
                        uri: uri.clone(),
                        item,
                    })
            })
        })
    }

    async fn run_hooks(&self, point: HookPoint, resolved: &Resolved<'_>, req: &Arc<Request>) {
        let Some(hooks) =
            self.inner
                .hooks
                .get(point, resolved.domain, req.method(), &resolved.uri)
        else {
            return;
        };
        for hook in hooks {
            hook(Arc::clone(req)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::ServerConfig;
    use girder_core::{Controller, controller};

    #[derive(Default)]
    struct Visit {
        trail: Vec<&'static str>,
    }

    impl Controller for Visit {}

    #[controller(crate = girder_core)]
    impl Visit {
        pub async fn index(&mut self, req: Arc<Request>) {
            self.trail.push("index");
            req.write(self.trail.join(","));
        }
    }

    fn request(method: Method, domain: &str, uri: &str) -> Request {
        Request::new(method, domain, uri)
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = Server::new("test");
        let outcome = server.dispatch(request(Method::Get, "default", "/none")).await;
        assert!(outcome.is_not_found());
    }

    #[tokio::test]
    async fn test_function_response_and_agent() {
        let server = Server::new("test");
        server.set_server_agent("unit").unwrap();
        server
            .bind_function("GET:/ping", |_req: Arc<Request>| async { "pong" })
            .unwrap();
        server.start().unwrap();

        let resp = server
            .dispatch(request(Method::Get, "default", "/ping"))
            .await
            .into_response()
            .unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"pong");
        assert_eq!(resp.header("server"), Some("unit"));
    }

    #[tokio::test]
    async fn test_hooks_run_around_target_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let server = Server::new("test");
        for (name, point) in [
            ("init-1", HookPoint::Init),
            ("init-2", HookPoint::Init),
            ("shut-1", HookPoint::Shut),
        ] {
            let order = Arc::clone(&order);
            server
                .bind_hook(point, "/x", move |_req: Arc<Request>| {
                    let order = Arc::clone(&order);
                    async move { order.lock().unwrap().push(name) }
                })
                .unwrap();
        }
        {
            let order = Arc::clone(&order);
            server
                .bind_function("/x", move |_req: Arc<Request>| {
                    let order = Arc::clone(&order);
                    async move { order.lock().unwrap().push("target") }
                })
                .unwrap();
        }

        server.dispatch(request(Method::Delete, "default", "/x")).await;
        assert_eq!(
            *order.lock().unwrap(),
            vec!["init-1", "init-2", "target", "shut-1"]
        );
    }

    #[tokio::test]
    async fn test_init_hook_state_reaches_target() {
        #[derive(Clone)]
        struct User(&'static str);

        let server = Server::new("test");
        server
            .bind_hook_init("/me", |req: Arc<Request>| async move {
                req.set_state(User("ann"));
            })
            .unwrap();
        server
            .bind_function("/me", |req: Arc<Request>| async move {
                req.get_state::<User>().map(|u| u.0)
            })
            .unwrap();

        let resp = server
            .dispatch(request(Method::Get, "default", "/me"))
            .await
            .into_response()
            .unwrap();
        assert_eq!(resp.body, b"ann");
    }

    #[tokio::test]
    async fn test_trailing_slash_retry_and_controller() {
        let server = Server::new("test");
        server.bind_controller::<Visit>("/visit").unwrap();

        let resp = server
            .dispatch(request(Method::Get, "default", "/visit/index"))
            .await
            .into_response()
            .unwrap();
        assert_eq!(resp.body, b"index");
    }

    #[tokio::test]
    async fn test_default_domain_fallback() {
        let server = Server::new("test");
        server
            .bind_function("/x", |_req: Arc<Request>| async { "default" })
            .unwrap();
        server
            .bind_function("/x@a.com", |_req: Arc<Request>| async { "a" })
            .unwrap();

        let a = server.dispatch(request(Method::Get, "A.com", "/x")).await;
        assert_eq!(a.into_response().unwrap().body, b"a");
        let other = server.dispatch(request(Method::Get, "b.com", "/x")).await;
        assert_eq!(other.into_response().unwrap().body, b"default");

        let strict = Server::with_config(
            "strict",
            ServerConfig {
                fallback_to_default_domain: false,
                ..Default::default()
            },
        );
        strict
            .bind_function("/x", |_req: Arc<Request>| async { "default" })
            .unwrap();
        assert!(
            strict
                .dispatch(request(Method::Get, "b.com", "/x"))
                .await
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_error_result_becomes_500() {
        let server = Server::new("test");
        server
            .bind_function("/fail", |_req: Arc<Request>| async {
                Err::<&'static str, _>("database unavailable")
            })
            .unwrap();

        let resp = server
            .dispatch(request(Method::Post, "default", "/fail"))
            .await
            .into_response()
            .unwrap();
        assert_eq!(resp.status, 500);
    }

    #[tokio::test]
    async fn test_request_ids_are_assigned() {
        let server = Server::new("test");
        server
            .bind_function("/id", |req: Arc<Request>| async move { req.id().to_string() })
            .unwrap();

        let first = server.dispatch(request(Method::Get, "default", "/id")).await;
        let second = server.dispatch(request(Method::Get, "default", "/id")).await;
        assert_ne!(
            first.into_response().unwrap().body,
            second.into_response().unwrap().body
        );

        let given = server
            .dispatch(request(Method::Get, "default", "/id").with_id(42))
            .await;
        assert_eq!(given.into_response().unwrap().body, b"42");
    }
}
