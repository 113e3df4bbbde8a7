//! Binding resolvers.
//!
//! Each resolver turns one kind of target into registry entries:
//!
//! | Operation                 | Target               | URIs                       |
//! |---------------------------|----------------------|----------------------------|
//! | `bind_function`           | callable             | the pattern URI            |
//! | `bind_object`             | shared object        | `<uri>/<method-name>/`     |
//! | `bind_object_methods`     | shared object        | `<uri>/<method-name>/`     |
//! | `bind_object_rest`        | shared object        | the pattern URI, per verb  |
//! | `bind_controller`         | per-request instance | `<uri>/<method-name>/`     |
//! | `bind_controller_methods` | per-request instance | `<uri>/<method-name>/`     |
//! | `bind_controller_rest`    | per-request instance | the pattern URI, per verb  |
//!
//! Batch operations are not atomic: when one entry fails, the entries bound
//! before it stay in place.

use std::sync::Arc;

use girder_core::{
    BindError, BindResult, ControllerMethod, ControllerMethods, DeferredMethod, Handler,
    HandlerFunc, HandlerItem, HookPoint, Method, ObjectMethod, ObjectMethods, Pattern, Request,
    controller_name, into_handler, is_lifecycle_method, new_controller,
};
use tracing::debug;

use crate::server::Server;

impl Server {
    // =========================================================================
    // Handlers
    // =========================================================================

    /// Binds a callable to a single pattern.
    ///
    /// The same callable serves every matching request concurrently.
    ///
    /// # Errors
    ///
    /// [`BindError::AlreadyRunning`], [`BindError::InvalidPattern`].
    pub fn bind_function<H: Handler>(&self, pattern: &str, handler: H) -> BindResult<()> {
        self.bind_direct(pattern, into_handler(handler))
    }

    pub(crate) fn bind_direct(&self, pattern: &str, handler: HandlerFunc) -> BindResult<()> {
        self.ensure_configuring()?;
        let pattern = Pattern::parse(pattern)?;
        self.bind_item(&pattern, HandlerItem::Direct(handler))
    }

    /// Binds every exposed method of `object` under `<uri>/<method-name>/`.
    ///
    /// `GetUserList` bound at `/api` is served at `/api/get-user-list/`.
    pub fn bind_object<T: ObjectMethods>(&self, pattern: &str, object: Arc<T>) -> BindResult<()> {
        self.ensure_configuring()?;
        let base = parse_checked(pattern)?;
        for method in T::METHODS {
            self.bind_item(
                &base.with_method_name(method.name),
                object_item(&object, method),
            )?;
        }
        Ok(())
    }

    /// Binds the named methods of `object`, like [`Server::bind_object`].
    ///
    /// `methods` is a comma-separated list matched case-insensitively
    /// against the method table. Every name is checked before anything is
    /// bound.
    ///
    /// # Errors
    ///
    /// [`BindError::InvalidMethodName`] if a name is not in the table.
    pub fn bind_object_methods<T: ObjectMethods>(
        &self,
        pattern: &str,
        object: Arc<T>,
        methods: &str,
    ) -> BindResult<()> {
        self.ensure_configuring()?;
        let base = parse_checked(pattern)?;
        let selected = method_names(methods)
            .map(|name| {
                ObjectMethod::find(T::METHODS, name)
                    .ok_or_else(|| BindError::InvalidMethodName(name.to_string()))
            })
            .collect::<BindResult<Vec<_>>>()?;

        for method in selected {
            self.bind_item(
                &base.with_method_name(method.name),
                object_item(&object, method),
            )?;
        }
        Ok(())
    }

    /// Binds the methods of `object` named after HTTP verbs (`Get`, `Post`,
    /// ...) to the pattern URI under that verb. Other methods are ignored.
    pub fn bind_object_rest<T: ObjectMethods>(
        &self,
        pattern: &str,
        object: Arc<T>,
    ) -> BindResult<()> {
        self.ensure_configuring()?;
        let base = parse_checked(pattern)?;
        for method in T::METHODS {
            let Some(verb) = Method::from_token(method.name) else {
                continue;
            };
            self.bind_item(&base.with_method(verb.as_str()), object_item(&object, method))?;
        }
        Ok(())
    }

    // =========================================================================
    // Controllers
    // =========================================================================

    /// Binds every exposed method of controller `C` under
    /// `<uri>/<method-name>/`, skipping the `Init`/`Shut` lifecycle names.
    ///
    /// A new `C` is built for every request.
    pub fn bind_controller<C: ControllerMethods>(&self, pattern: &str) -> BindResult<()> {
        self.ensure_configuring()?;
        let base = parse_checked(pattern)?;
        for (index, method) in routable::<C>() {
            self.bind_item(
                &base.with_method_name(method.name),
                controller_item(index, method),
            )?;
        }
        Ok(())
    }

    /// Binds the named methods of controller `C`, like
    /// [`Server::bind_controller`].
    ///
    /// # Errors
    ///
    /// [`BindError::InvalidMethodName`] if a name is not in the table.
    pub fn bind_controller_methods<C: ControllerMethods>(
        &self,
        pattern: &str,
        methods: &str,
    ) -> BindResult<()> {
        self.ensure_configuring()?;
        let base = parse_checked(pattern)?;
        let selected = method_names(methods)
            .map(|name| {
                ControllerMethod::find(C::METHODS, name)
                    .ok_or_else(|| BindError::InvalidMethodName(name.to_string()))
            })
            .collect::<BindResult<Vec<_>>>()?;

        for (index, method) in selected {
            self.bind_item(
                &base.with_method_name(method.name),
                controller_item(index, method),
            )?;
        }
        Ok(())
    }

    /// Binds the verb-named methods of controller `C` to the pattern URI
    /// under that verb.
    pub fn bind_controller_rest<C: ControllerMethods>(&self, pattern: &str) -> BindResult<()> {
        self.ensure_configuring()?;
        let base = parse_checked(pattern)?;
        for (index, method) in routable::<C>() {
            let Some(verb) = Method::from_token(method.name) else {
                continue;
            };
            self.bind_item(&base.with_method(verb.as_str()), controller_item(index, method))?;
        }
        Ok(())
    }

    // =========================================================================
    // Hooks
    // =========================================================================

    /// Appends a hook for `point` to every key the pattern covers.
    ///
    /// Hooks for one key run in the order they were bound.
    pub fn bind_hook<H: Handler>(&self, point: HookPoint, pattern: &str, hook: H) -> BindResult<()> {
        self.bind_hook_func(point, pattern, into_handler(hook))
    }

    /// Appends a hook that runs before the primary target.
    pub fn bind_hook_init<H: Handler>(&self, pattern: &str, hook: H) -> BindResult<()> {
        self.bind_hook(HookPoint::Init, pattern, hook)
    }

    /// Appends a hook that runs after the primary target.
    pub fn bind_hook_shut<H: Handler>(&self, pattern: &str, hook: H) -> BindResult<()> {
        self.bind_hook(HookPoint::Shut, pattern, hook)
    }

    pub(crate) fn bind_hook_func(
        &self,
        point: HookPoint,
        pattern: &str,
        hook: HandlerFunc,
    ) -> BindResult<()> {
        self.ensure_configuring()?;
        let pattern = Pattern::parse(pattern)?;
        let methods = pattern.method_filter()?;
        self.inner
            .hooks
            .append(point, &pattern.domain, methods, &pattern.uri, hook);
        debug!(server = %self.name(), hook = %point, route = %pattern, "Bound hook");
        Ok(())
    }

    // ─── Shared ───────────────────────────────────────────────────────────────

    fn bind_item(&self, pattern: &Pattern, item: HandlerItem) -> BindResult<()> {
        let methods = pattern.method_filter()?;
        match &item {
            HandlerItem::Direct(_) => {
                debug!(server = %self.name(), route = %pattern, "Bound handler");
            }
            HandlerItem::Deferred(d) => {
                debug!(
                    server = %self.name(),
                    route = %pattern,
                    controller = d.controller,
                    method = d.method,
                    "Bound controller method"
                );
            }
        }
        self.inner
            .handlers
            .set(&pattern.domain, methods, &pattern.uri, item);
        Ok(())
    }
}

/// Parses a pattern and validates its method prefix up front, so a bad
/// prefix fails even when the target exposes no methods.
fn parse_checked(pattern: &str) -> BindResult<Pattern> {
    let pattern = Pattern::parse(pattern)?;
    pattern.method_filter()?;
    Ok(pattern)
}

/// Splits a comma-separated method list. Empty entries are kept so that
/// they fail the table lookup.
fn method_names(methods: &str) -> impl Iterator<Item = &str> {
    methods.split(',').map(str::trim)
}

fn object_item<T: ObjectMethods>(object: &Arc<T>, method: &ObjectMethod<T>) -> HandlerItem {
    let object = Arc::clone(object);
    let call = method.call;
    HandlerItem::Direct(Arc::new(move |req: Arc<Request>| {
        call(Arc::clone(&object), req)
    }))
}

fn controller_item<C: ControllerMethods>(index: usize, method: &ControllerMethod<C>) -> HandlerItem {
    HandlerItem::Deferred(DeferredMethod {
        controller: controller_name::<C>(),
        method: method.name,
        index,
        factory: new_controller::<C>,
    })
}

/// Table entries of `C` that may be routed, with their table indices.
fn routable<C: ControllerMethods>() -> impl Iterator<Item = (usize, &'static ControllerMethod<C>)> {
    C::METHODS
        .iter()
        .enumerate()
        .filter(|(_, m)| !is_lifecycle_method(m.name))
}
