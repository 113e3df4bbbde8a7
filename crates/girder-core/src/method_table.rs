//! Compile-time method tables for objects and controllers.
//!
//! Objects and controllers expose their routable methods through a static
//! table of `(name, fn pointer)` entries built once per type. The binders walk
//! these tables to derive URIs; nothing is discovered at runtime.
//!
//! The tables are normally generated by the [`object`](crate::object) and
//! [`controller`](crate::controller) attribute macros:
//!
//! ```rust,ignore
//! struct UserApi { db: Db }
//!
//! #[girder_core::object]
//! impl UserApi {
//!     // Table name "GetUserList", bound under <base>/get-user-list/
//!     pub async fn get_user_list(&self, req: Arc<Request>) -> String { ... }
//!
//!     // Not `pub`, not exposed.
//!     fn helper(&self) {}
//! }
//! ```
//!
//! Table names are UpperCamel so that the URI derivation and the REST verb
//! matching work on the same spelling (`post` → `Post` → `POST`).

use std::any::type_name;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::request::Request;

// =============================================================================
// Objects
// =============================================================================

/// One exposed method of a shared object.
pub struct ObjectMethod<T> {
    /// Table name of the method, UpperCamel.
    pub name: &'static str,
    /// Calls the method on a shared instance.
    pub call: fn(Arc<T>, Arc<Request>) -> BoxFuture<'static, ()>,
}

/// A type whose methods can be bound as shared handlers.
///
/// The same instance serves every request, so methods take `&self`.
pub trait ObjectMethods: Send + Sync + Sized + 'static {
    /// Every exposed method, in declaration order.
    const METHODS: &'static [ObjectMethod<Self>];
}

// =============================================================================
// Controllers
// =============================================================================

/// Lifecycle callbacks for per-request controllers.
///
/// A new instance is built with [`Default`] for every request, so controllers
/// may keep request-scoped state in `&mut self` without any locking.
#[async_trait]
pub trait Controller: Default + Send + 'static {
    /// Runs before the routed method.
    async fn init(&mut self, _req: &Arc<Request>) {}

    /// Runs after the routed method, before the instance is dropped.
    async fn shut(&mut self, _req: &Arc<Request>) {}
}

/// One exposed method of a controller.
pub struct ControllerMethod<C> {
    /// Table name of the method, UpperCamel.
    pub name: &'static str,
    /// Calls the method on a request-owned instance.
    pub call: for<'a> fn(&'a mut C, Arc<Request>) -> BoxFuture<'a, ()>,
}

/// A controller with a method table.
pub trait ControllerMethods: Controller {
    /// Every exposed method, in declaration order.
    const METHODS: &'static [ControllerMethod<Self>];
}

/// Names reserved for controller lifecycle callbacks. Table entries with
/// these names are never bound as routes.
pub const LIFECYCLE_METHODS: [&str; 2] = ["Init", "Shut"];

/// Returns `true` if `name` is one of the [`LIFECYCLE_METHODS`].
pub fn is_lifecycle_method(name: &str) -> bool {
    LIFECYCLE_METHODS
        .iter()
        .any(|m| m.eq_ignore_ascii_case(name))
}

/// Object-safe view of a controller instance used at dispatch time.
#[async_trait]
pub trait ErasedController: Send {
    async fn init(&mut self, req: &Arc<Request>);
    async fn call(&mut self, index: usize, req: Arc<Request>);
    async fn shut(&mut self, req: &Arc<Request>);
}

#[async_trait]
impl<C: ControllerMethods> ErasedController for C {
    async fn init(&mut self, req: &Arc<Request>) {
        Controller::init(self, req).await;
    }

    async fn call(&mut self, index: usize, req: Arc<Request>) {
        if let Some(method) = C::METHODS.get(index) {
            (method.call)(self, req).await;
        }
    }

    async fn shut(&mut self, req: &Arc<Request>) {
        Controller::shut(self, req).await;
    }
}

/// Builds a fresh, type-erased controller instance.
pub fn new_controller<C: ControllerMethods>() -> Box<dyn ErasedController> {
    Box::new(C::default())
}

/// Type name of a controller, for diagnostics.
pub fn controller_name<C: ControllerMethods>() -> &'static str {
    type_name::<C>()
}

/// Finds a table entry by name, ignoring ASCII case.
pub(crate) fn find_method<'t, E>(
    table: &'t [E],
    name: &str,
    name_of: impl Fn(&E) -> &'static str,
) -> Option<(usize, &'t E)> {
    table
        .iter()
        .enumerate()
        .find(|(_, e)| name_of(e).eq_ignore_ascii_case(name))
}

impl<T> ObjectMethod<T> {
    /// Looks up an exposed method by name, ignoring ASCII case.
    pub fn find<'t>(table: &'t [Self], name: &str) -> Option<&'t Self> {
        find_method(table, name, |m| m.name).map(|(_, m)| m)
    }
}

impl<C> ControllerMethod<C> {
    /// Looks up an exposed method and its table index by name, ignoring ASCII
    /// case.
    pub fn find<'t>(table: &'t [Self], name: &str) -> Option<(usize, &'t Self)> {
        find_method(table, name, |m| m.name)
    }
}
