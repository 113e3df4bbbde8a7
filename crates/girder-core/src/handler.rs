//! Handler types.
//!
//! Every bound target ends up as a [`HandlerItem`]:
//!
//! - [`HandlerItem::Direct`] wraps a [`HandlerFunc`], a shared callable that
//!   serves every matching request concurrently.
//! - [`HandlerItem::Deferred`] holds a [`DeferredMethod`]: a controller
//!   factory plus a method selector. The dispatcher builds a fresh controller
//!   for each request and runs `init`, the method, then `shut` on it.
//!
//! Plain async functions become handlers through the blanket [`Handler`]
//! implementation, similar to Axum's handler system:
//!
//! ```rust,ignore
//! async fn ping(req: Arc<Request>) -> &'static str {
//!     "pong"
//! }
//!
//! server.bind_function("GET:/ping", ping)?;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub use futures::future::BoxFuture;
use tracing::error;

use crate::method_table::ErasedController;
use crate::request::Request;

// ============================================================================
// IntoResponse - Handle handler return values
// ============================================================================

/// Types a handler may return. The value is written into the request's
/// response buffer once the handler completes.
pub trait IntoResponse: Send {
    fn write_to(self, req: &Request);
}

/// No response body.
impl IntoResponse for () {
    fn write_to(self, _req: &Request) {}
}

impl IntoResponse for String {
    fn write_to(self, req: &Request) {
        req.write(self);
    }
}

impl IntoResponse for &'static str {
    fn write_to(self, req: &Request) {
        req.write(self);
    }
}

impl IntoResponse for Vec<u8> {
    fn write_to(self, req: &Request) {
        req.write(self);
    }
}

/// `(status, body)` sets the status and writes the body.
impl<T: IntoResponse> IntoResponse for (u16, T) {
    fn write_to(self, req: &Request) {
        req.set_status(self.0);
        self.1.write_to(req);
    }
}

/// On `Some`, the inner value is written. On `None`, nothing happens.
impl<T: IntoResponse> IntoResponse for Option<T> {
    fn write_to(self, req: &Request) {
        if let Some(t) = self {
            t.write_to(req);
        }
    }
}

/// On `Ok`, the inner value is written. On `Err`, the error is logged and the
/// status becomes 500.
impl<T: IntoResponse, E: fmt::Display + Send> IntoResponse for Result<T, E> {
    fn write_to(self, req: &Request) {
        match self {
            Ok(t) => t.write_to(req),
            Err(e) => {
                error!(request_id = req.id(), uri = %req.uri(), "Handler error: {e}");
                req.set_status(500);
            }
        }
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// The type-erased callable stored in the registries.
pub type HandlerFunc = Arc<dyn Fn(Arc<Request>) -> BoxFuture<'static, ()> + Send + Sync>;

/// The core trait for request handlers.
///
/// Implemented for every `async fn(Arc<Request>) -> R` (and closures of the
/// same shape) where `R` implements [`IntoResponse`].
pub trait Handler: Clone + Send + Sync + 'static {
    /// Call the handler with the given request.
    fn call(self, req: Arc<Request>) -> BoxFuture<'static, ()>;
}

impl<F, Fut, Res> Handler for F
where
    F: FnOnce(Arc<Request>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: IntoResponse + 'static,
{
    fn call(self, req: Arc<Request>) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let res = (self)(Arc::clone(&req)).await;
            res.write_to(&req);
        })
    }
}

/// Convert a handler into a shareable [`HandlerFunc`].
pub fn into_handler<H: Handler>(handler: H) -> HandlerFunc {
    Arc::new(move |req| handler.clone().call(req))
}

// ============================================================================
// HandlerItem
// ============================================================================

/// A controller method resolved into an instance only at request time.
#[derive(Clone)]
pub struct DeferredMethod {
    /// Type name of the controller, for diagnostics.
    pub controller: &'static str,
    /// Method name as it appears in the controller's method table.
    pub method: &'static str,
    /// Position of the method in the controller's method table.
    pub index: usize,
    /// Builds a fresh controller instance.
    pub factory: fn() -> Box<dyn ErasedController>,
}

impl DeferredMethod {
    /// Creates a new controller instance, runs `init`, the selected method and
    /// `shut` on it, then drops it.
    pub async fn invoke(&self, req: Arc<Request>) {
        let mut instance = (self.factory)();
        instance.init(&req).await;
        instance.call(self.index, Arc::clone(&req)).await;
        instance.shut(&req).await;
    }
}

impl fmt::Debug for DeferredMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredMethod")
            .field("controller", &self.controller)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

/// A bound target.
#[derive(Clone)]
pub enum HandlerItem {
    /// A resolved callable, shared by all requests.
    Direct(HandlerFunc),
    /// A controller method, instantiated per request.
    Deferred(DeferredMethod),
}

impl HandlerItem {
    /// Returns the callable of a [`HandlerItem::Direct`] item.
    pub fn as_direct(&self) -> Option<&HandlerFunc> {
        match self {
            Self::Direct(f) => Some(f),
            Self::Deferred(_) => None,
        }
    }

    /// Returns the method reference of a [`HandlerItem::Deferred`] item.
    pub fn as_deferred(&self) -> Option<&DeferredMethod> {
        match self {
            Self::Direct(_) => None,
            Self::Deferred(d) => Some(d),
        }
    }

    /// Runs the target for one request.
    pub async fn invoke(&self, req: Arc<Request>) {
        match self {
            Self::Direct(f) => f(req).await,
            Self::Deferred(d) => d.invoke(req).await,
        }
    }
}

impl fmt::Debug for HandlerItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(_) => f.write_str("Direct(..)"),
            Self::Deferred(d) => f.debug_tuple("Deferred").field(d).finish(),
        }
    }
}

impl From<HandlerFunc> for HandlerItem {
    fn from(f: HandlerFunc) -> Self {
        Self::Direct(f)
    }
}
