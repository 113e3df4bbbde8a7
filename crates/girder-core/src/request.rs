//! Per-request context handed to every bound callable.
//!
//! A [`Request`] is created by the transport for each inbound request and
//! shared as `Arc<Request>` between the Init hooks, the primary target and
//! the Shut hooks of that request. It carries:
//!
//! - the routing triple (verb, domain, URI) plus query string, headers and
//!   raw body bytes,
//! - a typed state map so hooks can hand values to the target,
//! - a [`Response`] buffer the callables write into.
//!
//! Nothing here parses or encodes bodies; bytes go in and bytes come out.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use parking_lot::Mutex;

use crate::method::Method;

/// Buffered response produced by a request's callables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

impl Response {
    /// Returns the first header with the given name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing any existing value with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }
}

/// The context object passed to handlers, hooks and controller methods.
///
/// # Example
///
/// ```rust,ignore
/// async fn show(req: Arc<Request>) {
///     let id = req.query_param("id").unwrap_or("0");
///     req.write(format!("user {id}"));
/// }
/// ```
#[derive(Debug)]
pub struct Request {
    id: u64,
    method: Method,
    domain: String,
    uri: String,
    query: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    state: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
    response: Mutex<Response>,
}

impl Request {
    /// Creates a request for the given routing triple.
    ///
    /// The domain should already have any `:port` suffix removed.
    pub fn new(method: Method, domain: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: 0,
            method,
            domain: domain.into(),
            uri: uri.into(),
            query: String::new(),
            headers: HashMap::new(),
            body: Vec::new(),
            state: Mutex::new(HashMap::new()),
            response: Mutex::new(Response::default()),
        }
    }

    /// Sets the request id.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Sets the raw query string (without the leading `?`).
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Adds a header. Names are stored lower-cased.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the raw body bytes.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    // ─── Request data ─────────────────────────────────────────────────────────

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns the raw value of the first `key=value` pair named `key`.
    ///
    /// No percent-decoding is applied.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Returns a header value, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    // ─── Per-request state ────────────────────────────────────────────────────

    /// Stores a value in the request's state map.
    ///
    /// Only one value per type can be stored; subsequent calls overwrite.
    pub fn set_state<T: Send + Sync + 'static>(&self, value: T) {
        self.state.lock().insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a cloned value from the state map.
    pub fn get_state<T: Clone + 'static>(&self) -> Option<T> {
        self.state
            .lock()
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Removes and returns a value from the state map.
    pub fn take_state<T: 'static>(&self) -> Option<T> {
        self.state
            .lock()
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    // ─── Response buffer ──────────────────────────────────────────────────────

    /// Appends bytes to the response body.
    pub fn write(&self, bytes: impl AsRef<[u8]>) {
        self.response.lock().body.extend_from_slice(bytes.as_ref());
    }

    pub fn set_status(&self, status: u16) {
        self.response.lock().status = status;
    }

    pub fn set_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.response.lock().set_header(name, value);
    }

    /// Returns the current response status.
    pub fn status(&self) -> u16 {
        self.response.lock().status
    }

    /// Runs `f` with mutable access to the response buffer.
    pub fn with_response<R>(&self, f: impl FnOnce(&mut Response) -> R) -> R {
        f(&mut self.response.lock())
    }

    /// Takes the buffered response, leaving a fresh default in its place.
    pub fn take_response(&self) -> Response {
        std::mem::take(&mut *self.response.lock())
    }
}
