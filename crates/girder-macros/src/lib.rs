//! Procedural macros for the Girder HTTP framework.
//!
//! This crate provides:
//!
//! - `#[object]` - Builds the method table of a shared handler object
//! - `#[controller]` - Builds the method table of a per-request controller
//!
//! # Handler Functions
//!
//! Plain handlers need no macro. Any `async fn(Arc<Request>) -> R` where `R`
//! implements `IntoResponse` can be bound directly:
//!
//! ```rust,ignore
//! async fn ping(_req: Arc<Request>) -> &'static str {
//!     "pong"
//! }
//!
//! server.bind_function("GET:/ping", ping)?;
//! ```
//!
//! # Method Tables
//!
//! Objects and controllers are bound method by method. Both macros go on an
//! inherent `impl` block and expose every method that:
//!
//! - is `pub`,
//! - takes `&self` (or `&mut self`, controllers only),
//! - takes exactly one more argument, the request.
//!
//! Everything else in the block is left alone. The table name of a method is
//! the UpperCamel form of its Rust name, which is what URI derivation and
//! REST verb matching see:
//!
//! ```rust,ignore
//! #[girder::object]
//! impl UserApi {
//!     pub async fn get_user_list(&self, req: Arc<Request>) -> String { ... } // "GetUserList"
//!     pub fn post(&self, req: Arc<Request>) { ... }                          // "Post"
//!
//!     #[girder(name = "Index")]
//!     pub fn home(&self, req: Arc<Request>) { ... }                          // "Index"
//!
//!     #[girder(skip)]
//!     pub fn internal(&self, req: Arc<Request>) { ... }                      // not exposed
//! }
//! ```
//!
//! # Crate Path
//!
//! Generated code refers to `::girder` by default. Crates that depend on
//! `girder-core` directly pass the path explicitly:
//!
//! ```rust,ignore
//! #[girder_core::object(crate = girder_core)]
//! impl UserApi { ... }
//! ```

mod method_table;

use proc_macro::TokenStream;
use syn::{ItemImpl, parse_macro_input};

use method_table::{MacroArgs, TableKind};

/// Generates an `ObjectMethods` implementation for a shared handler object.
///
/// One instance serves every request, so exposed methods take `&self`.
/// Methods may be `async` or not; their return type must implement
/// `IntoResponse`.
///
/// # Attributes
///
/// - `#[girder(name = "...")]` - Override the table name of a method
/// - `#[girder(skip)]` - Do not expose a method that would otherwise qualify
///
/// # Example
///
/// ```rust,ignore
/// struct Status { started: Instant }
///
/// #[girder::object]
/// impl Status {
///     pub fn uptime(&self, _req: Arc<Request>) -> String {
///         format!("{:?}", self.started.elapsed())
///     }
/// }
///
/// server.bind_object("/status", Arc::new(Status { started: Instant::now() }))?;
/// // GET /status/uptime/
/// ```
#[proc_macro_attribute]
pub fn object(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as MacroArgs);
    let input = parse_macro_input!(item as ItemImpl);

    match method_table::expand(TableKind::Object, args, input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Generates a `ControllerMethods` implementation for a per-request
/// controller.
///
/// A fresh instance is built with `Default` for every request, so exposed
/// methods may take `&mut self`. The type must also implement `Controller`,
/// which carries the optional `init`/`shut` callbacks.
///
/// Accepts the same `#[girder(...)]` method attributes as [`macro@object`].
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Cart { items: Vec<String> }
///
/// impl Controller for Cart {}
///
/// #[girder::controller]
/// impl Cart {
///     pub async fn add(&mut self, req: Arc<Request>) { ... }
///     pub async fn list(&self, req: Arc<Request>) -> String { ... }
/// }
///
/// server.bind_controller::<Cart>("/cart")?;
/// ```
#[proc_macro_attribute]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as MacroArgs);
    let input = parse_macro_input!(item as ItemImpl);

    match method_table::expand(TableKind::Controller, args, input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
