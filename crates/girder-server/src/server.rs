//! The server: registry owner, lifecycle and configuration.
//!
//! A [`Server`] is a cheap clonable handle. It starts in the *configuring*
//! state, where handlers, hooks and config may change, and moves to
//! *running* exactly once through [`Server::start`]. There is no way back:
//! every bind and config call made after that fails with
//! [`BindError::AlreadyRunning`].
//!
//! ```text
//!   configuring ──start()──▶ running
//!   bind_* / set_*            dispatch only
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use girder_core::{
    BindError, BindResult, CompositeKey, DEFAULT_DOMAIN, HandlerFunc, HandlerItem,
    HandlerRegistry, HookPoint, HookRegistry, Method,
};
use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::{ServerConfig, duration_ms};
use crate::domain::Domain;

/// Name of the server created when no name is given.
pub const DEFAULT_SERVER: &str = "default";

pub(crate) struct ServerInner {
    pub(crate) name: String,
    running: AtomicBool,
    pub(crate) config: RwLock<ServerConfig>,
    pub(crate) handlers: HandlerRegistry,
    pub(crate) hooks: HookRegistry,
    /// Alias groups handed out by [`Server::domain`], keyed by the string
    /// they were requested with.
    domains: Mutex<HashMap<String, Arc<[String]>>>,
    next_request_id: AtomicU64,
}

/// An HTTP server's routing state.
///
/// # Example
///
/// ```rust,ignore
/// let server = Server::new("api");
/// server.bind_function("GET:/ping", |_req| async { "pong" })?;
/// server.domain("a.com, b.com").bind_object("/user", Arc::new(UserApi::new()))?;
/// server.start()?;
/// ```
#[derive(Clone)]
pub struct Server {
    pub(crate) inner: Arc<ServerInner>,
}

impl Server {
    /// Creates a server in the configuring state with the default config.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, ServerConfig::default())
    }

    /// Creates a server in the configuring state.
    pub fn with_config(name: impl Into<String>, config: ServerConfig) -> Self {
        Self {
            inner: Arc::new(ServerInner {
                name: name.into(),
                running: AtomicBool::new(false),
                config: RwLock::new(config.normalized()),
                handlers: HandlerRegistry::new(),
                hooks: HookRegistry::new(),
                domains: Mutex::new(HashMap::new()),
                next_request_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Returns `true` once the server has left the configuring state.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Freezes the handler and hook registries and the config.
    ///
    /// # Errors
    ///
    /// [`BindError::AlreadyRunning`] if the server was already started.
    pub fn start(&self) -> BindResult<()> {
        self.inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BindError::AlreadyRunning)?;

        info!(
            server = %self.name(),
            addr = %self.inner.config.read().addr,
            handlers = self.handler_count(),
            hooks = self.hook_count(),
            "Server running, bindings frozen"
        );
        Ok(())
    }

    /// Fails with [`BindError::AlreadyRunning`] outside the configuring state.
    pub(crate) fn ensure_configuring(&self) -> BindResult<()> {
        if self.is_running() {
            warn!(server = %self.name(), "Rejected change to a running server");
            return Err(BindError::AlreadyRunning);
        }
        Ok(())
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Returns a snapshot of the current config.
    pub fn config(&self) -> ServerConfig {
        self.inner.config.read().clone()
    }

    fn update_config(&self, f: impl FnOnce(&mut ServerConfig)) -> BindResult<()> {
        self.ensure_configuring()?;
        f(&mut self.inner.config.write());
        Ok(())
    }

    /// Replaces the whole config. An empty server agent falls back to the
    /// default one.
    pub fn set_config(&self, config: ServerConfig) -> BindResult<()> {
        self.update_config(|c| *c = config.normalized())
    }

    pub fn set_addr(&self, addr: impl Into<String>) -> BindResult<()> {
        let addr = addr.into();
        self.update_config(|c| c.addr = addr)
    }

    /// Sets the listen port, keeping the configured host.
    pub fn set_port(&self, port: u16) -> BindResult<()> {
        self.update_config(|c| {
            let host = match c.addr.rsplit_once(':') {
                Some((host, _)) if !host.is_empty() => host.to_string(),
                _ => "0.0.0.0".to_string(),
            };
            c.addr = format!("{host}:{port}");
        })
    }

    pub fn set_read_timeout(&self, timeout: Duration) -> BindResult<()> {
        self.update_config(|c| c.read_timeout_ms = duration_ms(timeout))
    }

    /// Sets the response deadline. `Duration::ZERO` disables it.
    pub fn set_write_timeout(&self, timeout: Duration) -> BindResult<()> {
        self.update_config(|c| c.write_timeout_ms = duration_ms(timeout))
    }

    pub fn set_idle_timeout(&self, timeout: Duration) -> BindResult<()> {
        self.update_config(|c| c.idle_timeout_ms = duration_ms(timeout))
    }

    pub fn set_max_header_bytes(&self, bytes: usize) -> BindResult<()> {
        self.update_config(|c| c.max_header_bytes = bytes)
    }

    pub fn set_server_agent(&self, agent: impl Into<String>) -> BindResult<()> {
        let agent = agent.into();
        self.update_config(|c| c.server_agent = agent)
    }

    // =========================================================================
    // Domains
    // =========================================================================

    /// Returns the multiplexer for a comma-separated domain list.
    ///
    /// Aliases are trimmed, empty entries dropped and duplicates removed,
    /// keeping first occurrences in order. A list with no usable alias means
    /// the `default` domain. The parsed group is cached per server under the
    /// exact string passed in.
    pub fn domain(&self, domains: &str) -> Domain {
        let aliases = {
            let mut cache = self.inner.domains.lock();
            Arc::clone(
                cache
                    .entry(domains.to_string())
                    .or_insert_with(|| split_aliases(domains)),
            )
        };
        Domain::new(self.clone(), aliases)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Returns the target bound to the exact key.
    pub fn handler(&self, domain: &str, method: Method, uri: &str) -> Option<HandlerItem> {
        self.inner.handlers.get(domain, method, uri)
    }

    /// Returns the hooks bound to the exact key, in registration order.
    pub fn hooks(
        &self,
        point: HookPoint,
        domain: &str,
        method: Method,
        uri: &str,
    ) -> Option<Vec<HandlerFunc>> {
        self.inner.hooks.get(point, domain, method, uri)
    }

    /// Number of handler registry entries, one per (verb, URI, domain).
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.len()
    }

    /// Number of hook keys with at least one hook.
    pub fn hook_count(&self) -> usize {
        self.inner.hooks.len()
    }

    /// Every handler key, sorted.
    pub fn handler_keys(&self) -> Vec<CompositeKey> {
        self.inner.handlers.keys()
    }

    /// Allocates the next request id.
    pub fn next_request_id(&self) -> u64 {
        self.inner.next_request_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER)
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("name", &self.inner.name)
            .field("running", &self.is_running())
            .field("handlers", &self.handler_count())
            .field("hooks", &self.hook_count())
            .finish()
    }
}

fn split_aliases(domains: &str) -> Arc<[String]> {
    let mut aliases: Vec<String> = Vec::new();
    for alias in domains.split(',').map(str::trim) {
        if !alias.is_empty() && !aliases.iter().any(|a| a == alias) {
            aliases.push(alias.to_string());
        }
    }
    if aliases.is_empty() {
        aliases.push(DEFAULT_DOMAIN.to_string());
    }
    aliases.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_is_one_way() {
        let server = Server::new("test");
        assert!(!server.is_running());
        server.start().unwrap();
        assert!(server.is_running());
        assert_eq!(server.start(), Err(BindError::AlreadyRunning));
    }

    #[test]
    fn test_setters_before_and_after_start() {
        let server = Server::new("test");
        server.set_addr("127.0.0.1:9000").unwrap();
        server.set_port(9100).unwrap();
        server.set_write_timeout(Duration::from_millis(250)).unwrap();
        server.set_max_header_bytes(4096).unwrap();
        server.set_server_agent("edge").unwrap();

        let config = server.config();
        assert_eq!(config.addr, "127.0.0.1:9100");
        assert_eq!(config.write_timeout(), Duration::from_millis(250));
        assert_eq!(config.max_header_bytes, 4096);
        assert_eq!(config.server_agent, "edge");

        server.start().unwrap();
        assert_eq!(server.set_port(1), Err(BindError::AlreadyRunning));
        assert_eq!(
            server.set_read_timeout(Duration::from_secs(1)),
            Err(BindError::AlreadyRunning)
        );
        assert_eq!(
            server.set_config(ServerConfig::default()),
            Err(BindError::AlreadyRunning)
        );
        assert_eq!(server.config().addr, "127.0.0.1:9100");
    }

    #[test]
    fn test_set_port_without_host() {
        let server = Server::new("test");
        server.set_addr(":80").unwrap();
        server.set_port(8081).unwrap();
        assert_eq!(server.config().addr, "0.0.0.0:8081");
    }

    #[test]
    fn test_set_config_restores_default_agent() {
        let server = Server::new("test");
        server
            .set_config(ServerConfig {
                server_agent: String::new(),
                ..Default::default()
            })
            .unwrap();
        assert!(!server.config().server_agent.is_empty());
    }

    #[test]
    fn test_split_aliases() {
        assert_eq!(&*split_aliases("a.com, b.com"), ["a.com", "b.com"]);
        assert_eq!(&*split_aliases(" a.com,,a.com , b.com "), ["a.com", "b.com"]);
        assert_eq!(&*split_aliases(" , "), [DEFAULT_DOMAIN]);
    }

    #[test]
    fn test_domain_groups_are_cached() {
        let server = Server::new("test");
        let first = server.domain("a.com,b.com");
        let second = server.domain("a.com,b.com");
        assert!(Arc::ptr_eq(&first.aliases_arc(), &second.aliases_arc()));
    }

    #[test]
    fn test_request_ids_increase() {
        let server = Server::new("test");
        let a = server.next_request_id();
        let b = server.next_request_id();
        assert!(b > a);
    }
}
