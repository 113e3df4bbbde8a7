//! The application: named servers built from configuration.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use girder_runtime::App;
//!
//! // Loads girder.toml from the current directory, or defaults.
//! let app = App::new();
//! app.server("default").bind_function("GET:/ping", |_req| async { "pong" })?;
//! app.run().await?;
//!
//! // Explicit configuration
//! let app = App::builder()
//!     .config_file("config/girder.toml")
//!     .profile("production")
//!     .build()?;
//! ```

use std::collections::BTreeMap;
use std::future::Future;

use futures::future::join_all;
use girder_server::{DEFAULT_SERVER, Server};
use girder_transport::ListenerHandle;
use parking_lot::Mutex;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
#[cfg(not(feature = "http-server"))]
use tracing::warn;

use crate::config::{ConfigLoader, GirderConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Owns every server of the process.
///
/// [`App::server`] hands out the server with a given name, creating it on
/// first use from the matching `[servers.<name>]` section. Servers are cheap
/// handles; binding through any clone affects the same server.
pub struct App {
    config: GirderConfig,
    servers: Mutex<BTreeMap<String, Server>>,
    shutdown: CancellationToken,
}

impl App {
    /// Creates an app from `girder.toml` in the current directory.
    ///
    /// Falls back to defaults when loading fails.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                GirderConfig::default()
            });
        Self::from_config(config)
    }

    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Creates an app from an already loaded configuration and initializes
    /// logging from it.
    pub fn from_config(config: GirderConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            configured_servers = config.servers.len(),
            "App initialized from configuration"
        );

        Self {
            config,
            servers: Mutex::new(BTreeMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &GirderConfig {
        &self.config
    }

    /// Returns the server named `name`, creating it if needed.
    pub fn server(&self, name: &str) -> Server {
        let mut servers = self.servers.lock();
        if let Some(server) = servers.get(name) {
            return server.clone();
        }

        let server = match self.config.server(name) {
            Some(config) => Server::with_config(name, config.clone()),
            None => {
                debug!(server = name, "No configuration for server, using defaults");
                Server::new(name)
            }
        };
        servers.insert(name.to_string(), server.clone());
        server
    }

    /// The server named `default`.
    pub fn default_server(&self) -> Server {
        self.server(DEFAULT_SERVER)
    }

    /// All servers created so far, ordered by name.
    pub fn servers(&self) -> Vec<Server> {
        self.servers.lock().values().cloned().collect()
    }

    /// A token cancelled when the app shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Moves every server to the running state.
    ///
    /// Servers already running are left alone.
    pub fn start(&self) -> RuntimeResult<()> {
        for server in self.servers() {
            if server.is_running() {
                continue;
            }
            server
                .start()
                .map_err(|e| RuntimeError::server(server.name(), e))?;
        }
        Ok(())
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        let listeners = self.start_listeners().await?;
        info!("Girder is now running. Press Ctrl+C to stop.");

        let signalled = tokio::select! {
            result = wait_for_signal() => result,
            _ = self.shutdown.cancelled() => Ok(()),
        };
        self.stop(listeners).await?;
        signalled
    }

    /// Runs until `shutdown` completes.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let listeners = self.start_listeners().await?;

        tokio::select! {
            _ = shutdown => {}
            _ = self.shutdown.cancelled() => {}
        }
        self.stop(listeners).await
    }

    /// Starts every server and, with `http-server`, one listener per server.
    #[allow(unused_mut)]
    async fn start_listeners(&self) -> RuntimeResult<Vec<ListenerHandle>> {
        if self.servers.lock().is_empty() {
            self.default_server();
        }
        self.start()?;

        let mut listeners = Vec::new();

        #[cfg(feature = "http-server")]
        {
            for server in self.servers() {
                match girder_transport::http::listen(server, self.shutdown.child_token()).await {
                    Ok(handle) => listeners.push(handle),
                    Err(e) => {
                        self.shutdown.cancel();
                        join_all(listeners.into_iter().map(ListenerHandle::wait)).await;
                        return Err(e.into());
                    }
                }
            }
        }

        #[cfg(not(feature = "http-server"))]
        {
            warn!("No transport enabled, servers only accept in-process dispatch");
        }

        Ok(listeners)
    }

    async fn stop(&self, listeners: Vec<ListenerHandle>) -> RuntimeResult<()> {
        info!("Stopping Girder");
        self.shutdown.cancel();

        let mut first_error = None;
        let servers: Vec<String> = listeners.iter().map(|l| l.server().to_string()).collect();
        let results = join_all(listeners.into_iter().map(ListenerHandle::wait)).await;
        for (server, result) in servers.iter().zip(results) {
            if let Err(e) = result {
                error!(server = %server, error = %e, "Listener stopped with error");
                first_error.get_or_insert(e);
            }
        }

        info!("Girder stopped");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for Ctrl+C or SIGTERM.
async fn wait_for_signal() -> RuntimeResult<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

// =============================================================================
// AppBuilder
// =============================================================================

/// Builder for an [`App`] with custom configuration sources.
pub struct AppBuilder {
    config_loader: ConfigLoader,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    pub fn merge(mut self, config: GirderConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    pub fn set<T: serde::Serialize>(mut self, key: &str, value: T) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    /// Loads and validates the configuration, then builds the app.
    pub fn build(self) -> RuntimeResult<App> {
        let config = self.config_loader.load()?;
        validate_config(&config)?;
        Ok(App::from_config(config))
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
