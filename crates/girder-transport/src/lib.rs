//! # Girder Transport
//!
//! Network listeners feeding requests into a `girder-server` [`Server`].
//!
//! ## Features
//!
//! - `http-server`: HTTP/1.1 listener built on axum ([`http::listen`],
//!   [`http::serve`])
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Network (TCP/HTTP) │
//! ├─────────────────────┤
//! │  girder-transport   │  <- This crate (Host → domain, body bytes, status)
//! ├─────────────────────┤
//! │  girder-server      │  (Server::dispatch)
//! ├─────────────────────┤
//! │  girder-core        │  (registries, Request/Response)
//! └─────────────────────┘
//! ```
//!
//! The transport knows nothing about routing. It turns each inbound request
//! into a [`Request`](girder_core::Request), hands it to
//! [`Server::dispatch`], and writes back whatever comes out:
//!
//! | Outcome                  | HTTP response                         |
//! |--------------------------|---------------------------------------|
//! | `Handled(resp)`          | `resp.status`, headers and body       |
//! | `NotFound`               | 404                                   |
//! | `write_timeout` exceeded | 503                                   |
//! | unsupported verb         | 405                                   |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use girder_transport::http;
//! use tokio_util::sync::CancellationToken;
//!
//! server.start()?;
//! let shutdown = CancellationToken::new();
//! http::serve(server, shutdown.clone()).await?;
//! ```

pub mod error;
#[cfg(feature = "http-server")]
pub mod http;

use std::net::SocketAddr;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use error::{TransportError, TransportResult};
pub use girder_server::Server;

/// Strips the port from a `Host` header value.
///
/// Bracketed IPv6 literals keep their brackets: `[::1]:8080` → `[::1]`.
pub fn host_to_domain(host: &str) -> &str {
    let host = host.trim();
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Handle to a running listener.
///
/// Dropping the handle does not stop the listener; call
/// [`ListenerHandle::shutdown`] or cancel the token it was started with.
#[derive(Debug)]
pub struct ListenerHandle {
    server: String,
    local_addr: SocketAddr,
    token: CancellationToken,
    task: JoinHandle<TransportResult<()>>,
}

impl ListenerHandle {
    #[cfg_attr(not(feature = "http-server"), allow(dead_code))]
    pub(crate) fn new(
        server: String,
        local_addr: SocketAddr,
        token: CancellationToken,
        task: JoinHandle<TransportResult<()>>,
    ) -> Self {
        Self {
            server,
            local_addr,
            token,
            task,
        }
    }

    /// Name of the server this listener feeds.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// The address the OS actually bound, including an ephemeral port.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Requests a graceful shutdown. In-flight requests are completed.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Waits until the listener has stopped.
    pub async fn wait(self) -> TransportResult<()> {
        self.task
            .await
            .map_err(|e| TransportError::Io(format!("listener task failed: {e}")))?
    }
}
