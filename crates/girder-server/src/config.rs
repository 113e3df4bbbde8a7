//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Listener and dispatch settings of a single server.
///
/// Every field has a default, so a partial config section deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Maximum time to read a request, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Maximum time to produce a response, in milliseconds. `0` disables
    /// the deadline.
    #[serde(default = "default_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Keep-alive idle time between requests, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Maximum size of the request head, in bytes.
    #[serde(default = "default_max_header_bytes")]
    pub max_header_bytes: usize,

    /// Value of the `Server` response header.
    #[serde(default = "default_server_agent")]
    pub server_agent: String,

    /// Whether requests for an unbound domain are resolved against the
    /// `default` domain.
    #[serde(default = "default_fallback")]
    pub fallback_to_default_domain: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            read_timeout_ms: default_timeout_ms(),
            write_timeout_ms: default_timeout_ms(),
            idle_timeout_ms: default_timeout_ms(),
            max_header_bytes: default_max_header_bytes(),
            server_agent: default_server_agent(),
            fallback_to_default_domain: default_fallback(),
        }
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Fills fields that must never be empty with their defaults.
    pub(crate) fn normalized(mut self) -> Self {
        if self.server_agent.is_empty() {
            self.server_agent = default_server_agent();
        }
        self
    }
}

fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_max_header_bytes() -> usize {
    1 << 20
}

/// Default `Server` header value.
pub fn default_server_agent() -> String {
    format!("girder/{}", env!("CARGO_PKG_VERSION"))
}

fn default_fallback() -> bool {
    true
}

/// Converts a duration to whole milliseconds, saturating.
pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
