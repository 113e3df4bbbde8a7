//! Configuration validation utilities.

use std::net::SocketAddr;

use girder_server::ServerConfig;
use tracing_subscriber::filter::Directive;

use super::error::{ConfigError, ConfigResult};
use super::schema::{GirderConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &GirderConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;

    let mut names: Vec<_> = config.servers.keys().collect();
    names.sort();
    for name in names {
        validate_server_config(name, &config.servers[name])?;
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    for (target, level) in &logging.filters {
        let directive = format!("{target}={level}");
        let valid_target = !target.is_empty()
            && target
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-'));
        if !valid_target || directive.parse::<Directive>().is_err() {
            return Err(ConfigError::validation(format!(
                "Invalid log filter: {directive}"
            )));
        }
    }

    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

fn validate_server_config(name: &str, server: &ServerConfig) -> ConfigResult<()> {
    if name.is_empty() {
        return Err(ConfigError::missing_field("servers.<name>"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Server name cannot contain whitespace: '{name}'"
        )));
    }

    validate_addr(name, &server.addr)?;

    // write_timeout_ms may be 0, which disables the response deadline.
    for (field, value) in [
        ("read_timeout_ms", server.read_timeout_ms),
        ("idle_timeout_ms", server.idle_timeout_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::validation(format!(
                "servers.{name}.{field} must be greater than 0"
            )));
        }
    }

    if server.max_header_bytes == 0 {
        return Err(ConfigError::validation(format!(
            "servers.{name}.max_header_bytes must be greater than 0"
        )));
    }
    Ok(())
}

/// Accepts socket addresses and `hostname:port`.
fn validate_addr(server: &str, addr: &str) -> ConfigResult<()> {
    if addr.parse::<SocketAddr>().is_ok() {
        return Ok(());
    }
    let valid = match addr.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty()
                && !host.contains([' ', '[', ']'])
                && port.parse::<u16>().is_ok()
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidAddr {
            server: server.to_string(),
            addr: addr.to_string(),
        })
    }
}
