//! HTTP/1.1 listener built on axum.
//!
//! One listener per [`Server`]. The axum router has a single fallback route,
//! so every method and path reaches [`Server::dispatch`]; routing is entirely
//! the server's business.

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderValue, Method as HttpMethod, StatusCode, Uri, header},
    response::{IntoResponse, Response as HttpResponse},
};
use girder_core::{DEFAULT_DOMAIN, Method, Request, Response};
use girder_server::{DispatchOutcome, Server};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{TransportError, TransportResult};
use crate::{ListenerHandle, host_to_domain};

/// Binds the server's configured address and serves it in a background
/// task until `shutdown` is cancelled.
///
/// # Errors
///
/// [`TransportError::NotStarted`] if the server is still configuring,
/// [`TransportError::Bind`] if the address cannot be bound.
pub async fn listen(server: Server, shutdown: CancellationToken) -> TransportResult<ListenerHandle> {
    if !server.is_running() {
        return Err(TransportError::NotStarted(server.name().to_string()));
    }

    let addr = server.config().addr;
    let listener = TcpListener::bind(addr.as_str())
        .await
        .map_err(|e| TransportError::Bind {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;
    let local_addr = listener.local_addr()?;
    let name = server.name().to_string();

    info!(server = %name, addr = %local_addr, "HTTP server listening");

    let router = Router::new().fallback(handle).with_state(server);
    let token = shutdown.clone();
    let task_name = name.clone();
    let task = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(token.cancelled_owned())
            .await;
        match result {
            Ok(()) => {
                info!(server = %task_name, addr = %local_addr, "HTTP server stopped");
                Ok(())
            }
            Err(e) => {
                error!(server = %task_name, error = %e, "HTTP server error");
                Err(TransportError::from(e))
            }
        }
    });

    Ok(ListenerHandle::new(name, local_addr, shutdown, task))
}

/// Serves the server until `shutdown` is cancelled.
pub async fn serve(server: Server, shutdown: CancellationToken) -> TransportResult<()> {
    listen(server, shutdown).await?.wait().await
}

/// The single axum fallback handler.
async fn handle(
    State(server): State<Server>,
    method: HttpMethod,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> HttpResponse {
    let Some(verb) = Method::from_token(method.as_str()) else {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    };

    let req = build_request(verb, &uri, &headers, body);
    let config = server.config();
    let agent = config.server_agent.clone();

    // A zero write timeout disables the deadline.
    let outcome = if config.write_timeout_ms == 0 {
        Ok(server.dispatch(req).await)
    } else {
        tokio::time::timeout(config.write_timeout(), server.dispatch(req)).await
    };

    match outcome {
        Ok(DispatchOutcome::Handled(resp)) => into_http(resp),
        Ok(DispatchOutcome::NotFound) => with_agent(StatusCode::NOT_FOUND, &agent),
        Err(_) => {
            warn!(
                server = %server.name(),
                uri = %uri,
                timeout_ms = config.write_timeout_ms,
                "Request exceeded write timeout"
            );
            with_agent(StatusCode::SERVICE_UNAVAILABLE, &agent)
        }
    }
}

fn build_request(verb: Method, uri: &Uri, headers: &HeaderMap, body: Bytes) -> Request {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.host())
        .unwrap_or(DEFAULT_DOMAIN);

    let mut req = Request::new(verb, host_to_domain(host), uri.path())
        .with_query(uri.query().unwrap_or_default());
    for (name, value) in headers {
        if let Ok(v) = value.to_str() {
            req = req.with_header(name.as_str(), v);
        }
    }
    req.with_body(body.to_vec())
}

fn into_http(resp: Response) -> HttpResponse {
    let Response {
        status,
        headers,
        body,
    } = resp;

    let mut builder = axum::http::Response::builder().status(status);
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(body)).unwrap_or_else(|e| {
        error!(status, error = %e, "Handler produced an invalid response");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

fn with_agent(status: StatusCode, agent: &str) -> HttpResponse {
    let mut resp = status.into_response();
    if let Ok(value) = HeaderValue::from_str(agent) {
        resp.headers_mut().insert(header::SERVER, value);
    }
    resp
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use super::*;

    fn loopback(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    async fn roundtrip(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        String::from_utf8_lossy(&out).into_owned()
    }

    fn test_server() -> Server {
        let server = Server::new("http-test");
        server.set_addr(loopback(0).to_string()).unwrap();
        server.set_write_timeout(Duration::from_millis(200)).unwrap();
        server
            .bind_function("GET:/ping@a.com", |req: Arc<Request>| async move {
                format!("pong from {}", req.domain())
            })
            .unwrap();
        server
            .bind_function("/slow", |_req: Arc<Request>| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            })
            .unwrap();
        server.start().unwrap();
        server
    }

    #[tokio::test]
    async fn test_listen_requires_started_server() {
        let server = Server::new("idle");
        let result = listen(server, CancellationToken::new()).await;
        assert!(matches!(result, Err(TransportError::NotStarted(_))));
    }

    #[tokio::test]
    async fn test_host_header_selects_domain() {
        let shutdown = CancellationToken::new();
        let handle = listen(test_server(), shutdown.clone()).await.unwrap();
        let addr = handle.local_addr();

        let found = roundtrip(
            addr,
            "GET /ping HTTP/1.1\r\nHost: A.com:8080\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(found.starts_with("HTTP/1.1 200"), "{found}");
        assert!(found.ends_with("pong from A.com"), "{found}");

        let missing = roundtrip(
            addr,
            "GET /ping HTTP/1.1\r\nHost: b.com\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

        handle.shutdown();
        handle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_write_timeout_returns_503() {
        let shutdown = CancellationToken::new();
        let handle = listen(test_server(), shutdown.clone()).await.unwrap();

        let resp = roundtrip(
            handle.local_addr(),
            "POST /slow HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(resp.starts_with("HTTP/1.1 503"), "{resp}");

        shutdown.cancel();
        handle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_write_timeout_disables_deadline() {
        let server = Server::new("no-deadline");
        server.set_addr(loopback(0).to_string()).unwrap();
        server.set_write_timeout(Duration::ZERO).unwrap();
        server
            .bind_function("GET:/ping", |_req: Arc<Request>| async {
                tokio::task::yield_now().await;
                tokio::time::sleep(Duration::from_millis(1)).await;
                "pong"
            })
            .unwrap();
        server.start().unwrap();

        let shutdown = CancellationToken::new();
        let handle = listen(server, shutdown.clone()).await.unwrap();
        let resp = roundtrip(
            handle.local_addr(),
            "GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(resp.starts_with("HTTP/1.1 200"), "{resp}");
        assert!(resp.ends_with("pong"), "{resp}");

        shutdown.cancel();
        handle.wait().await.unwrap();
    }
}
