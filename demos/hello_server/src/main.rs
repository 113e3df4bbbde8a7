//! Hello Server Example
//!
//! Binds one of each kind of target on the `default` server:
//!
//! ```text
//! GET  /ping                  function
//! ALL  /user/list/            object method      (UserApi::list)
//! ALL  /user/profile/         object method      (UserApi::profile)
//! GET  /cart                  controller REST    (Cart::get)
//! POST /cart                  controller REST    (Cart::post)
//! ALL  /admin/stats           function, Init hook requires `x-admin-token`
//! GET  /docs   @docs.local    domain-only route
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package hello-server -- --config demos/hello_server/girder.toml
//! curl -H 'Host: docs.local' http://127.0.0.1:8080/docs
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use clap::Parser;
use girder::prelude::*;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(about = "Girder hello server")]
struct Args {
    /// Configuration file; girder.toml in the working directory otherwise.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Configuration profile.
    #[arg(long, default_value = "development")]
    profile: String,
}

// ============================================================================
// Object: one shared instance serves every request
// ============================================================================

struct UserApi {
    hits: AtomicU64,
}

#[object]
impl UserApi {
    pub fn list(&self, _req: Arc<Request>) -> &'static str {
        self.hits.fetch_add(1, Ordering::Relaxed);
        "ann,bob"
    }

    pub async fn profile(&self, req: Arc<Request>) -> (u16, String) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        match req.query_param("name") {
            Some(name) => (200, format!("profile of {name}")),
            None => (400, "missing ?name=".to_string()),
        }
    }
}

// ============================================================================
// Controller: a fresh instance per request
// ============================================================================

#[derive(Default)]
struct Cart {
    owner: String,
}

impl Controller for Cart {}

#[controller]
impl Cart {
    pub async fn get(&mut self, req: Arc<Request>) {
        self.owner = req.header("x-user").unwrap_or("guest").to_string();
        req.write(format!("cart of {}", self.owner));
    }

    pub async fn post(&mut self, req: Arc<Request>) -> (u16, String) {
        (201, format!("added {} bytes", req.body().len()))
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = App::builder().profile(args.profile);
    if let Some(path) = args.config {
        builder = builder.config_file(path);
    }
    let app = builder.build()?;
    let server = app.default_server();

    server.bind_function("GET:/ping", |_req: Arc<Request>| async { "pong" })?;
    server.bind_object(
        "/user",
        Arc::new(UserApi {
            hits: AtomicU64::new(0),
        }),
    )?;
    server.bind_controller_rest::<Cart>("/cart")?;

    server.bind_hook_init("/admin/stats", |req: Arc<Request>| async move {
        if req.header("x-admin-token").is_none() {
            warn!(uri = req.uri(), "Rejected admin request");
            req.set_status(403);
        }
    })?;
    server.bind_function("/admin/stats", |req: Arc<Request>| async move {
        if req.status() == 403 {
            return String::from("forbidden");
        }
        format!("requests so far: {}", req.id())
    })?;

    server
        .domain("docs.local, www.docs.local")
        .bind_function("GET:/docs", |req: Arc<Request>| async move {
            format!("docs served for {}", req.domain())
        })?;

    info!(
        handlers = server.handler_count(),
        hooks = server.hook_count(),
        "Routes bound"
    );

    app.run().await?;
    Ok(())
}
