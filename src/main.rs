//! quick-router demo server.
//!
//! Loads a TOML configuration, initializes logging and metrics, registers a
//! small route set and serves it until Ctrl+C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use quick_router::config::{load_config, ServerConfig};
use quick_router::observability::{logging, metrics};
use quick_router::{Claims, Ctx, HttpServer, JwtAuth, Middleware, Result, Router, Shutdown};

#[derive(Parser)]
#[command(name = "quick-router")]
#[command(about = "Demo server for the quick-router HTTP router", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Customer {
    name: String,
    age: u32,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("quick-router v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    let router = Arc::new(build_router(&config)?);
    for route in router.routes() {
        tracing::debug!(method = %route.method, pattern = %route.pattern, "Serving route");
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, router);
    let server_shutdown = shutdown.subscribe();
    let signals = shutdown.clone();
    tokio::spawn(async move { signals.trigger_on_signal().await });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(config: &ServerConfig) -> std::result::Result<Router, Box<dyn std::error::Error>> {
    let router = Router::new();

    router.use_middleware(|c: &mut Ctx, next: &dyn quick_router::Handler| {
        c.set("Server", "quick-router")?;
        next.call(c)
    });

    router.get("/v1/customer/:id", |c: &mut Ctx| {
        let id = c.param("id").to_string();
        c.json(&serde_json::json!({ "id": id }))
    })?;
    router.get("/reg/{[0-9]+}", |c: &mut Ctx| {
        let digits = c.param("1").to_string();
        c.send_string(digits)
    })?;
    router.post("/bind", |c: &mut Ctx| {
        let customer: Customer = c.bind()?;
        c.json(&customer)
    })?;

    if let Some(settings) = &config.auth {
        let auth: JwtAuth = JwtAuth::from_settings(settings)?;
        router.get("/private/whoami", move |c: &mut Ctx| auth.call(c, &whoami))?;
    }

    Ok(router)
}

fn whoami(c: &mut Ctx) -> Result<()> {
    let claims = c.local::<Claims<serde_json::Value>>().map(|claims| claims.0.clone());
    c.json(&claims)
}
