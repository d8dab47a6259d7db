use anyhow::Context;
use clap::{Parser, ValueEnum};
use statuspage_mcp_rust::mcp::sse::SharedSessionTracker;
use statuspage_mcp_rust::mcp::stdio::serve_stdio;
use statuspage_mcp_rust::mcp::{AppState, Bridge, BridgeOptions, ToolRegistry};
use statuspage_mcp_rust::router::create_app_router;
use statuspage_mcp_rust::statuspage::{register_statuspage_tools, StatusPageConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Line-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// JSON-RPC over POST plus an SSE channel
    Http,
}

/// MCP bridge for status page incident management
#[derive(Debug, Parser)]
#[command(name = "statuspage-mcp", version)]
struct Cli {
    #[arg(long, value_enum, env = "MCP_TRANSPORT", default_value_t = Transport::Http)]
    transport: Transport,

    /// Port for the HTTP transport
    #[arg(long, env = "PORT", default_value_t = 6500)]
    port: u16,

    /// Seconds between SSE heartbeats
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    heartbeat_secs: u64,

    /// Do not push the tool listing when an SSE session opens
    #[arg(long)]
    no_discovery_push: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment; a missing file is fine
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    // Logs go to stderr so stdout stays free for the stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = StatusPageConfig::from_env();
    config.log_summary();

    let mut registry = ToolRegistry::new();
    register_statuspage_tools(&mut registry);
    info!(tools = ?registry.names(), "Tools registered");

    let bridge = Bridge::new(registry, config);

    match cli.transport {
        Transport::Stdio => serve_stdio(&bridge).await?,
        Transport::Http => serve_http(bridge, &cli).await?,
    }

    Ok(())
}

async fn serve_http(bridge: Bridge, cli: &Cli) -> anyhow::Result<()> {
    let options = BridgeOptions::default()
        .with_heartbeat_interval(Duration::from_secs(cli.heartbeat_secs))
        .with_discovery_push(!cli.no_discovery_push);

    // Initialize application state
    let state = Arc::new(AppState::new(bridge.with_streaming(true), options));
    let sessions = state.sessions.clone();

    // Build application router with all routes and middleware
    let app = create_app_router(state);

    // Configure the server address
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sessions))
        .await
        .context("HTTP server failed")?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, closing open SSE sessions so the server can drain.
async fn shutdown_signal(sessions: SharedSessionTracker) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            error!(error = %e, "Failed to listen for shutdown signal; serving until killed");
            std::future::pending::<()>().await;
        }
    }
    sessions.shutdown_all();
}
