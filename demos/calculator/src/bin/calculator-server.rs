//! # Calculator Server
//!
//! Serves the `Calculator` object over JSON-RPC.
//!
//! ## Usage
//! ```bash
//! cargo run --bin calculator-server -- --port 8000
//! # Several upstreams for the client to balance across:
//! cargo run --bin calculator-server -- --port 8001 &
//! cargo run --bin calculator-server -- --port 8002 &
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use calculator_demo::{Calculator, OBJECT_NAME};
use jsonrpc_lb_server::RpcServer;

#[derive(Parser)]
#[command(name = "calculator-server")]
#[command(about = "JSON-RPC calculator server")]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value = "8000")]
    port: u16,

    /// Endpoint path
    #[arg(long, default_value = "/")]
    path: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let bind_address: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    let server = RpcServer::builder()
        .bind_address(bind_address)
        .rpc_path(args.path)
        .register_object(OBJECT_NAME, Arc::new(Calculator::new()))
        .build();

    info!(
        methods = ?server.dispatcher().registry().methods(),
        "Starting calculator server"
    );

    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    server
        .serve_with_shutdown(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Calculator server stopped");
    Ok(())
}
