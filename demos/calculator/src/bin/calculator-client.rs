//! # Calculator Client
//!
//! Calls the calculator through a load-balanced client. Each `--upstream` is one
//! server; calls rotate across them and fail over when one is down.
//!
//! ## Usage
//! ```bash
//! cargo run --bin calculator-client -- \
//!     --upstream http://127.0.0.1:8001/ --upstream http://127.0.0.1:8002/ \
//!     add 2 3
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use calculator_demo::{BinaryParams, CalcResult, CalcStats, SqrtParams};
use jsonrpc_lb_client::{ClientConfig, ClientError, JsonRpcClient, StaticDiscovery};
use jsonrpc_lb_protocol::EmptyParams;

#[derive(Parser)]
#[command(name = "calculator-client")]
#[command(about = "Load-balanced JSON-RPC calculator client")]
struct Args {
    /// Upstream URL, repeatable
    #[arg(long = "upstream", default_value = "http://127.0.0.1:8000/")]
    upstreams: Vec<String>,

    /// Per-attempt timeout in milliseconds
    #[arg(long, default_value = "1000")]
    timeout_ms: u64,

    /// Repeat the call this many times
    #[arg(long, default_value = "1")]
    repeat: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// a + b
    Add { a: f64, b: f64 },
    /// a / b
    Divide { a: f64, b: f64 },
    /// Square root of x
    Sqrt {
        #[arg(allow_negative_numbers = true)]
        x: f64,
    },
    /// Invocation count of the answering upstream
    Stats,
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

    let mut config = ClientConfig::default();
    config.timeouts.request = Duration::from_millis(args.timeout_ms);
    config.timeouts.connect = Duration::from_millis(args.timeout_ms);

    let client = JsonRpcClient::builder(Arc::new(StaticDiscovery::new(args.upstreams.clone())))
        .with_config(config)
        .build()
        .await?;
    info!(upstreams = client.balancer().size(), "Client ready");

    for _ in 0..args.repeat {
        match call(&client, &args.command).await {
            Ok(line) => println!("{}", line),
            Err(err) if err.is_logic() => println!("rejected: {}", err),
            Err(err) => {
                warn!(error = %err, "Call failed on every upstream");
                println!("error: {}", err);
            }
        }
    }

    client.balancer().stop();
    Ok(())
}

async fn call(client: &JsonRpcClient, command: &Command) -> Result<String, ClientError> {
    let line = match *command {
        Command::Add { a, b } => {
            let r: CalcResult = client.send("Calculator.Add", &BinaryParams { a, b }).await?;
            format!("{} + {} = {}", a, b, r.result)
        }
        Command::Divide { a, b } => {
            let r: CalcResult = client
                .send("Calculator.Divide", &BinaryParams { a, b })
                .await?;
            format!("{} / {} = {}", a, b, r.result)
        }
        Command::Sqrt { x } => {
            let r: CalcResult = client.send("Calculator.Sqrt", &SqrtParams { x }).await?;
            format!("sqrt({}) = {}", x, r.result)
        }
        Command::Stats => {
            let s: CalcStats = client.send("Calculator.Stats", &EmptyParams {}).await?;
            format!("calls = {}", s.calls)
        }
    };
    Ok(line)
}
