//! # Load-Balanced JSON-RPC Client
//!
//! A JSON-RPC 2.0 client that asks a pluggable [`Discovery`] source for its
//! upstreams, keeps them in a periodically refreshed pool, and round-robins calls
//! across them.
//!
//! ## Retry policy
//!
//! - A call is attempted against at most as many upstreams as the pool holds
//! - Business-logic errors (code `-32001`) are returned at once and never retried
//! - Transport failures, undecodable responses and every other error code move on
//!   to the next upstream; the last failure is returned when the pool is exhausted
//! - No backoff: retries are immediate
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use jsonrpc_lb_client::{JsonRpcClient, StaticDiscovery};
//! use jsonrpc_lb_protocol::EmptyParams;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let discovery = StaticDiscovery::new(["http://127.0.0.1:8000/"]);
//!     let client = JsonRpcClient::new(Arc::new(discovery)).await?;
//!
//!     let greeting: String = client.send("Greeter.Hello", &EmptyParams {}).await?;
//!     println!("{}", greeting);
//!     Ok(())
//! }
//! ```

pub mod balancer;
pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod transport;

pub mod prelude;

// Re-export main types
pub use balancer::{Balancer, BalancerStatus, MIN_REFRESH_INTERVAL};
pub use client::{JsonRpcClient, JsonRpcClientBuilder, RequestIdGenerator};
pub use config::{BalancerConfig, ClientConfig, ConnectionConfig, TimeoutConfig};
pub use discovery::{Discovery, StaticDiscovery};
pub use error::{ClientError, ClientResult, DiscoveryError, LogicError, TransportError};
pub use transport::{HttpTransport, SharedTransport, Transport};
