//! # Client Prelude
//!
//! ```rust
//! use jsonrpc_lb_client::prelude::*;
//! ```

pub use crate::balancer::{Balancer, BalancerStatus};
pub use crate::client::{JsonRpcClient, JsonRpcClientBuilder};
pub use crate::config::ClientConfig;
pub use crate::discovery::{Discovery, StaticDiscovery};
pub use crate::error::{ClientError, ClientResult, DiscoveryError, LogicError, TransportError};
pub use crate::transport::{HttpTransport, Transport};

pub use jsonrpc_lb_protocol::{EmptyParams, Params};
