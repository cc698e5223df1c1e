//! # JSON-RPC Envelope Prelude
//!
//! ```rust
//! use jsonrpc_lb_protocol::prelude::*;
//! ```

pub use crate::error::{JsonRpcErrorCode, JsonRpcErrorObject};
pub use crate::params::{EmptyParams, Params};
pub use crate::request::{IncomingRequest, JsonRpcRequest};
pub use crate::response::JsonRpcResponse;
pub use crate::types::{JsonRpcVersion, RequestId};

// Standard error codes
pub use crate::error_codes::*;
