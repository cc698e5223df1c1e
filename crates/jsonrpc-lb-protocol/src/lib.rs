//! # JSON-RPC 2.0 Envelope
//!
//! Wire types shared by `jsonrpc-lb-client` and `jsonrpc-lb-server`. This crate is
//! pure data: no transport, no dispatch.
//!
//! ## Contents
//! - Request and response envelopes
//! - The fixed error-code table, including the custom business-logic code
//! - The [`Params`] capability every handler parameter type implements

pub mod error;
pub mod params;
pub mod request;
pub mod response;
pub mod types;

pub mod prelude;

// Re-export main types
pub use error::{JsonRpcErrorCode, JsonRpcErrorObject};
pub use params::{EmptyParams, Params};
pub use request::{IncomingRequest, JsonRpcRequest};
pub use response::JsonRpcResponse;
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Fixed JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i16 = -32700;
    pub const INVALID_REQUEST: i16 = -32600;
    pub const METHOD_NOT_FOUND: i16 = -32601;
    pub const INVALID_PARAMS: i16 = -32602;
    pub const INTERNAL_ERROR: i16 = -32603;
    pub const SERVER_ERROR: i16 = -32000;

    /// Returned deliberately by a handler. Clients never retry it.
    pub const LOGIC_ERROR: i16 = -32001;
}
