use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{JsonRpcVersion, RequestId};

/// An outgoing JSON-RPC request with typed parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest<P> {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: RequestId,
    pub method: String,
    pub params: P,
}

impl<P> JsonRpcRequest<P> {
    pub fn new(id: RequestId, method: impl Into<String>, params: P) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            method: method.into(),
            params,
        }
    }
}

/// A request as the server reads it: params stay raw until the handler's
/// parameter type is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingRequest {
    #[serde(rename = "jsonrpc", default = "JsonRpcVersion::missing")]
    pub version: JsonRpcVersion,
    #[serde(default)]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl IncomingRequest {
    /// Raw params payload, `null` when the member was absent
    pub fn raw_params(&self) -> Value {
        self.params.clone().unwrap_or(Value::Null)
    }

    pub fn take_params(&mut self) -> Value {
        self.params.take().unwrap_or(Value::Null)
    }
}
