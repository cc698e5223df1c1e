use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Correlation token echoed from request to response
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => f.write_str(s),
            RequestId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        RequestId::String(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        RequestId::String(value.to_string())
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        RequestId::Number(value)
    }
}

/// The `jsonrpc` member of an envelope.
///
/// Outgoing envelopes always carry `"2.0"`. Incoming envelopes are not rejected for
/// a different (or missing) version string; the raw value is kept in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JsonRpcVersion {
    #[default]
    V2_0,
    Other(String),
}

impl JsonRpcVersion {
    pub fn as_str(&self) -> &str {
        match self {
            JsonRpcVersion::V2_0 => crate::JSONRPC_VERSION,
            JsonRpcVersion::Other(raw) => raw,
        }
    }

    pub fn is_v2(&self) -> bool {
        matches!(self, JsonRpcVersion::V2_0)
    }

    /// Value used when an incoming envelope has no `jsonrpc` member
    pub fn missing() -> Self {
        JsonRpcVersion::Other(String::new())
    }
}

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if raw == crate::JSONRPC_VERSION {
            Ok(JsonRpcVersion::V2_0)
        } else {
            Ok(JsonRpcVersion::Other(raw))
        }
    }
}
