//! Error types for client operations

use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Everything a `send` can fail with.
///
/// Only [`ClientError::Logic`] stops the retry loop early; every other variant
/// produced by a single attempt moves the client on to the next upstream.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The balancer had no address to hand out
    #[error("no live upstreams")]
    NoLiveUpstreams,

    /// Connection, timeout or DNS failure during one attempt
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The upstream answered with something that is not a response envelope,
    /// or whose result does not fit the caller's type
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// The outgoing envelope could not be serialized
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// Business-logic error returned on purpose by the remote handler
    #[error(transparent)]
    Logic(#[from] LogicError),

    /// Any other error code reported by the server
    #[error("{code}:{message}")]
    Rpc {
        code: i16,
        message: String,
        data: Option<String>,
    },
}

impl ClientError {
    pub fn rpc(code: i16, message: impl Into<String>, data: Option<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
            data,
        }
    }

    pub fn is_logic(&self) -> bool {
        matches!(self, Self::Logic(_))
    }

    /// Whether another upstream may be tried after this failure
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Decode(_) | Self::Rpc { .. } => true,
            Self::NoLiveUpstreams | Self::Encode(_) | Self::Logic(_) => false,
        }
    }

    /// The server-reported code, if the server reported one
    pub fn error_code(&self) -> Option<i16> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            Self::Logic(_) => Some(jsonrpc_lb_protocol::error_codes::LOGIC_ERROR),
            _ => None,
        }
    }
}

/// Business-logic error, displayed as the handler's message verbatim
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LogicError {
    message: String,
}

impl LogicError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Transport-specific errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid upstream address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("connection to {address} failed: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("request to {address} timed out")]
    Timeout { address: String },

    #[error("HTTP transport error from {address}: {reason}")]
    Http { address: String, reason: String },
}

impl TransportError {
    pub fn address(&self) -> &str {
        match self {
            Self::InvalidAddress { address, .. }
            | Self::ConnectionFailed { address, .. }
            | Self::Timeout { address }
            | Self::Http { address, .. } => address,
        }
    }
}

/// Failure reported by a discovery backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("discovery failed: {0}")]
pub struct DiscoveryError(pub String);

impl DiscoveryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
