//! Transport layer: one POST to one upstream

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;

pub mod http;

pub use http::HttpTransport;

/// A single send attempt.
///
/// Implementations return the raw response body; decoding the envelope is the
/// client's job. Any failure to deliver the request or read the body is a
/// [`TransportError`], which the client treats as retryable.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, address: &str, body: Bytes) -> Result<Bytes, TransportError>;
}

/// Type alias for a shared transport
pub type SharedTransport = std::sync::Arc<dyn Transport>;
