//! HTTP transport backed by reqwest

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::transport::Transport;

/// POSTs envelopes over HTTP with a fixed per-attempt timeout
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client
    client: Client,
    /// Content type sent with each request
    content_type: String,
}

impl HttpTransport {
    /// Create a transport from client configuration
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .timeout(config.timeouts.request)
            .connect_timeout(config.timeouts.connect);

        if let Some(user_agent) = &config.connection.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().map_err(|e| TransportError::Http {
            address: String::new(),
            reason: format!("Failed to create HTTP client: {}", e),
        })?;

        Ok(Self::with_client(client, &config.connection.content_type))
    }

    /// Create HTTP transport with custom client
    pub fn with_client(client: Client, content_type: &str) -> Self {
        Self {
            client,
            content_type: content_type.to_string(),
        }
    }

    fn classify(address: &str, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                address: address.to_string(),
            }
        } else if err.is_connect() {
            TransportError::ConnectionFailed {
                address: address.to_string(),
                reason: err.to_string(),
            }
        } else {
            TransportError::Http {
                address: address.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, address: &str, body: Bytes) -> Result<Bytes, TransportError> {
        let url = Url::parse(address).map_err(|e| TransportError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, self.content_type.as_str())
            .body(body)
            .send()
            .await
            .map_err(|e| Self::classify(address, e))?;

        // The status is not inspected: JSON-RPC errors travel in the body.
        debug!(address, status = %response.status(), "Upstream responded");

        response
            .bytes()
            .await
            .map_err(|e| Self::classify(address, e))
    }
}
