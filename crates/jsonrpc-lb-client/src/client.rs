//! Load-balanced JSON-RPC client

use bytes::Bytes;
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};
use uuid::Uuid;

use jsonrpc_lb_protocol::{JsonRpcRequest, JsonRpcResponse, Params, RequestId};

use crate::balancer::Balancer;
use crate::config::ClientConfig;
use crate::discovery::Discovery;
use crate::error::{ClientError, ClientResult, LogicError};
use crate::transport::{HttpTransport, SharedTransport};

/// Per-client request id source.
///
/// Ids look like `"3f9c2a7d01be-17"`: a random instance prefix plus a counter, so
/// overlapping calls of one client never share an id.
#[derive(Debug)]
pub struct RequestIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        let mut prefix = Uuid::new_v4().simple().to_string();
        prefix.truncate(12);
        Self {
            prefix,
            counter: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> RequestId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        RequestId::String(format!("{}-{}", self.prefix, n))
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`JsonRpcClient`]
pub struct JsonRpcClientBuilder {
    discovery: Arc<dyn Discovery>,
    transport: Option<SharedTransport>,
    config: ClientConfig,
}

impl JsonRpcClientBuilder {
    pub fn new(discovery: Arc<dyn Discovery>) -> Self {
        Self {
            discovery,
            transport: None,
            config: ClientConfig::default(),
        }
    }

    /// Replace the default HTTP transport
    pub fn with_transport(mut self, transport: SharedTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the balancer and start its refresh task
    pub async fn build(self) -> ClientResult<JsonRpcClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };

        let balancer = Balancer::start(self.discovery, self.config.balancer.clone()).await;

        Ok(JsonRpcClient {
            balancer,
            transport,
            ids: RequestIdGenerator::new(),
        })
    }
}

/// JSON-RPC client that round-robins calls over discovered upstreams.
///
/// A call is tried against at most `balancer.size()` upstreams. Business-logic
/// errors end the call immediately; every other failure moves on to the next
/// address and the last one is returned once all are exhausted.
pub struct JsonRpcClient {
    balancer: Balancer,
    transport: SharedTransport,
    ids: RequestIdGenerator,
}

impl JsonRpcClient {
    /// Client with default configuration over HTTP
    pub async fn new(discovery: Arc<dyn Discovery>) -> ClientResult<Self> {
        JsonRpcClientBuilder::new(discovery).build().await
    }

    pub fn builder(discovery: Arc<dyn Discovery>) -> JsonRpcClientBuilder {
        JsonRpcClientBuilder::new(discovery)
    }

    pub fn balancer(&self) -> &Balancer {
        &self.balancer
    }

    /// Call `method` and decode the result into `R`
    pub async fn send<P, R>(&self, method: &str, params: &P) -> ClientResult<R>
    where
        P: Params + Serialize,
        R: DeserializeOwned,
    {
        let body = self.encode(method, params)?;

        let attempts = self.balancer.size();
        if attempts == 0 {
            return Err(ClientError::NoLiveUpstreams);
        }

        let mut last_error = ClientError::NoLiveUpstreams;
        for attempt in 1..=attempts {
            let address = self.balancer.next()?;
            debug!(method, attempt, address = %address, "Sending JSON-RPC request");

            match self.send_one::<R>(&address, body.clone()).await {
                Ok(result) => return Ok(result),
                Err(err) if err.is_logic() => return Err(err),
                Err(err) => {
                    debug!(method, attempt, address = %address, error = %err, "Attempt failed");
                    last_error = err;
                }
            }
        }

        warn!(method, attempts, error = %last_error, "All upstreams failed");
        Err(last_error)
    }

    /// Call `method` and ignore whatever result comes back
    pub async fn send_discarding<P>(&self, method: &str, params: &P) -> ClientResult<()>
    where
        P: Params + Serialize,
    {
        self.send::<P, IgnoredAny>(method, params).await.map(|_| ())
    }

    fn encode<P: Serialize>(&self, method: &str, params: &P) -> ClientResult<Bytes> {
        let request = JsonRpcRequest::new(self.ids.next_id(), method, params);
        serde_json::to_vec(&request)
            .map(Bytes::from)
            .map_err(ClientError::Encode)
    }

    /// One attempt against one upstream
    async fn send_one<R: DeserializeOwned>(&self, address: &str, body: Bytes) -> ClientResult<R> {
        let raw = self.transport.post(address, body).await?;

        let response: JsonRpcResponse =
            serde_json::from_slice(&raw).map_err(ClientError::Decode)?;

        match response.into_outcome() {
            Ok(result) => serde_json::from_value(result).map_err(ClientError::Decode),
            Err(error) if error.is_logic() => Err(LogicError::new(error.message).into()),
            Err(error) => Err(ClientError::rpc(error.code, error.message, error.data)),
        }
    }
}

impl std::fmt::Debug for JsonRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcClient")
            .field("balancer", &self.balancer)
            .finish()
    }
}
