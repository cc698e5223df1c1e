//! HTTP front end for the [`Dispatcher`]

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Body;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use jsonrpc_lb_protocol::{JsonRpcErrorObject, JsonRpcResponse, Params};

use crate::dispatcher::Dispatcher;
use crate::registry::{MethodRegistry, RpcObject};
use crate::Result;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Configuration for the RPC server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address `run()` binds to
    pub bind_address: SocketAddr,
    /// Path the RPC endpoint is served on
    pub rpc_path: String,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            rpc_path: "/".to_string(),
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Builder for [`RpcServer`]
#[derive(Debug, Default)]
pub struct RpcServerBuilder {
    config: ServerConfig,
    registry: MethodRegistry,
}

impl RpcServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    pub fn rpc_path(mut self, path: impl Into<String>) -> Self {
        self.config.rpc_path = path.into();
        self
    }

    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Register a standalone handler.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered.
    pub fn register_function<F, Fut, P, R, E>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
        P: Params + DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: Display + 'static,
    {
        self.registry.register_function(name, handler);
        self
    }

    /// Register an object's exported methods under `name`.
    ///
    /// # Panics
    ///
    /// Panics if any resulting method name is already registered.
    pub fn register_object<T: RpcObject>(mut self, name: &str, object: Arc<T>) -> Self {
        self.registry.register_object(name, object);
        self
    }

    /// Replace the registry wholesale, e.g. one built with the `try_` methods
    pub fn registry(mut self, registry: MethodRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> RpcServer {
        RpcServer {
            config: Arc::new(self.config),
            dispatcher: Arc::new(Dispatcher::new(Arc::new(self.registry))),
        }
    }
}

/// JSON-RPC over HTTP/1.1 server
#[derive(Debug, Clone)]
pub struct RpcServer {
    config: Arc<ServerConfig>,
    dispatcher: Arc<Dispatcher>,
}

impl RpcServer {
    pub fn builder() -> RpcServerBuilder {
        RpcServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Bind `config.bind_address` and serve until the process exits
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_address).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        self.serve_with_shutdown(listener, std::future::pending::<()>())
            .await
    }

    /// Serve until `signal` resolves. In-flight connections are left to finish
    /// on their own tasks.
    pub async fn serve_with_shutdown<S>(&self, listener: TcpListener, signal: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        let local_addr = listener.local_addr()?;
        info!("JSON-RPC server listening on {}", local_addr);
        info!(
            "RPC endpoint available at: {} ({} methods)",
            self.config.rpc_path,
            self.dispatcher.registry().len()
        );

        tokio::pin!(signal);

        loop {
            let (stream, peer_addr) = tokio::select! {
                _ = &mut signal => {
                    info!("Shutdown signal received, no longer accepting connections");
                    return Ok(());
                }
                accepted = listener.accept() => accepted?,
            };
            debug!("New connection from {}", peer_addr);

            let server = self.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { Ok::<_, Infallible>(server.handle(req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    let err_str = err.to_string();
                    if err_str.contains("connection closed before message completed") {
                        debug!("Client disconnected (normal): {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }

    /// Answer one HTTP request
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if req.uri().path() != self.config.rpc_path {
            debug!(path = %req.uri().path(), "Unknown path");
            let mut response = Response::new(Full::new(Bytes::from_static(b"Not Found")));
            *response.status_mut() = StatusCode::NOT_FOUND;
            return response;
        }

        if req.method() != Method::POST {
            debug!(method = %req.method(), "Rejecting non-POST request");
            return envelope_response(&self.dispatcher.reject_verb());
        }

        let body = match Limited::new(req.into_body(), self.config.max_body_size)
            .collect()
            .await
        {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                debug!(error = %err, "Failed to read request body");
                let failure =
                    JsonRpcResponse::failure(None, JsonRpcErrorObject::parse_error(err.to_string()));
                return envelope_response(&failure);
            }
        };

        let response = self.dispatcher.dispatch(&body).await;
        envelope_response(&response)
    }
}

fn envelope_response(envelope: &JsonRpcResponse) -> Response<Full<Bytes>> {
    match serde_json::to_vec(envelope) {
        Ok(body) => {
            let mut response = Response::new(Full::new(Bytes::from(body)));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            response
        }
        Err(err) => {
            error!("Failed to serialize response envelope: {}", err);
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpc_lb_protocol::{EmptyParams, error_codes};
    use serde_json::{Value, json};

    fn server() -> RpcServer {
        RpcServer::builder()
            .max_body_size(256)
            .register_function("Ping", |_: EmptyParams| async { Ok::<_, String>("pong") })
            .build()
    }

    fn post(path: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn json_body(response: Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ServerConfig = serde_json::from_str(r#"{"rpc_path": "/rpc"}"#).unwrap();
        assert_eq!(config.rpc_path, "/rpc");
        assert_eq!(config.bind_address.port(), 8000);
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8000");
        assert_eq!(config.rpc_path, "/");
        assert_eq!(config.max_body_size, 1024 * 1024);
    }

    #[tokio::test]
    async fn test_post_dispatches() {
        let response = server()
            .handle(post("/", r#"{"jsonrpc":"2.0","id":"1","method":"Ping","params":{}}"#))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
        assert_eq!(
            json_body(response).await,
            json!({"jsonrpc": "2.0", "id": "1", "result": "pong"})
        );
    }

    #[tokio::test]
    async fn test_get_is_invalid_request() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = server().handle(request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], error_codes::INVALID_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid Request");
        assert_eq!(body["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let response = server().handle(post("/other", "{}")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversize_body_is_parse_error() {
        let big = format!(
            r#"{{"jsonrpc":"2.0","id":1,"method":"Ping","params":{{"pad":"{}"}}}}"#,
            "x".repeat(1024)
        );
        let response = server().handle(post("/", &big)).await;

        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_custom_rpc_path() {
        let server = RpcServer::builder()
            .rpc_path("/rpc")
            .register_function("Ping", |_: EmptyParams| async { Ok::<_, String>("pong") })
            .build();

        let response = server
            .handle(post("/rpc", r#"{"jsonrpc":"2.0","id":1,"method":"Ping","params":{}}"#))
            .await;
        assert_eq!(json_body(response).await["result"], "pong");

        let response = server.handle(post("/", "{}")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_with_shutdown_returns() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let result = server()
            .serve_with_shutdown(listener, async {})
            .await;
        assert!(result.is_ok());
    }
}
