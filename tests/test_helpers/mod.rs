//! Shared fixtures for the integration tests: an `End2End` object, a real
//! server bound to an ephemeral port, and addresses that refuse connections.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use jsonrpc_lb_protocol::{EmptyParams, Params};
use jsonrpc_lb_server::{ObjectMethods, RpcObject, RpcServer};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SumParams {
    pub a: i64,
    pub b: i64,
}

impl Params for SumParams {
    fn is_valid(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumResult {
    pub result: i64,
}

/// Rejects negative operands as invalid params
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositiveParams {
    pub n: i64,
}

impl Params for PositiveParams {
    fn is_valid(&self) -> bool {
        self.n >= 0
    }
}

/// Test object; counts every invocation that reached a handler body
#[derive(Debug, Default)]
pub struct End2End {
    pub invocations: AtomicUsize,
}

impl End2End {
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.invocations.fetch_add(1, Ordering::SeqCst);
    }
}

impl RpcObject for End2End {
    fn register_methods(methods: &mut ObjectMethods<Self>) {
        methods
            .method("EmptyParams", |obj: Arc<End2End>, _: EmptyParams| async move {
                obj.hit();
                Ok::<_, String>("EmptyParams")
            })
            .method("Sum", |obj: Arc<End2End>, p: SumParams| async move {
                obj.hit();
                Ok::<_, String>(SumResult { result: p.a + p.b })
            })
            .method("Logic", |obj: Arc<End2End>, _: EmptyParams| async move {
                obj.hit();
                Err::<(), _>("LogicErrror")
            })
            .method("Panic", |obj: Arc<End2End>, _: EmptyParams| async move {
                obj.hit();
                if true {
                    panic!("Panic");
                }
                Ok::<_, String>(())
            })
            .method("Positive", |obj: Arc<End2End>, p: PositiveParams| async move {
                obj.hit();
                Ok::<_, String>(p.n)
            });
    }
}

/// A server running on its own task
pub struct TestServer {
    pub url: String,
    pub object: Arc<End2End>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let _ = tracing_subscriber::fmt::try_init();

        let object = Arc::new(End2End::default());
        let server = RpcServer::builder()
            .register_object("End2End", Arc::clone(&object))
            .build();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            server
                .serve_with_shutdown(listener, async {
                    let _ = signal.await;
                })
                .await
                .unwrap();
        });

        Self {
            url,
            object,
            shutdown: Some(shutdown),
            task,
        }
    }

    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = (&mut self.task).await;
    }
}

/// URL of a local port with nothing listening on it
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", addr)
}
