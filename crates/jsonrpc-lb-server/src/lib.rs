//! # JSON-RPC 2.0 HTTP Server
//!
//! Methods are registered up front, either as standalone async functions or as
//! the exported methods of an [`RpcObject`]. Each handler takes one parameter
//! type implementing [`Params`](jsonrpc_lb_protocol::Params) and returns
//! `Result<R, E>`; an `Err` becomes a business-logic error (`-32001`) carrying
//! `E`'s message.
//!
//! A panicking handler fails only its own request (`Internal error`, with the
//! panic message in `data`); the server keeps serving.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jsonrpc_lb_protocol::EmptyParams;
//! use jsonrpc_lb_server::RpcServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = RpcServer::builder()
//!         .bind_address("127.0.0.1:8000".parse()?)
//!         .register_function("Health.Ping", |_: EmptyParams| async {
//!             Ok::<_, String>("pong")
//!         })
//!         .build();
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod registry;
pub mod server;

pub mod prelude;

// Re-export main types
pub use dispatcher::{DispatchStage, Dispatcher};
pub use error::{RegistryError, Result, ServerError};
pub use handler::{HandlerFuture, InvocationError, MethodHandler, PrepareError, TypedHandler};
pub use registry::{MethodRegistry, ObjectMethods, RpcObject};
pub use server::{RpcServer, RpcServerBuilder, ServerConfig};
