//! # Server Prelude
//!
//! ```rust
//! use jsonrpc_lb_server::prelude::*;
//! ```

pub use crate::dispatcher::Dispatcher;
pub use crate::error::{RegistryError, ServerError};
pub use crate::registry::{MethodRegistry, ObjectMethods, RpcObject};
pub use crate::server::{RpcServer, RpcServerBuilder, ServerConfig};

pub use jsonrpc_lb_protocol::{EmptyParams, Params};
