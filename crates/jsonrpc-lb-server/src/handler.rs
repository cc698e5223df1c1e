//! Typed handler adapters
//!
//! Every registered method is wrapped, at registration time, behind the uniform
//! [`MethodHandler`] interface: raw params in, prepared future out. Decoding and
//! validation happen in [`MethodHandler::prepare`]; the returned future runs the
//! handler body.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use std::marker::PhantomData;

use jsonrpc_lb_protocol::Params;

/// Future produced by a prepared handler
pub type HandlerFuture = BoxFuture<'static, Result<Value, InvocationError>>;

/// Why params never reached the handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareError {
    /// Params did not decode into the handler's parameter type
    Decode(String),
    /// Params decoded but `is_valid()` returned false
    InvalidParams,
}

/// Why a handler that did run produced no result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    /// Error returned by the handler on purpose
    Logic(String),
    /// The handler's result could not be serialized
    Result(String),
}

/// Type-erased method handler
pub trait MethodHandler: Send + Sync {
    fn prepare(&self, params: Value) -> Result<HandlerFuture, PrepareError>;
}

/// Adapter from `async fn(P) -> Result<R, E>` to [`MethodHandler`]
pub struct TypedHandler<F, P> {
    handler: F,
    _params: PhantomData<fn(P)>,
}

impl<F, P> TypedHandler<F, P> {
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _params: PhantomData,
        }
    }
}

impl<F, Fut, P, R, E> MethodHandler for TypedHandler<F, P>
where
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    P: Params + DeserializeOwned + 'static,
    R: Serialize + 'static,
    E: Display + 'static,
{
    fn prepare(&self, params: Value) -> Result<HandlerFuture, PrepareError> {
        let params: P =
            serde_json::from_value(params).map_err(|e| PrepareError::Decode(e.to_string()))?;

        if !params.is_valid() {
            return Err(PrepareError::InvalidParams);
        }

        let invocation = (self.handler)(params);
        Ok(async move {
            match invocation.await {
                Ok(result) => serde_json::to_value(result)
                    .map_err(|e| InvocationError::Result(e.to_string())),
                Err(err) => Err(InvocationError::Logic(err.to_string())),
            }
        }
        .boxed())
    }
}
