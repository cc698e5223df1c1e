//! Request pipeline: parse, route, decode, validate, invoke, respond.
//!
//! Every failure along the way, including a handler panic, ends up as an error
//! envelope for that one request. Nothing escapes [`Dispatcher::dispatch`].

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, warn};

use jsonrpc_lb_protocol::{IncomingRequest, JsonRpcErrorObject, JsonRpcResponse, RequestId};

use crate::handler::{InvocationError, PrepareError};
use crate::registry::MethodRegistry;

/// Pipeline stages. Every finished request is logged with the last stage it
/// completed: a success reaches `Responded`, a failure stops at the stage before
/// the one that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Received,
    Parsed,
    Routed,
    Decoded,
    Validated,
    Invoked,
    Responded,
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchStage::Received => "received",
            DispatchStage::Parsed => "parsed",
            DispatchStage::Routed => "routed",
            DispatchStage::Decoded => "decoded",
            DispatchStage::Validated => "validated",
            DispatchStage::Invoked => "invoked",
            DispatchStage::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// Turns request bodies into response envelopes using a [`MethodRegistry`]
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<MethodRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Response for any HTTP verb other than POST
    pub fn reject_verb(&self) -> JsonRpcResponse {
        JsonRpcResponse::failure(None, JsonRpcErrorObject::invalid_request())
    }

    /// Handle one request body.
    pub async fn dispatch(&self, body: &[u8]) -> JsonRpcResponse {
        let (response, stage) = self.run(body).await;
        debug!(
            stage = %stage,
            failed = response.is_error(),
            "Request finished"
        );
        response
    }

    async fn run(&self, body: &[u8]) -> (JsonRpcResponse, DispatchStage) {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Rejecting unparseable body");
                return (
                    JsonRpcResponse::failure(None, JsonRpcErrorObject::parse_error(e.to_string())),
                    DispatchStage::Received,
                );
            }
        };

        // The id is echoed even when the envelope itself turns out to be malformed
        let id = extract_id(&value);

        let mut request: IncomingRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return (
                    JsonRpcResponse::failure(id, JsonRpcErrorObject::parse_error(e.to_string())),
                    DispatchStage::Received,
                );
            }
        };

        if !request.version.is_v2() {
            debug!(version = %request.version.as_str(), "Accepting non-2.0 version string");
        }

        let Some(handler) = self.registry.get(&request.method) else {
            debug!(method = %request.method, "Method not found");
            return (
                JsonRpcResponse::failure(request.id, JsonRpcErrorObject::method_not_found()),
                DispatchStage::Parsed,
            );
        };

        let method = request.method.clone();
        let params = request.take_params();

        // prepare() decodes and validates; the body runs when its future is polled.
        // Both sit inside the unwind guard since user Deserialize/is_valid impls can panic too.
        let invoked = AtomicBool::new(false);
        let invoked_flag = &invoked;
        let outcome = AssertUnwindSafe(async move {
            let invocation = handler.prepare(params)?;
            invoked_flag.store(true, Ordering::Release);
            Ok::<_, PrepareError>(invocation.await)
        })
        .catch_unwind()
        .await;

        match outcome {
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                // decode and validation run inside prepare(); only the handler body is distinguishable
                let stage = if invoked.load(Ordering::Acquire) {
                    DispatchStage::Validated
                } else {
                    DispatchStage::Routed
                };
                error!(method = %method, panic = %message, stage = %stage, "Handler panicked");
                (
                    JsonRpcResponse::failure(request.id, JsonRpcErrorObject::internal_error(message)),
                    stage,
                )
            }
            Ok(Err(PrepareError::Decode(message))) => {
                debug!(method = %method, error = %message, "Params failed to decode");
                (
                    JsonRpcResponse::failure(request.id, JsonRpcErrorObject::parse_error(message)),
                    DispatchStage::Routed,
                )
            }
            Ok(Err(PrepareError::InvalidParams)) => (
                JsonRpcResponse::failure(request.id, JsonRpcErrorObject::invalid_params()),
                DispatchStage::Decoded,
            ),
            Ok(Ok(Err(InvocationError::Logic(message)))) => {
                debug!(method = %method, error = %message, "Handler returned logic error");
                (
                    JsonRpcResponse::failure(request.id, JsonRpcErrorObject::logic_error(message)),
                    DispatchStage::Invoked,
                )
            }
            Ok(Ok(Err(InvocationError::Result(message)))) => {
                warn!(method = %method, error = %message, "Handler result failed to serialize");
                (
                    JsonRpcResponse::failure(request.id, JsonRpcErrorObject::internal_error(message)),
                    DispatchStage::Invoked,
                )
            }
            Ok(Ok(Ok(result))) => (
                JsonRpcResponse::success(request.id, result),
                DispatchStage::Responded,
            ),
        }
    }
}

fn extract_id(value: &Value) -> Option<RequestId> {
    value
        .get("id")
        .and_then(|id| serde_json::from_value(id.clone()).ok())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpc_lb_protocol::{EmptyParams, Params, error_codes};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, Deserialize)]
    struct SumParams {
        a: i64,
        b: i64,
    }

    impl Params for SumParams {
        fn is_valid(&self) -> bool {
            self.a >= 0 && self.b >= 0
        }
    }

    #[derive(Debug, Serialize)]
    struct SumResult {
        result: i64,
    }

    fn dispatcher_with(calls: Arc<AtomicUsize>) -> Dispatcher {
        let mut registry = MethodRegistry::new();
        registry.register_function("End2End.Sum", move |p: SumParams| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, String>(SumResult { result: p.a + p.b }) }
        });
        registry.register_function("Account.Get", |_: EmptyParams| async {
            Err::<(), _>("account is locked")
        });
        registry.register_function("Crash", |_: EmptyParams| async {
            if true {
                panic!("boom");
            }
            Ok::<_, String>(())
        });
        registry.register_function("Nothing", |_: EmptyParams| async { Ok::<_, String>(()) });
        Dispatcher::new(Arc::new(registry))
    }

    fn dispatcher() -> Dispatcher {
        dispatcher_with(Arc::new(AtomicUsize::new(0)))
    }

    #[tokio::test]
    async fn test_success() {
        let response = dispatcher()
            .dispatch(br#"{"jsonrpc":"2.0","id":"r-1","method":"End2End.Sum","params":{"a":2,"b":3}}"#)
            .await;

        assert_eq!(response.id, Some(RequestId::from("r-1")));
        assert_eq!(response.into_outcome().unwrap(), json!({"result": 5}));
    }

    #[tokio::test]
    async fn test_parse_error_carries_parser_message() {
        let response = dispatcher().dispatch(b"{not json").await;
        let error = response.error.unwrap();

        assert_eq!(error.code, error_codes::PARSE_ERROR);
        assert_eq!(error.message, "Parse Error");
        assert!(error.data.is_some());
        assert!(response.id.is_none());
    }

    #[tokio::test]
    async fn test_missing_method_echoes_id() {
        let response = dispatcher().dispatch(br#"{"jsonrpc":"2.0","id":9}"#).await;

        assert_eq!(response.id, Some(RequestId::Number(9)));
        assert_eq!(response.error.unwrap().code, error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let response = dispatcher()
            .dispatch(br#"{"jsonrpc":"2.0","id":1,"method":"Nope","params":{}}"#)
            .await;

        let error = response.error.unwrap();
        assert_eq!(error.code, error_codes::METHOD_NOT_FOUND);
        assert_eq!(error.message, "Method not found");
    }

    #[tokio::test]
    async fn test_invalid_params_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = dispatcher_with(Arc::clone(&calls));

        let response = dispatcher
            .dispatch(br#"{"jsonrpc":"2.0","id":1,"method":"End2End.Sum","params":{"a":-1,"b":3}}"#)
            .await;

        assert_eq!(response.error.unwrap().code, error_codes::INVALID_PARAMS);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_undecodable_params_is_parse_error() {
        let response = dispatcher()
            .dispatch(br#"{"jsonrpc":"2.0","id":1,"method":"End2End.Sum","params":{"a":"two"}}"#)
            .await;

        let error = response.error.unwrap();
        assert_eq!(error.code, error_codes::PARSE_ERROR);
        assert!(error.data.unwrap().contains("invalid type"));
    }

    #[tokio::test]
    async fn test_logic_error_uses_handler_message() {
        let response = dispatcher()
            .dispatch(br#"{"jsonrpc":"2.0","id":1,"method":"Account.Get","params":{}}"#)
            .await;

        let error = response.error.unwrap();
        assert_eq!(error.code, error_codes::LOGIC_ERROR);
        assert_eq!(error.message, "account is locked");
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let dispatcher = dispatcher();

        let response = dispatcher
            .dispatch(br#"{"jsonrpc":"2.0","id":"p","method":"Crash","params":{}}"#)
            .await;
        let error = response.error.unwrap();
        assert_eq!(error.code, error_codes::INTERNAL_ERROR);
        assert_eq!(error.message, "Internal error");
        assert_eq!(error.data.as_deref(), Some("boom"));
        assert_eq!(response.id, Some(RequestId::from("p")));

        // the dispatcher keeps serving
        let response = dispatcher
            .dispatch(br#"{"jsonrpc":"2.0","id":2,"method":"End2End.Sum","params":{"a":1,"b":1}}"#)
            .await;
        assert_eq!(response.into_outcome().unwrap(), json!({"result": 2}));
    }

    #[tokio::test]
    async fn test_null_result_is_success() {
        let response = dispatcher()
            .dispatch(br#"{"jsonrpc":"2.0","id":1,"method":"Nothing","params":{}}"#)
            .await;

        assert!(!response.is_error());
        assert_eq!(response.result, Some(Value::Null));
    }

    #[tokio::test]
    async fn test_missing_id_and_odd_version_accepted() {
        let response = dispatcher()
            .dispatch(br#"{"jsonrpc":"1.0","method":"End2End.Sum","params":{"a":1,"b":2}}"#)
            .await;

        assert!(response.id.is_none());
        assert_eq!(response.into_outcome().unwrap(), json!({"result": 3}));
    }

    #[tokio::test]
    async fn test_stage_labels() {
        let mut registry = MethodRegistry::new();
        registry.register_function("Crash", |_: EmptyParams| async {
            if true {
                panic!("boom");
            }
            Ok::<_, String>(())
        });
        registry.register_function("Picky", |_: PanicsOnValidate| async { Ok::<_, String>(()) });
        let dispatcher = Dispatcher::new(Arc::new(registry));

        let cases = [
            ("{", DispatchStage::Received),
            (r#"{"id":1,"method":"Nope","params":{}}"#, DispatchStage::Parsed),
            (r#"{"id":1,"method":"Crash","params":"x"}"#, DispatchStage::Routed),
            (r#"{"id":1,"method":"Picky","params":{}}"#, DispatchStage::Routed),
            (r#"{"id":1,"method":"Crash","params":{}}"#, DispatchStage::Validated),
        ];
        for (body, expected) in cases {
            let (response, stage) = dispatcher.run(body.as_bytes()).await;
            assert!(response.is_error());
            assert_eq!(stage, expected, "{body}");
        }

        let (response, stage) = dispatcher_with(Arc::new(AtomicUsize::new(0)))
            .run(br#"{"id":1,"method":"End2End.Sum","params":{"a":1,"b":1}}"#)
            .await;
        assert!(!response.is_error());
        assert_eq!(stage, DispatchStage::Responded);
    }

    #[derive(Debug, Deserialize)]
    struct PanicsOnValidate {}

    impl Params for PanicsOnValidate {
        fn is_valid(&self) -> bool {
            panic!("validator exploded")
        }
    }

    #[test]
    fn test_reject_verb() {
        let response = dispatcher().reject_verb();
        assert_eq!(response.error.unwrap().code, error_codes::INVALID_REQUEST);
        assert!(response.id.is_none());
    }

    #[test]
    fn test_panic_message_fallback() {
        assert_eq!(panic_message(&42_u8), "handler panicked");
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
    }
}
