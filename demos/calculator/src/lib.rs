//! # Calculator Demo
//!
//! A `Calculator` object exported over JSON-RPC, shared by the
//! `calculator-server` and `calculator-client` binaries.
//!
//! | Method              | Params        | Failure                          |
//! |---------------------|---------------|----------------------------------|
//! | `Calculator.Add`    | `{a, b}`      | none                             |
//! | `Calculator.Divide` | `{a, b}`      | logic error when `b` is zero     |
//! | `Calculator.Sqrt`   | `{x}`         | `Invalid params` when `x < 0`    |
//! | `Calculator.Stats`  | `{}`          | none                             |

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use jsonrpc_lb_protocol::{EmptyParams, Params};
use jsonrpc_lb_server::{ObjectMethods, RpcObject};

/// Name the calculator is registered under
pub const OBJECT_NAME: &str = "Calculator";

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BinaryParams {
    pub a: f64,
    pub b: f64,
}

impl Params for BinaryParams {
    fn is_valid(&self) -> bool {
        self.a.is_finite() && self.b.is_finite()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SqrtParams {
    pub x: f64,
}

impl Params for SqrtParams {
    fn is_valid(&self) -> bool {
        self.x.is_finite() && self.x >= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalcResult {
    pub result: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcStats {
    pub calls: u64,
}

#[derive(Debug, Default)]
pub struct Calculator {
    calls: AtomicU64,
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

impl RpcObject for Calculator {
    fn register_methods(methods: &mut ObjectMethods<Self>) {
        methods
            .method("Add", |calc: Arc<Calculator>, p: BinaryParams| async move {
                calc.record();
                Ok::<_, String>(CalcResult { result: p.a + p.b })
            })
            .method("Divide", |calc: Arc<Calculator>, p: BinaryParams| async move {
                calc.record();
                if p.b == 0.0 {
                    return Err("division by zero".to_string());
                }
                Ok(CalcResult { result: p.a / p.b })
            })
            .method("Sqrt", |calc: Arc<Calculator>, p: SqrtParams| async move {
                calc.record();
                Ok::<_, String>(CalcResult { result: p.x.sqrt() })
            })
            .method("Stats", |calc: Arc<Calculator>, _: EmptyParams| async move {
                Ok::<_, String>(CalcStats {
                    calls: calc.calls.load(Ordering::Relaxed),
                })
            });
    }
}
