use serde::{Deserialize, Serialize};

/// Capability every handler parameter type implements.
///
/// The server calls [`Params::is_valid`] after decoding and before invoking the
/// handler; `false` yields an `Invalid params` response without running it.
pub trait Params {
    fn is_valid(&self) -> bool;
}

/// Parameters for methods that take none. Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyParams {}

impl Params for EmptyParams {
    fn is_valid(&self) -> bool {
        true
    }
}
