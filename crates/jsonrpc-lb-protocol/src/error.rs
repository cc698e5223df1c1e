use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error_codes;

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerError,
    /// Business-logic failure returned on purpose by a handler
    LogicError,
    /// Any code outside the fixed table
    Other(i16),
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i16 {
        match self {
            JsonRpcErrorCode::ParseError => error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            JsonRpcErrorCode::ServerError => error_codes::SERVER_ERROR,
            JsonRpcErrorCode::LogicError => error_codes::LOGIC_ERROR,
            JsonRpcErrorCode::Other(code) => *code,
        }
    }

    pub fn from_code(code: i16) -> Self {
        match code {
            error_codes::PARSE_ERROR => JsonRpcErrorCode::ParseError,
            error_codes::INVALID_REQUEST => JsonRpcErrorCode::InvalidRequest,
            error_codes::METHOD_NOT_FOUND => JsonRpcErrorCode::MethodNotFound,
            error_codes::INVALID_PARAMS => JsonRpcErrorCode::InvalidParams,
            error_codes::INTERNAL_ERROR => JsonRpcErrorCode::InternalError,
            error_codes::SERVER_ERROR => JsonRpcErrorCode::ServerError,
            error_codes::LOGIC_ERROR => JsonRpcErrorCode::LogicError,
            other => JsonRpcErrorCode::Other(other),
        }
    }

    /// Fixed table message. Logic errors carry the handler's own message instead.
    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse Error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
            JsonRpcErrorCode::ServerError => "Server error",
            JsonRpcErrorCode::LogicError | JsonRpcErrorCode::Other(_) => "",
        }
    }

    pub fn is_logic(&self) -> bool {
        matches!(self, JsonRpcErrorCode::LogicError)
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// JSON-RPC Error object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i16,
    pub message: String,
    /// Diagnostic context (parser message, panic payload)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl JsonRpcErrorObject {
    pub fn new(code: JsonRpcErrorCode, message: Option<String>, data: Option<String>) -> Self {
        Self {
            code: code.code(),
            message: message.unwrap_or_else(|| code.message().to_string()),
            data,
        }
    }

    pub fn parse_error(data: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::ParseError, None, Some(data.into()))
    }

    pub fn invalid_request() -> Self {
        Self::new(JsonRpcErrorCode::InvalidRequest, None, None)
    }

    pub fn method_not_found() -> Self {
        Self::new(JsonRpcErrorCode::MethodNotFound, None, None)
    }

    pub fn invalid_params() -> Self {
        Self::new(JsonRpcErrorCode::InvalidParams, None, None)
    }

    pub fn internal_error(data: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::InternalError, None, Some(data.into()))
    }

    pub fn server_error(data: Option<String>) -> Self {
        Self::new(JsonRpcErrorCode::ServerError, None, data)
    }

    pub fn logic_error(message: impl Into<String>) -> Self {
        Self::new(JsonRpcErrorCode::LogicError, Some(message.into()), None)
    }

    pub fn kind(&self) -> JsonRpcErrorCode {
        JsonRpcErrorCode::from_code(self.code)
    }

    pub fn is_logic(&self) -> bool {
        self.kind().is_logic()
    }
}

impl fmt::Display for JsonRpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorObject {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes() {
        assert_eq!(JsonRpcErrorCode::ParseError.code(), -32700);
        assert_eq!(JsonRpcErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(JsonRpcErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(JsonRpcErrorCode::InvalidParams.code(), -32602);
        assert_eq!(JsonRpcErrorCode::InternalError.code(), -32603);
        assert_eq!(JsonRpcErrorCode::ServerError.code(), -32000);
        assert_eq!(JsonRpcErrorCode::LogicError.code(), -32001);
    }

    #[test]
    fn test_from_code_maps_back() {
        for code in [
            JsonRpcErrorCode::ParseError,
            JsonRpcErrorCode::InvalidRequest,
            JsonRpcErrorCode::MethodNotFound,
            JsonRpcErrorCode::InvalidParams,
            JsonRpcErrorCode::InternalError,
            JsonRpcErrorCode::ServerError,
            JsonRpcErrorCode::LogicError,
        ] {
            assert_eq!(JsonRpcErrorCode::from_code(code.code()), code);
        }
        assert_eq!(JsonRpcErrorCode::from_code(-1), JsonRpcErrorCode::Other(-1));
    }

    #[test]
    fn test_table_messages() {
        let error = JsonRpcErrorObject::method_not_found();
        assert_eq!(error.message, "Method not found");
        assert!(error.data.is_none());

        let error = JsonRpcErrorObject::logic_error("insufficient funds");
        assert_eq!(error.code, -32001);
        assert_eq!(error.message, "insufficient funds");
        assert!(error.is_logic());
    }

    #[test]
    fn test_error_serialization_omits_empty_data() {
        let error = JsonRpcErrorObject::invalid_params();
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"code": -32602, "message": "Invalid params"})
        );

        let error = JsonRpcErrorObject::parse_error("expected value at line 1 column 1");
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["data"], "expected value at line 1 column 1");
    }

    #[test]
    fn test_display_is_code_colon_message() {
        let error = JsonRpcErrorObject::internal_error("boom");
        assert_eq!(error.to_string(), "-32603:Internal error");
    }
}
