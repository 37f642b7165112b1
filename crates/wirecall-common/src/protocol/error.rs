use serde::{Deserialize, Serialize};
use thiserror::Error;

// Standard JSON-RPC 2.0 error codes, shared by both wire encodings.
/// The request completed without a protocol error
pub const SUCCESS: i32 = 0;
/// The server received a body it could not decode
pub const PARSE_ERROR: i32 = -32700;
/// The request envelope is not a valid request (e.g. ill-formed method name)
pub const INVALID_REQUEST: i32 = -32600;
/// The service or method does not exist
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameter(s)
pub const INVALID_PARAMS: i32 = -32602;
/// Internal error: body decode failure or a handler-returned error
pub const INTERNAL_ERROR: i32 = -32603;

/// Structured protocol error carried inside a [`Response`].
///
/// User-defined errors returned by handler methods collapse to
/// [`INTERNAL_ERROR`] with the handler's message preserved.
///
/// [`Response`]: crate::protocol::Response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("rpc error (code {code}): {message}")]
pub struct RpcError {
    /// Error code (standard codes are negative integers)
    pub code: i32,
    /// Short description of the error
    pub message: String,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a parse error (-32700)
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, message)
    }

    /// Create an invalid request error (-32600)
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, message)
    }

    /// Create a method not found error (-32601)
    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(METHOD_NOT_FOUND, message)
    }

    /// Create an invalid params error (-32602)
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    /// Create an internal error (-32603)
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }
}

/// Framework and transport errors.
///
/// These terminate the current operation rather than travelling inside a
/// response: a frame-level failure closes the TCP connection, a dial failure
/// surfaces to the caller. Protocol-level failures are [`RpcError`]s instead.
#[derive(Error, Debug)]
pub enum WirecallError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timeout after {0}ms")]
    Timeout(u64),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary serialization error: {0}")]
    Binary(#[from] postcard::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("registration error: {0}")]
    Registration(String),

    #[error("unsupported codec: {0}")]
    UnsupportedCodec(&'static str),

    /// A protocol error surfaced by the remote side, code and message preserved.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WirecallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(RpcError::parse_error("x").code, -32700);
        assert_eq!(RpcError::invalid_request("x").code, -32600);
        assert_eq!(RpcError::method_not_found("x").code, -32601);
        assert_eq!(RpcError::invalid_params("x").code, -32602);
        assert_eq!(RpcError::internal_error("x").code, -32603);
    }

    #[test]
    fn test_error_message_preserved() {
        let err = RpcError::internal_error("disk on fire");
        assert_eq!(err.message, "disk on fire");
        assert!(err.to_string().contains("-32603"));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_rpc_error_serialization() {
        let err = RpcError::method_not_found("rpc: can't find method Int.Missing");
        let serialized = serde_json::to_string(&err).unwrap();
        assert!(serialized.contains("\"code\":-32601"));
        assert!(serialized.contains("Int.Missing"));

        let back: RpcError = serde_json::from_str(&serialized).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_rpc_error_converts_to_framework_error() {
        let err: WirecallError = RpcError::internal_error("boom").into();
        match err {
            WirecallError::Rpc(inner) => assert_eq!(inner.code, INTERNAL_ERROR),
            other => panic!("expected Rpc variant, got {other:?}"),
        }
    }
}
