//! Wirecall Response Record
//!
//! The abstract response produced by the dispatcher. Like the request, the
//! result payload is opaque bytes; a structured [`RpcError`] travels beside it
//! when the request failed at the protocol level.

use serde::{Deserialize, Serialize};

use super::error::{RpcError, SUCCESS};

/// An RPC response.
///
/// The identifier is stamped from the request's identifier on every path,
/// including error replies, so callers can correlate even failed requests.
/// Exactly one of `reply` / `error` is meaningful: a success response carries
/// encoded result bytes and no error; an error response carries the structured
/// error and an empty payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Response {
    /// Echoed request identifier
    pub id: String,
    /// Encoded result payload (empty on error)
    pub reply: Vec<u8>,
    /// Structured protocol error, `None` on success
    pub error: Option<RpcError>,
}

impl Response {
    /// Creates a success response carrying an encoded result payload.
    pub fn success(reply: Vec<u8>) -> Self {
        Response {
            id: String::new(),
            reply,
            error: None,
        }
    }

    /// Creates an error response with the given protocol code and message.
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Response {
            id: String::new(),
            reply: Vec::new(),
            error: Some(RpcError::new(code, message)),
        }
    }

    /// Stamps the echoed request identifier.
    pub fn set_request_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The protocol error code, [`SUCCESS`] when no error is present.
    pub fn code(&self) -> i32 {
        self.error.as_ref().map_or(SUCCESS, |e| e.code)
    }
}
