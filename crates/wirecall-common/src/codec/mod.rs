//! Wire Codecs
//!
//! A codec turns [`Request`]/[`Response`] records into frame bodies and back,
//! and materializes opaque payloads into caller-supplied types. It is the unit
//! of protocol pluggability: client and server pick their codec independently,
//! as long as both ends of one connection agree.
//!
//! Two encodings are provided:
//!
//! - [`BinaryCodec`]: the native binary encoding (postcard). Payloads are
//!   double-encoded: the outer envelope carries already-encoded argument
//!   bytes, which keeps the payload type opaque at the dispatcher boundary.
//! - [`JsonRpcCodec`]: JSON-RPC 2.0, including batch framing (a JSON array of
//!   request objects in one frame body).
//!
//! The enum allows for future extensibility (e.g. MessagePack, CBOR) while
//! keeping the payload methods generic over serde types, which a trait object
//! could not express.
//!
//! # Example
//!
//! ```
//! use wirecall_common::codec::Codec;
//!
//! let codec = Codec::jsonrpc();
//! let req = codec.new_request("Int.Sum", &serde_json::json!({"a": 1, "b": 2})).unwrap();
//!
//! let body = codec.encode_requests(std::slice::from_ref(&req)).unwrap();
//! let batch = codec.read_request(&body).unwrap();
//! assert!(batch.batched);
//! assert_eq!(batch.requests[0].method, "Int.Sum");
//! ```

mod binary;
mod jsonrpc;

pub use binary::BinaryCodec;
pub use jsonrpc::JsonRpcCodec;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::protocol::{Request, Response, Result};

/// A decoded frame body: the request list plus the shape it arrived in.
///
/// `batched` records whether the wire bytes held a list or a bare object; the
/// HTTP handler mirrors that shape in its reply, so the flag travels with the
/// decoded batch instead of being re-derived from the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBatch {
    pub requests: Vec<Request>,
    pub batched: bool,
}

/// Wire codec for encoding/decoding RPC messages.
///
/// See the [module documentation](self) for the available encodings.
pub enum Codec {
    /// Native binary encoding (postcard)
    Binary(BinaryCodec),
    /// JSON-RPC 2.0
    JsonRpc(JsonRpcCodec),
}

impl Codec {
    /// Creates the native binary codec.
    pub fn binary() -> Self {
        Codec::Binary(BinaryCodec)
    }

    /// Creates the JSON-RPC 2.0 codec.
    pub fn jsonrpc() -> Self {
        Codec::JsonRpc(JsonRpcCodec)
    }

    /// Whether this codec can frame multiple requests in one client call.
    pub fn supports_batch(&self) -> bool {
        matches!(self, Codec::JsonRpc(_))
    }

    /// Content-Type for HTTP responses carrying this codec's bytes.
    pub fn content_type(&self) -> &'static str {
        match self {
            Codec::Binary(_) => "text/plain",
            Codec::JsonRpc(_) => "application/json",
        }
    }

    /// Builds a request whose payload encodes `args`.
    ///
    /// The JSON-RPC codec fills in a fresh 32-character hex identifier; the
    /// binary codec leaves the identifier empty.
    pub fn new_request<T: Serialize>(&self, method: &str, args: &T) -> Result<Request> {
        match self {
            Codec::Binary(c) => c.new_request(method, args),
            Codec::JsonRpc(c) => c.new_request(method, args),
        }
    }

    /// Builds a success response whose payload encodes `result`.
    pub fn new_response<T: Serialize>(&self, result: &T) -> Result<Response> {
        Ok(Response::success(self.encode_payload(result)?))
    }

    /// Builds an error response with the given structured error.
    pub fn err_response(&self, code: i32, message: impl Into<String>) -> Response {
        Response::error(code, message)
    }

    /// Encodes a value with this codec's payload encoding.
    ///
    /// This is the inner encoding of the double-encoding design: the result is
    /// what travels in [`Request::params`] and [`Response::reply`].
    pub fn encode_payload<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            Codec::Binary(c) => c.encode_payload(value),
            Codec::JsonRpc(c) => c.encode_payload(value),
        }
    }

    /// Encodes a request list into a frame body.
    pub fn encode_requests(&self, requests: &[Request]) -> Result<Vec<u8>> {
        match self {
            Codec::Binary(c) => c.encode_requests(requests),
            Codec::JsonRpc(c) => c.encode_requests(requests),
        }
    }

    /// Encodes a response list into a frame body.
    pub fn encode_responses(&self, responses: &[Response]) -> Result<Vec<u8>> {
        match self {
            Codec::Binary(c) => c.encode_responses(responses),
            Codec::JsonRpc(c) => c.encode_responses(responses),
        }
    }

    /// Encodes a single response as a bare object (HTTP single-call shape).
    pub fn encode_response(&self, response: &Response) -> Result<Vec<u8>> {
        match self {
            Codec::Binary(c) => c.encode_response(response),
            Codec::JsonRpc(c) => c.encode_response(response),
        }
    }

    /// Decodes a frame body into a request batch.
    ///
    /// A body holding a single object rather than a list decodes to a
    /// one-element batch with `batched == false`.
    pub fn read_request(&self, data: &[u8]) -> Result<RequestBatch> {
        match self {
            Codec::Binary(c) => c.read_request(data),
            Codec::JsonRpc(c) => c.read_request(data),
        }
    }

    /// Decodes a frame body into a response list (single objects wrap to one
    /// element, as with [`read_request`](Self::read_request)).
    pub fn read_response(&self, data: &[u8]) -> Result<Vec<Response>> {
        match self {
            Codec::Binary(c) => c.read_response(data),
            Codec::JsonRpc(c) => c.read_response(data),
        }
    }

    /// Decodes an argument payload into a caller-supplied type.
    pub fn read_request_body<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T> {
        match self {
            Codec::Binary(c) => c.read_body(payload),
            Codec::JsonRpc(c) => c.read_request_body(payload),
        }
    }

    /// Decodes a result payload into a caller-supplied type.
    pub fn read_response_body<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T> {
        match self {
            Codec::Binary(c) => c.read_body(payload),
            Codec::JsonRpc(c) => c.read_response_body(payload),
        }
    }
}

impl Default for Codec {
    /// The native binary codec, matching the server and client defaults.
    fn default() -> Self {
        Self::binary()
    }
}
