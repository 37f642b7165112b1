//! Wirecall Request Record
//!
//! The abstract request exchanged between client and server. The argument
//! payload is an opaque byte sequence in the active codec's encoding; the
//! wire envelope around it differs per codec.

use serde::{Deserialize, Serialize};

/// An RPC request.
///
/// Created by the client-side codec and consumed by the server-side
/// dispatcher.
///
/// # Fields
///
/// - `id`: request identifier, echoed back by the server. The JSON-RPC codec
///   fills a fresh 32-character hex token; the native binary codec leaves it
///   empty and correlates positionally.
/// - `method`: fully-qualified method name of the form `Service.Method`.
/// - `params`: encoded argument payload, opaque to everything but the codec.
///
/// # Example
///
/// ```
/// use wirecall_common::codec::Codec;
///
/// let request = Codec::binary().new_request("Int.Sum", &(1u32, 2u32)).unwrap();
/// assert_eq!(request.method, "Int.Sum");
/// assert!(request.id.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Request {
    /// Request identifier (may be empty for the binary codec)
    pub id: String,
    /// Fully-qualified `Service.Method` name
    pub method: String,
    /// Encoded argument payload
    pub params: Vec<u8>,
}

impl Request {
    /// Creates a request with an empty identifier.
    pub fn new(method: impl Into<String>, params: Vec<u8>) -> Self {
        Request {
            id: String::new(),
            method: method.into(),
            params,
        }
    }

    /// Sets the request identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}
