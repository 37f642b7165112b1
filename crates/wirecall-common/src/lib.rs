//! Wirecall Common Types, Codecs and Transport
//!
//! This crate provides the protocol definitions, wire codecs and the framed
//! transport primitives shared by the wirecall server and client.
//!
//! # Overview
//!
//! Wirecall is a small pluggable RPC framework: a process exposes named methods
//! of in-process handler objects to remote callers over TCP or HTTP. Two
//! interchangeable wire encodings are provided, selectable independently on
//! client and server:
//!
//! - a native self-describing binary encoding (postcard)
//! - JSON-RPC 2.0, including batch framing
//!
//! # Components
//!
//! - [`protocol`] - Request/Response records, protocol error codes, error types
//! - [`codec`] - The [`codec::Codec`] enum and the two concrete encodings
//! - [`transport`] - Length-prefixed framing over any async byte stream
//!
//! # Example
//!
//! ```
//! use wirecall_common::codec::Codec;
//!
//! let codec = Codec::jsonrpc();
//! let request = codec.new_request("Int.Sum", &serde_json::json!({"a": 1, "b": 2})).unwrap();
//! assert_eq!(request.method, "Int.Sum");
//! assert_eq!(request.id.len(), 32);
//! ```

pub mod codec;
pub mod protocol;
pub mod transport;

pub use codec::{Codec, RequestBatch};
pub use protocol::*;
