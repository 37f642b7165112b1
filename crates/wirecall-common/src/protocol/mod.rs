//! Wirecall Protocol Definitions
//!
//! The core protocol records exchanged between client and server, and the two
//! error taxonomies that coexist in the system:
//!
//! - **Protocol errors** ([`RpcError`]) travel inside responses, carry a
//!   JSON-RPC 2.0 aligned code, and never terminate a connection.
//! - **Framework errors** ([`WirecallError`]) terminate the current operation:
//!   frame-level I/O failures close the TCP connection, dial failures surface
//!   to the caller.
//!
//! Payloads ([`Request::params`], [`Response::reply`]) are opaque byte
//! sequences in the active codec's encoding; the dispatcher never interprets
//! them beyond handing them to the codec.

pub mod error;
pub mod requests;
pub mod responses;

pub use error::{
    RpcError, Result, WirecallError, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR, SUCCESS,
};
pub use requests::Request;
pub use responses::Response;
