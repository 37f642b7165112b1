//! Wirecall Client
//!
//! Issues calls against a wirecall TCP server: single-shot [`Client::call`]
//! with any codec, and [`Client::call_batch`] over JSON-RPC.
//!
//! # Example
//!
//! ```no_run
//! use wirecall_client::Client;
//! use wirecall_common::codec::Codec;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut client = Client::new(Codec::jsonrpc(), "127.0.0.1:9090");
//!     let sum: i64 = client.call("Int.Sum", &json!({"a": 1, "b": 2})).await.unwrap();
//!     assert_eq!(sum, 3);
//!     client.close().await;
//! }
//! ```

mod client;

pub use client::{BatchCall, Client, ClientConfig};
