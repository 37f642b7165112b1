//! Wirecall Server
//!
//! Exposes named methods of in-process handler objects to remote callers over
//! framed TCP or one-shot HTTP, with the wire encoding chosen at construction.
//!
//! # Components
//!
//! - [`registry`] - index of `Service.Method -> callable` entries
//! - the dispatcher - per-request routing, error mapping, batch fan-out
//! - TCP and HTTP serve loops
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wirecall_common::codec::Codec;
//! use wirecall_server::{Method, Server, Service};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct SumArgs { a: i64, b: i64 }
//!
//! struct Int;
//!
//! impl Service for Int {
//!     fn name(&self) -> &'static str { "Int" }
//!     fn methods(self: Arc<Self>) -> Vec<Method> {
//!         vec![Method::new("Sum", &self, |_: &Int, args: SumArgs, reply: &mut i64| {
//!             *reply = args.a + args.b;
//!             Ok(())
//!         })]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::new(Codec::jsonrpc());
//!     server.register(Int).unwrap();
//!     server.serve_tcp("127.0.0.1:9090").await.unwrap();
//! }
//! ```

mod dispatch;
pub mod http_server;
pub mod registry;
mod tcp_server;

pub use http_server::{HttpConfig, HyperRequest, HyperResponse};
pub use registry::{BoxError, Method, Registry, Service};

use std::sync::Arc;

use tokio::net::TcpListener;

use wirecall_common::codec::Codec;
use wirecall_common::protocol::{Result, WirecallError};

/// The RPC server: a codec, a method registry, and the two serve loops.
///
/// Registration normally happens before serving begins; it is safe at any
/// point, since lookups and registrations share a read-write lock.
#[derive(Clone)]
pub struct Server {
    codec: Arc<Codec>,
    registry: Arc<Registry>,
    http: HttpConfig,
}

impl Server {
    /// Creates a server speaking the given wire encoding.
    pub fn new(codec: Codec) -> Self {
        Server {
            codec: Arc::new(codec),
            registry: Arc::new(Registry::new()),
            http: HttpConfig::default(),
        }
    }

    /// Overrides the HTTP handler configuration.
    pub fn with_http_config(mut self, config: HttpConfig) -> Self {
        self.http = config;
        self
    }

    /// Registers every exported method of `service` under its type name.
    pub fn register<S: Service>(&self, service: S) -> Result<()> {
        self.registry.register(service)
    }

    /// Adds one named method, creating the service record if needed.
    pub fn register_name<S: Service>(&self, service: S, method: &str) -> Result<()> {
        self.registry.register_name(service, method)
    }

    /// Binds `addr` and serves framed RPC over TCP forever.
    pub async fn serve_tcp(&self, addr: &str) -> Result<()> {
        let listener = bind(addr).await?;
        tracing::info!(%addr, "RPC server over TCP is listening");
        self.serve_tcp_listener(listener).await
    }

    /// Serves framed RPC on an already-bound listener (lets callers bind port
    /// 0 first and read the ephemeral address).
    pub async fn serve_tcp_listener(&self, listener: TcpListener) -> Result<()> {
        tcp_server::serve(listener, Arc::clone(&self.codec), Arc::clone(&self.registry)).await;
        Ok(())
    }

    /// Binds `addr` and serves one-shot RPC over HTTP forever.
    pub async fn listen_and_serve_http(&self, addr: &str) -> Result<()> {
        let listener = bind(addr).await?;
        tracing::info!(%addr, "RPC server over HTTP is listening");
        self.serve_http_listener(listener).await
    }

    /// Serves HTTP on an already-bound listener.
    pub async fn serve_http_listener(&self, listener: TcpListener) -> Result<()> {
        http_server::serve(
            listener,
            Arc::clone(&self.codec),
            Arc::clone(&self.registry),
            self.http.clone(),
        )
        .await;
        Ok(())
    }

    /// Handles one HTTP request; usable when embedding the handler in another
    /// HTTP server.
    pub async fn serve_http(&self, req: HyperRequest) -> HyperResponse {
        http_server::handle_request(
            Arc::clone(&self.codec),
            Arc::clone(&self.registry),
            &self.http,
            req,
        )
        .await
    }
}

impl Default for Server {
    /// A server speaking the native binary encoding.
    fn default() -> Self {
        Self::new(Codec::binary())
    }
}

async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| WirecallError::Connection(format!("failed to bind to {addr}: {e}")))
}
