//! RPC Client
//!
//! Holds at most one TCP connection, dialed lazily on first use. A call is a
//! frame write followed by a frame read on that connection; the instance is
//! not safe for concurrent calls, callers serialize or pool.
//!
//! Every call is bounded by an overall timeout. On expiry the connection is
//! dropped rather than reused: a timed-out exchange leaves the stream
//! mid-frame, and reusing it would silently desynchronize request/response
//! pairing. The next call redials.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use wirecall_common::codec::Codec;
use wirecall_common::protocol::{Request, Response, Result, WirecallError};
use wirecall_common::transport::frame;

/// Client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Overall budget for one call, dial included
    pub call_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
        }
    }
}

/// One call of a JSON-RPC batch: a method name and its params value.
#[derive(Clone, Debug)]
pub struct BatchCall {
    pub method: String,
    pub params: Value,
}

impl BatchCall {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// RPC client over framed TCP.
pub struct Client {
    addr: String,
    codec: Codec,
    conn: Option<TcpStream>,
    config: ClientConfig,
}

impl Client {
    /// Creates a client speaking `codec` against `addr`. No connection is
    /// made until the first call.
    pub fn new(codec: Codec, addr: impl Into<String>) -> Self {
        Self::with_config(codec, addr, ClientConfig::default())
    }

    pub fn with_config(codec: Codec, addr: impl Into<String>, config: ClientConfig) -> Self {
        Client {
            addr: addr.into(),
            codec,
            conn: None,
            config,
        }
    }

    /// Calls `method` with `args` and decodes the result into `R`.
    ///
    /// An error response surfaces as [`WirecallError::Rpc`] with code and
    /// message preserved. The whole operation is bounded by the configured
    /// call timeout; on expiry there is no guarantee whether the server
    /// received or processed the request.
    pub async fn call<A, R>(&mut self, method: &str, args: &A) -> Result<R>
    where
        A: Serialize,
        R: DeserializeOwned,
    {
        let request = self.codec.new_request(method, args)?;
        let responses = self.exchange_with_timeout(vec![request]).await?;

        let Some(response) = single(responses) else {
            return Err(WirecallError::InvalidResponse(
                "expected exactly one response".into(),
            ));
        };
        if let Some(err) = response.error {
            return Err(WirecallError::Rpc(err));
        }
        self.codec.read_response_body(&response.reply)
    }

    /// Sends several calls in one frame and decodes the results in order.
    ///
    /// Only the JSON-RPC codec frames batches; with the binary codec this
    /// fails with [`WirecallError::UnsupportedCodec`] before touching the
    /// network. Any error response in the batch aborts the call with that
    /// error.
    pub async fn call_batch<R>(&mut self, calls: &[BatchCall]) -> Result<Vec<R>>
    where
        R: DeserializeOwned,
    {
        if !self.codec.supports_batch() {
            return Err(WirecallError::UnsupportedCodec(
                "batch calls require the JSON-RPC codec",
            ));
        }

        let requests = calls
            .iter()
            .map(|call| self.codec.new_request(&call.method, &call.params))
            .collect::<Result<Vec<_>>>()?;
        let responses = self.exchange_with_timeout(requests).await?;

        // re-encode just the result fields as one JSON array, then decode the
        // caller's sequence type from it
        let mut results = Vec::with_capacity(responses.len());
        for response in responses {
            if let Some(err) = response.error {
                return Err(WirecallError::Rpc(err));
            }
            results.push(serde_json::from_slice::<Value>(&response.reply)?);
        }
        Ok(serde_json::from_value(Value::Array(results))?)
    }

    /// Closes the connection, if one is open.
    pub async fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            if let Err(err) = conn.shutdown().await {
                tracing::debug!("could not close connection: {err}");
            }
        }
    }

    async fn exchange_with_timeout(&mut self, requests: Vec<Request>) -> Result<Vec<Response>> {
        let timeout = self.config.call_timeout;
        let outcome = tokio::time::timeout(timeout, self.exchange(&requests)).await;
        match outcome {
            Ok(result) => result,
            Err(_elapsed) => {
                // the stream may be mid-frame; force a redial on the next call
                self.conn = None;
                Err(WirecallError::Timeout(timeout.as_millis() as u64))
            }
        }
    }

    /// One framed write-then-read on the (lazily dialed) connection.
    async fn exchange(&mut self, requests: &[Request]) -> Result<Vec<Response>> {
        let body = self.codec.encode_requests(requests)?;

        if self.conn.is_none() {
            let stream = TcpStream::connect(&self.addr).await.map_err(|e| {
                WirecallError::Connection(format!("failed to dial {}: {e}", self.addr))
            })?;
            self.conn = Some(stream);
        }
        let Some(stream) = self.conn.as_mut() else {
            return Err(WirecallError::Connection("no connection".into()));
        };

        frame::write_frame(stream, &body).await?;
        let reply_body = frame::read_frame(stream).await?;
        self.codec.read_response(&reply_body)
    }
}

fn single(responses: Vec<Response>) -> Option<Response> {
    if responses.len() == 1 {
        responses.into_iter().next()
    } else {
        None
    }
}
