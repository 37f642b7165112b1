//! HTTP Serve Loop
//!
//! One-shot transport: one HTTP request carries one codec-encoded request or
//! batch, the response body carries the encoded reply. Protocol errors travel
//! inside the body with HTTP 200, per JSON-RPC convention; the HTTP status
//! never conveys them.
//!
//! Output shape: when the request arrived as a single object (not an array on
//! the wire) and produced exactly one response, the reply is a bare object;
//! otherwise an array. The shape travels with the decoded batch, so the
//! handler never re-inspects the wire bytes.
//!
//! Handling is wrapped in a wall-clock timeout; on expiry the literal body
//! `timeout` is returned and any later result from the in-flight handler is
//! discarded.

use std::sync::Arc;
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use wirecall_common::codec::Codec;
use wirecall_common::protocol::{
    Response, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR,
};

use crate::dispatch::dispatch;
use crate::registry::Registry;

/// Type alias for hyper incoming requests
pub type HyperRequest = hyper::Request<Incoming>;

/// Type alias for hyper responses with full body
pub type HyperResponse = hyper::Response<Full<Bytes>>;

/// HTTP handler configuration.
#[derive(Clone, Debug)]
pub struct HttpConfig {
    /// Wall-clock budget for one request, body read included
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
        }
    }
}

pub(crate) async fn serve(
    listener: TcpListener,
    codec: Arc<Codec>,
    registry: Arc<Registry>,
    config: HttpConfig,
) {
    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::error!("failed to accept connection: {err}");
                continue;
            }
        };

        let io = TokioIo::new(stream);
        let codec = Arc::clone(&codec);
        let registry = Arc::clone(&registry);
        let config = config.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let codec = Arc::clone(&codec);
                let registry = Arc::clone(&registry);
                let config = config.clone();
                async move {
                    Ok::<_, std::convert::Infallible>(
                        handle_request(codec, registry, &config, req).await,
                    )
                }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::error!(%peer_addr, "error serving connection: {err}");
            }
        });
    }
}

/// Handles one HTTP request under the configured timeout.
pub(crate) async fn handle_request(
    codec: Arc<Codec>,
    registry: Arc<Registry>,
    config: &HttpConfig,
    req: HyperRequest,
) -> HyperResponse {
    let content_type = codec.content_type();
    match tokio::time::timeout(config.request_timeout, handle_inner(codec, registry, req)).await {
        Ok(body) => http_response(body, content_type),
        Err(_elapsed) => {
            tracing::warn!("request exceeded handler timeout");
            http_response(b"timeout".to_vec(), "text/plain")
        }
    }
}

async fn handle_inner(codec: Arc<Codec>, registry: Arc<Registry>, req: HyperRequest) -> Vec<u8> {
    if req.method() != hyper::Method::POST {
        let response = Response::error(
            METHOD_NOT_FOUND,
            format!("method not allowed: {}", req.method()),
        );
        return encode_single(&codec, &response);
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::error!("failed to read request body: {err}");
            let response = Response::error(
                INVALID_PARAMS,
                format!("failed to read request body: {err}"),
            );
            return encode_single(&codec, &response);
        }
    };

    let batch = match codec.read_request(&body) {
        Ok(batch) => batch,
        Err(err) => {
            tracing::warn!("could not parse request: {err}");
            return encode_single(&codec, &codec.err_response(PARSE_ERROR, err.to_string()));
        }
    };

    let batched = batch.batched;
    let responses = dispatch(Arc::clone(&codec), registry, batch.requests).await;

    let encoded = if !batched && responses.len() == 1 {
        codec.encode_response(&responses[0])
    } else {
        codec.encode_responses(&responses)
    };
    match encoded {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!("could not encode responses: {err}");
            Vec::new()
        }
    }
}

fn encode_single(codec: &Codec, response: &Response) -> Vec<u8> {
    match codec.encode_response(response) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!("could not encode response: {err}");
            Vec::new()
        }
    }
}

/// Always HTTP 200: protocol errors travel in the body, not the status.
fn http_response(body: Vec<u8>, content_type: &str) -> HyperResponse {
    hyper::Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| hyper::Response::new(Full::new(Bytes::new())))
}
