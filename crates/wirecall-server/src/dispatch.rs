//! Request Dispatcher
//!
//! Routes one decoded request to one registered method and maps every failure
//! mode to a structured error response. Batches fan out to one task per
//! request and join in order, so the response list is always index-aligned
//! with the input list.
//!
//! Error mapping:
//!
//! | condition                      | code               |
//! |--------------------------------|--------------------|
//! | method name not `Service.Method` | `INVALID_REQUEST`  |
//! | unknown service or method      | `METHOD_NOT_FOUND` |
//! | argument payload did not decode | `INTERNAL_ERROR`   |
//! | handler returned an error      | `INTERNAL_ERROR`   |
//! | handler panicked               | `INTERNAL_ERROR`   |
//!
//! The response identifier is stamped from the request identifier on every
//! path. A panicking handler is recovered here, at the task join, so both the
//! TCP and HTTP paths keep their connection and produce a response.

use std::sync::Arc;

use wirecall_common::codec::Codec;
use wirecall_common::protocol::{
    Request, Response, INTERNAL_ERROR, INVALID_REQUEST, METHOD_NOT_FOUND,
};

use crate::registry::{Lookup, MethodError, Registry};

/// Dispatches a request batch; the result has the same length as `requests`
/// and `result[i]` answers `requests[i]`.
pub(crate) async fn dispatch(
    codec: Arc<Codec>,
    registry: Arc<Registry>,
    requests: Vec<Request>,
) -> Vec<Response> {
    let mut handles = Vec::with_capacity(requests.len());
    for request in requests {
        let codec = Arc::clone(&codec);
        let registry = Arc::clone(&registry);
        let id = request.id.clone();
        let handle = tokio::spawn(async move { dispatch_one(&codec, &registry, request) });
        handles.push((id, handle));
    }

    let mut responses = Vec::with_capacity(handles.len());
    for (id, handle) in handles {
        let response = match handle.await {
            Ok(response) => response,
            Err(join_err) => {
                tracing::error!("handler task failed: {join_err}");
                let mut response = Response::error(INTERNAL_ERROR, "rpc: handler panicked");
                response.set_request_id(id);
                response
            }
        };
        responses.push(response);
    }
    responses
}

/// Routes a single request; the returned response carries the request's id.
fn dispatch_one(codec: &Codec, registry: &Registry, request: Request) -> Response {
    let id = request.id.clone();
    let mut response = route(codec, registry, &request);
    response.set_request_id(id);
    response
}

fn route(codec: &Codec, registry: &Registry, request: &Request) -> Response {
    let Some((service_name, method_name)) = split_method(&request.method) else {
        tracing::warn!(method = %request.method, "ill-formed method name");
        return Response::error(
            INVALID_REQUEST,
            format!("rpc: service/method request ill-formed: {}", request.method),
        );
    };

    let method = match registry.find(service_name, method_name) {
        Lookup::Found(method) => method,
        Lookup::NoService => {
            return Response::error(
                METHOD_NOT_FOUND,
                format!("rpc: can't find service {service_name}"),
            );
        }
        Lookup::NoMethod => {
            return Response::error(
                METHOD_NOT_FOUND,
                format!("rpc: can't find method {}", request.method),
            );
        }
    };

    match method(codec, &request.params) {
        Ok(reply) => Response::success(reply),
        Err(MethodError::Body(err)) => {
            tracing::warn!(method = %request.method, "could not read request body: {err}");
            Response::error(
                INTERNAL_ERROR,
                format!("rpc: could not read request body {}", request.method),
            )
        }
        Err(MethodError::Handler(message)) => Response::error(INTERNAL_ERROR, message),
        Err(MethodError::Encode(err)) => {
            tracing::error!(method = %request.method, "could not encode reply: {err}");
            Response::error(
                INTERNAL_ERROR,
                format!("rpc: could not encode reply for {}", request.method),
            )
        }
    }
}

/// Splits `Service.Method` on its single separator; any other shape is
/// ill-formed.
fn split_method(method: &str) -> Option<(&str, &str)> {
    if method.matches('.').count() != 1 {
        return None;
    }
    method.split_once('.')
}
