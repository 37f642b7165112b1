//! JSON-RPC 2.0 Codec
//!
//! Requests are JSON objects `{"id", "method", "params", "jsonrpc": "2.0"}`;
//! responses carry either `result` or `error` (`{"code", "message"}`). A batch
//! is a JSON array of objects. Unknown fields cause decode failure.
//!
//! Two quirks the dispatcher relies on via `read_request_body`:
//!
//! - an encoded one-element array unwraps to its single element when the
//!   target type is not itself an array (conventional `[arg]` framing reaches
//!   a handler expecting a single value);
//! - a body that fails to decode as a list is retried as a single object and
//!   wrapped in a one-element list, making single-call and batch transport
//!   shapes uniform.

use std::fmt::Write as _;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RequestBatch;
use crate::protocol::{Request, Response, Result, RpcError};

const VERSION: &str = "2.0";

/// JSON-RPC 2.0 request object.
///
/// Field order matches the wire layout of the original protocol; unknown
/// fields are rejected per the framing rules.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonRequest {
    id: String,
    method: String,
    params: Value,
    jsonrpc: String,
}

/// JSON-RPC 2.0 response object.
///
/// Exactly one of `error` / `result` is serialized; an absent `result` reads
/// back as JSON `null`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonResponse {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    jsonrpc: String,
}

/// The JSON-RPC 2.0 codec.
pub struct JsonRpcCodec;

impl JsonRpcCodec {
    pub fn new_request<T: Serialize>(&self, method: &str, args: &T) -> Result<Request> {
        Ok(Request::new(method, self.encode_payload(args)?).with_id(random_id()))
    }

    pub fn encode_payload<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    pub fn encode_requests(&self, requests: &[Request]) -> Result<Vec<u8>> {
        let wire = requests.iter().map(to_wire_request).collect::<Result<Vec<_>>>()?;
        Ok(serde_json::to_vec(&wire)?)
    }

    pub fn encode_responses(&self, responses: &[Response]) -> Result<Vec<u8>> {
        let wire = responses.iter().map(to_wire_response).collect::<Result<Vec<_>>>()?;
        Ok(serde_json::to_vec(&wire)?)
    }

    pub fn encode_response(&self, response: &Response) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&to_wire_response(response)?)?)
    }

    pub fn read_request(&self, data: &[u8]) -> Result<RequestBatch> {
        match serde_json::from_slice::<Vec<JsonRequest>>(data) {
            Ok(wire) => Ok(RequestBatch {
                requests: wire.into_iter().map(from_wire_request).collect::<Result<_>>()?,
                batched: true,
            }),
            Err(list_err) => {
                tracing::debug!("not a request array, retrying as single object: {list_err}");
                let single: JsonRequest = serde_json::from_slice(data)?;
                Ok(RequestBatch {
                    requests: vec![from_wire_request(single)?],
                    batched: false,
                })
            }
        }
    }

    pub fn read_response(&self, data: &[u8]) -> Result<Vec<Response>> {
        match serde_json::from_slice::<Vec<JsonResponse>>(data) {
            Ok(wire) => wire.into_iter().map(from_wire_response).collect(),
            Err(list_err) => {
                tracing::debug!("not a response array, retrying as single object: {list_err}");
                let single: JsonResponse = serde_json::from_slice(data)?;
                Ok(vec![from_wire_response(single)?])
            }
        }
    }

    pub fn read_request_body<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T> {
        decode_unwrapping(payload)
    }

    pub fn read_response_body<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T> {
        decode_unwrapping(payload)
    }
}

/// Decodes a payload, transparently unwrapping a one-element JSON array when
/// the direct decode fails (the target container is not an array).
fn decode_unwrapping<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    match serde_json::from_slice::<T>(payload) {
        Ok(value) => Ok(value),
        Err(direct_err) => {
            if let Ok(Value::Array(items)) = serde_json::from_slice::<Value>(payload) {
                if items.len() == 1 {
                    if let Some(item) = items.into_iter().next() {
                        return Ok(serde_json::from_value(item)?);
                    }
                }
            }
            Err(direct_err.into())
        }
    }
}

fn to_wire_request(request: &Request) -> Result<JsonRequest> {
    Ok(JsonRequest {
        id: request.id.clone(),
        method: request.method.clone(),
        params: serde_json::from_slice(&request.params)?,
        jsonrpc: VERSION.into(),
    })
}

fn from_wire_request(wire: JsonRequest) -> Result<Request> {
    Ok(Request::new(wire.method, serde_json::to_vec(&wire.params)?).with_id(wire.id))
}

fn to_wire_response(response: &Response) -> Result<JsonResponse> {
    let result = match &response.error {
        Some(_) => None,
        None => Some(serde_json::from_slice(&response.reply)?),
    };
    Ok(JsonResponse {
        id: response.id.clone(),
        error: response.error.clone(),
        result,
        jsonrpc: VERSION.into(),
    })
}

fn from_wire_response(wire: JsonResponse) -> Result<Response> {
    let mut response = match wire.error {
        Some(error) => Response::error(error.code, error.message),
        None => Response::success(serde_json::to_vec(&wire.result.unwrap_or(Value::Null))?),
    };
    response.set_request_id(wire.id);
    Ok(response)
}

/// A fresh 32-character hex request identifier.
///
/// 16 random bytes, hex-encoded: a stable-length token unique per client,
/// which is all the correlation contract asks for.
fn random_id() -> String {
    let bytes: [u8; 16] = rand::random();
    let mut id = String::with_capacity(32);
    for byte in bytes {
        let _ = write!(id, "{byte:02x}");
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{INTERNAL_ERROR, METHOD_NOT_FOUND};
    use serde_json::json;
    use std::collections::HashSet;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct SumArgs {
        a: i64,
        b: i64,
    }

    #[test]
    fn test_new_request_fills_hex_id() {
        let codec = JsonRpcCodec;
        let req = codec.new_request("Int.Sum", &json!({"a": 1})).unwrap();
        assert_eq!(req.id.len(), 32);
        assert!(req.id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_ids_unique_per_client() {
        let codec = JsonRpcCodec;
        let ids: HashSet<String> = (0..256)
            .map(|_| codec.new_request("A.B", &json!(null)).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 256);
    }

    #[test]
    fn test_request_wire_format() {
        let codec = JsonRpcCodec;
        let req = Request::new("Int.Sum", serde_json::to_vec(&json!({"a": 1, "b": 2})).unwrap())
            .with_id("x");
        let body = codec.encode_requests(std::slice::from_ref(&req)).unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            json!([{"jsonrpc": "2.0", "id": "x", "method": "Int.Sum", "params": {"a": 1, "b": 2}}])
        );
    }

    #[test]
    fn test_response_wire_format() {
        let codec = JsonRpcCodec;
        let mut ok = Response::success(serde_json::to_vec(&json!(3)).unwrap());
        ok.set_request_id("x");
        let body = codec.encode_response(&ok).unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": "x", "result": 3}));
    }

    #[test]
    fn test_error_response_wire_format() {
        let codec = JsonRpcCodec;
        let body = codec
            .encode_response(&Response::error(METHOD_NOT_FOUND, "rpc: can't find method Int.Missing"))
            .unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"]["code"], json!(-32601));
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_batch_single_equivalence() {
        let codec = JsonRpcCodec;
        let single = br#"{"jsonrpc":"2.0","id":"y","method":"Int.Sum","params":{"a":1,"b":2}}"#;
        let array = br#"[{"jsonrpc":"2.0","id":"y","method":"Int.Sum","params":{"a":1,"b":2}}]"#;

        let from_single = codec.read_request(single).unwrap();
        let from_array = codec.read_request(array).unwrap();

        assert!(!from_single.batched);
        assert!(from_array.batched);
        assert_eq!(from_single.requests, from_array.requests);
        assert_eq!(from_single.requests.len(), 1);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let codec = JsonRpcCodec;
        let body = br#"{"jsonrpc":"2.0","id":"y","method":"A.B","params":{},"extra":1}"#;
        assert!(codec.read_request(body).is_err());
    }

    #[test]
    fn test_one_element_array_unwraps() {
        let codec = JsonRpcCodec;
        let payload = serde_json::to_vec(&json!([{"a": 1, "b": 2}])).unwrap();
        let args: SumArgs = codec.read_request_body(&payload).unwrap();
        assert_eq!(args, SumArgs { a: 1, b: 2 });
    }

    #[test]
    fn test_array_target_is_not_unwrapped() {
        let codec = JsonRpcCodec;
        let payload = serde_json::to_vec(&json!([5])).unwrap();
        let list: Vec<i64> = codec.read_request_body(&payload).unwrap();
        assert_eq!(list, vec![5]);
    }

    #[test]
    fn test_multi_element_array_does_not_unwrap() {
        let codec = JsonRpcCodec;
        let payload = serde_json::to_vec(&json!([{"a": 1, "b": 2}, {"a": 3, "b": 4}])).unwrap();
        assert!(codec.read_request_body::<SumArgs>(&payload).is_err());
    }

    #[test]
    fn test_absent_result_reads_as_null() {
        let codec = JsonRpcCodec;
        let body = br#"{"jsonrpc":"2.0","id":"z","error":{"code":-32603,"message":"boom"}}"#;
        let resps = codec.read_response(body).unwrap();
        assert_eq!(resps.len(), 1);
        assert_eq!(resps[0].code(), INTERNAL_ERROR);
        assert_eq!(resps[0].id, "z");
    }

    #[test]
    fn test_malformed_body_rejected() {
        let codec = JsonRpcCodec;
        assert!(codec.read_request(br#"{"jsonrpc":"2.0","params":}"#).is_err());
        assert!(codec.read_response(b"not json").is_err());
    }
}
