//! Native Binary Codec
//!
//! Postcard encoding of the [`Request`]/[`Response`] records themselves. The
//! outer frame body is an encoded list; each request's `params` field is
//! itself already-encoded bytes, so payloads stay opaque at the dispatcher
//! boundary (double encoding).
//!
//! Postcard is not self-describing, so the list/single decode fallback
//! requires the whole buffer to be consumed: without that check, a bare
//! request starting with a zero byte would mis-decode as an empty list with
//! trailing garbage.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::RequestBatch;
use crate::protocol::{Request, Response, Result, WirecallError};

/// The native binary codec. Request identifiers stay empty; correlation on
/// this codec is purely positional.
pub struct BinaryCodec;

impl BinaryCodec {
    pub fn new_request<T: Serialize>(&self, method: &str, args: &T) -> Result<Request> {
        Ok(Request::new(method, self.encode_payload(args)?))
    }

    pub fn encode_payload<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(value)?)
    }

    pub fn read_body<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T> {
        Ok(postcard::from_bytes(payload)?)
    }

    pub fn encode_requests(&self, requests: &[Request]) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(requests)?)
    }

    pub fn encode_responses(&self, responses: &[Response]) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(responses)?)
    }

    pub fn encode_response(&self, response: &Response) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(response)?)
    }

    pub fn read_request(&self, data: &[u8]) -> Result<RequestBatch> {
        if let Some(requests) = decode_consuming::<Vec<Request>>(data) {
            return Ok(RequestBatch {
                requests,
                batched: true,
            });
        }
        match decode_consuming::<Request>(data) {
            Some(request) => Ok(RequestBatch {
                requests: vec![request],
                batched: false,
            }),
            None => Err(WirecallError::InvalidRequest(
                "body is neither a request list nor a single request".into(),
            )),
        }
    }

    pub fn read_response(&self, data: &[u8]) -> Result<Vec<Response>> {
        if let Some(responses) = decode_consuming::<Vec<Response>>(data) {
            return Ok(responses);
        }
        match decode_consuming::<Response>(data) {
            Some(response) => Ok(vec![response]),
            None => Err(WirecallError::InvalidResponse(
                "body is neither a response list nor a single response".into(),
            )),
        }
    }
}

/// Decodes `data` as `T`, requiring the whole buffer to be consumed.
fn decode_consuming<T: DeserializeOwned>(data: &[u8]) -> Option<T> {
    match postcard::take_from_bytes::<T>(data) {
        Ok((value, rest)) if rest.is_empty() => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct SumArgs {
        a: i64,
        b: i64,
    }

    #[test]
    fn test_payload_round_trip() {
        let codec = BinaryCodec;
        let payload = codec.encode_payload(&SumArgs { a: 222, b: 333 }).unwrap();
        let back: SumArgs = codec.read_body(&payload).unwrap();
        assert_eq!(back, SumArgs { a: 222, b: 333 });
    }

    #[test]
    fn test_request_id_left_empty() {
        let codec = BinaryCodec;
        let req = codec.new_request("Int.Sum", &SumArgs { a: 1, b: 2 }).unwrap();
        assert!(req.id.is_empty());
    }

    #[test]
    fn test_double_encoding() {
        // The params field of an encoded request is itself encoded bytes.
        let codec = BinaryCodec;
        let req = codec.new_request("Int.Sum", &SumArgs { a: 1, b: 2 }).unwrap();
        let body = codec.encode_requests(std::slice::from_ref(&req)).unwrap();

        let batch = codec.read_request(&body).unwrap();
        let args: SumArgs = codec.read_body(&batch.requests[0].params).unwrap();
        assert_eq!(args, SumArgs { a: 1, b: 2 });
    }

    #[test]
    fn test_single_request_is_not_misread_as_list() {
        let codec = BinaryCodec;
        let req = codec.new_request("Int.Sum", &SumArgs { a: 1, b: 2 }).unwrap();
        let body = postcard::to_allocvec(&req).unwrap();

        let batch = codec.read_request(&body).unwrap();
        assert!(!batch.batched);
        assert_eq!(batch.requests.len(), 1);
        assert_eq!(batch.requests[0].method, "Int.Sum");
    }

    #[test]
    fn test_garbage_rejected() {
        let codec = BinaryCodec;
        assert!(codec.read_request(&[0xff; 7]).is_err());
        assert!(codec.read_response(&[0xff; 7]).is_err());
    }
}
