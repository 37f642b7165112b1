//! End-to-end HTTP tests: the hyper serve loop on an ephemeral port, driven
//! by a plain HTTP client.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use wirecall_common::codec::Codec;
use wirecall_server::{HttpConfig, Method, Server, Service};

#[derive(Debug, Serialize, Deserialize)]
struct SumArgs {
    a: i64,
    b: i64,
}

struct Int;

impl Service for Int {
    fn name(&self) -> &'static str {
        "Int"
    }

    fn methods(self: Arc<Self>) -> Vec<Method> {
        vec![
            Method::new("Sum", &self, |_: &Int, args: SumArgs, reply: &mut i64| {
                *reply = args.a + args.b;
                Ok(())
            }),
            Method::new("Slow", &self, |_: &Int, args: SumArgs, reply: &mut i64| {
                std::thread::sleep(Duration::from_millis(400));
                *reply = args.a + args.b;
                Ok(())
            }),
        ]
    }
}

async fn spawn_http_server(codec: Codec, config: HttpConfig) -> String {
    let server = Server::new(codec).with_http_config(config);
    server.register(Int).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    tokio::spawn(async move { server.serve_http_listener(listener).await });
    url
}

#[tokio::test]
async fn test_single_call_replies_with_bare_object() {
    let url = spawn_http_server(Codec::jsonrpc(), HttpConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(&url)
        .body(r#"{"jsonrpc":"2.0","id":"x","method":"Int.Sum","params":{"a":1,"b":2}}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"jsonrpc": "2.0", "id": "x", "result": 3}));
}

#[tokio::test]
async fn test_one_element_params_array_unwraps() {
    let url = spawn_http_server(Codec::jsonrpc(), HttpConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(&url)
        .body(r#"{"jsonrpc":"2.0","id":"y","method":"Int.Sum","params":[{"a":1,"b":2}]}"#)
        .send()
        .await
        .unwrap();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"], json!(3));
    assert_eq!(body["id"], json!("y"));
}

#[tokio::test]
async fn test_batch_replies_with_array() {
    let url = spawn_http_server(Codec::jsonrpc(), HttpConfig::default()).await;
    let client = reqwest::Client::new();

    let request = json!([
        {"jsonrpc": "2.0", "id": "a", "method": "Int.Sum", "params": {"a": 1, "b": 2}},
        {"jsonrpc": "2.0", "id": "b", "method": "Int.Sum", "params": {"a": 2, "b": 3}},
    ]);
    let response = client.post(&url).json(&request).send().await.unwrap();

    let body: Value = response.json().await.unwrap();
    let Value::Array(items) = body else {
        panic!("expected array response, got {body}");
    };
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["result"], json!(3));
    assert_eq!(items[0]["id"], json!("a"));
    assert_eq!(items[1]["result"], json!(5));
    assert_eq!(items[1]["id"], json!("b"));
}

#[tokio::test]
async fn test_one_element_batch_replies_with_array() {
    let url = spawn_http_server(Codec::jsonrpc(), HttpConfig::default()).await;
    let client = reqwest::Client::new();

    let request = json!([
        {"jsonrpc": "2.0", "id": "a", "method": "Int.Sum", "params": {"a": 1, "b": 2}},
    ]);
    let response = client.post(&url).json(&request).send().await.unwrap();

    // arrived as an array on the wire, so the reply stays an array
    let body: Value = response.json().await.unwrap();
    assert!(body.is_array());
}

#[tokio::test]
async fn test_method_not_found_code() {
    let url = spawn_http_server(Codec::jsonrpc(), HttpConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(&url)
        .body(r#"{"jsonrpc":"2.0","id":"m","method":"Int.Missing","params":{}}"#)
        .send()
        .await
        .unwrap();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], json!(-32601));
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Missing"));
}

#[tokio::test]
async fn test_malformed_method_name_code() {
    let url = spawn_http_server(Codec::jsonrpc(), HttpConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(&url)
        .body(r#"{"jsonrpc":"2.0","id":"m","method":"Missing","params":{}}"#)
        .send()
        .await
        .unwrap();

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], json!(-32600));
}

#[tokio::test]
async fn test_non_post_rejected_with_http_200() {
    let url = spawn_http_server(Codec::jsonrpc(), HttpConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], json!(-32601));
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("method not allowed"));
}

#[tokio::test]
async fn test_undecodable_body_yields_parse_error() {
    let url = spawn_http_server(Codec::jsonrpc(), HttpConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client.post(&url).body("not json at all").send().await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], json!(-32700));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_handler_timeout_returns_literal_body() {
    let url = spawn_http_server(
        Codec::jsonrpc(),
        HttpConfig {
            request_timeout: Duration::from_millis(100),
        },
    )
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(&url)
        .body(r#"{"jsonrpc":"2.0","id":"t","method":"Int.Slow","params":{"a":1,"b":2}}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "timeout");
}

#[tokio::test]
async fn test_binary_codec_over_http() {
    let url = spawn_http_server(Codec::binary(), HttpConfig::default()).await;
    let codec = Codec::binary();
    let client = reqwest::Client::new();

    let request = codec.new_request("Int.Sum", &SumArgs { a: 222, b: 333 }).unwrap();
    let body = codec.encode_requests(std::slice::from_ref(&request)).unwrap();

    let response = client.post(&url).body(body).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/plain"
    );

    let bytes = response.bytes().await.unwrap();
    let responses = codec.read_response(&bytes).unwrap();
    assert_eq!(responses.len(), 1);
    let sum: i64 = codec.read_response_body(&responses[0].reply).unwrap();
    assert_eq!(sum, 555);
}
