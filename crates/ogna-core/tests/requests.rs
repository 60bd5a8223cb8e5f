mod helpers;

use helpers::*;
use ogna_core::auth::LOCAL_TOKEN_KEY;
use ogna_core::persist::LocalStore;
use ogna_core::{ApiResult, ClientError, Method, Persistence, RequestOptions, ResultEnvelope, Session};
use serde::Deserialize;
use serde_json::{json, Value};
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session(token: &str) -> Session {
    serde_json::from_value(session_json(token, "u1")).expect("Failed to parse session test JSON")
}

#[derive(Debug, Deserialize, PartialEq)]
struct Bucket {
    id: String,
    name: String,
}

#[tokio::test]
async fn test_request_without_session_never_reaches_the_wire() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Persistence::memory());
    let result: ApiResult<Value> = client.get("/things").await;
    assert_eq!(result, Err(ClientError::NoToken));

    let result: ApiResult<Value> = client.post("/items", &json!({"name": "x"})).await;
    let envelope = ResultEnvelope::from(result);
    assert_eq!(
        serde_json::to_value(&envelope).unwrap(),
        json!({"data": null, "error": {"msg": "No token available"}})
    );
}

#[tokio::test]
async fn test_error_status_embeds_method_url_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server, Persistence::memory());
    client.set_session(Some(session("T1")));

    let result: ApiResult<Value> = client.post("/items", &json!({"name": "x"})).await;
    let err = result.unwrap_err();
    let url = format!("{}/api/items", server.uri());
    assert_eq!(err.msg(), format!("API POST {} failed: 500 boom", url));
    assert_eq!(err.status(), Some(500));

    let envelope: ResultEnvelope<Value> = Err(err).into();
    assert_eq!(envelope.data, None);
    assert_eq!(
        envelope.error.and_then(|e| e.msg),
        Some(format!("API POST {} failed: 500 boom", url))
    );
}

#[tokio::test]
async fn test_body_is_json_with_forced_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/buckets/b1"))
        .and(header("authorization", "Bearer T1"))
        .and(header("content-type", "application/json"))
        .and(header("x-request-id", "req-7"))
        .and(body_json(json!({"name": "renamed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "b1", "name": "renamed"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server, Persistence::memory());
    client.set_session(Some(session("T1")));

    let options = RequestOptions::new()
        .header("X-Request-Id", "req-7")
        .header("Content-Type", "text/plain");
    let bucket: Bucket = client
        .request(Method::Put, "/buckets/b1", Some(&json!({"name": "renamed"})), &options)
        .await
        .expect("put should succeed");
    assert_eq!(bucket, Bucket { id: "b1".to_string(), name: "renamed".to_string() });
}

#[tokio::test]
async fn test_delete_without_body_and_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/buckets/b1"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server, Persistence::memory());
    client.set_session(Some(session("T1")));

    let result: Value = client.delete("buckets/b1").await.expect("delete should succeed");
    assert_eq!(result, Value::Null);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body.is_empty());
    assert!(requests[0].headers.get("content-type").is_none());
}

#[tokio::test]
async fn test_malformed_success_body_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/buckets"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let mut client = client_for(&server, Persistence::memory());
    client.set_session(Some(session("T1")));

    let result: ApiResult<Vec<Bucket>> = client.get("/buckets").await;
    assert!(matches!(result, Err(ClientError::InvalidResponse(ref msg)) if !msg.is_empty()));
}

#[tokio::test]
async fn test_local_store_token_wins_over_memory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/things"))
        .and(header("authorization", "Bearer FROM_OTHER_TAB"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let substrates = Substrates::new();
    let mut client = client_for(&server, substrates.persistence());
    client.set_session(Some(session("T1")));
    substrates.local.set_item(LOCAL_TOKEN_KEY, "FROM_OTHER_TAB").unwrap();

    let things: Vec<Value> = client.get("/things").await.unwrap();
    assert!(things.is_empty());
    assert_eq!(client.session().map(|s| s.access_token.as_str()), Some("T1"));
}

#[tokio::test]
async fn test_ephemeral_client_uses_in_memory_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/things"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server, Persistence::Ephemeral);
    client.set_session(Some(session("T1")));
    let value: Value = client.get("/things").await.unwrap();
    assert_eq!(value, json!({"ok": true}));
}
