//! Contract tests for the DingTalk token endpoint client, run against a
//! wiremock upstream.
//!
//! These pin the wire behavior the credential lifecycle depends on:
//! 1. `errcode == 0` + access_token → success, TTL taken from `expires_in`
//! 2. missing `expires_in` → 7200 s default
//! 3. `errcode != 0` → upstream error carrying `errmsg`
//! 4. malformed body → error, never a zero-value token
//! 5. the probe endpoint treats any non-2xx as rejection

use backoffice::dingtalk::client::DingTalkClient;
use backoffice::errors::AppError;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_token_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gettoken"))
        .and(query_param("appkey", "key1"))
        .and(query_param("appsecret", "sec1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 0,
            "errmsg": "ok",
            "access_token": "tok-abc",
            "expires_in": 3600,
        })))
        .mount(&server)
        .await;

    let client = DingTalkClient::new(server.uri());
    let token = client.fetch_token("key1", "sec1").await.unwrap();
    assert_eq!(token.access_token, "tok-abc");
    assert_eq!(token.expires_in, 3600);
}

#[tokio::test]
async fn test_fetch_token_defaults_ttl_when_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gettoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 0,
            "errmsg": "ok",
            "access_token": "tok-abc",
        })))
        .mount(&server)
        .await;

    let client = DingTalkClient::new(server.uri());
    let token = client.fetch_token("key1", "sec1").await.unwrap();
    assert_eq!(token.expires_in, 7200);
}

#[tokio::test]
async fn test_fetch_token_nonzero_errcode_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gettoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errcode": 40089,
            "errmsg": "invalid appkey or appsecret",
        })))
        .mount(&server)
        .await;

    let client = DingTalkClient::new(server.uri());
    match client.fetch_token("bad", "bad").await {
        Err(AppError::Upstream(msg)) => assert!(msg.contains("invalid appkey or appsecret")),
        other => panic!("expected Upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_token_malformed_body_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gettoken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway error</html>"))
        .mount(&server)
        .await;

    let client = DingTalkClient::new(server.uri());
    assert!(matches!(
        client.fetch_token("key1", "sec1").await,
        Err(AppError::Upstream(_))
    ));
}

#[tokio::test]
async fn test_fetch_token_unreachable_upstream_fails() {
    // Nothing is listening on this port.
    let client = DingTalkClient::new("http://127.0.0.1:1");
    assert!(matches!(
        client.fetch_token("key1", "sec1").await,
        Err(AppError::Upstream(_))
    ));
}

#[tokio::test]
async fn test_probe_accepts_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topapi/v2/user/get"))
        .and(query_param("access_token", "tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errcode": 0})))
        .mount(&server)
        .await;

    let client = DingTalkClient::new(server.uri());
    client.probe("tok-abc").await.unwrap();
}

#[tokio::test]
async fn test_probe_rejects_non_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topapi/v2/user/get"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = DingTalkClient::new(server.uri());
    match client.probe("stale-token").await {
        Err(AppError::Upstream(msg)) => assert!(msg.contains("401")),
        other => panic!("expected Upstream error, got {other:?}"),
    }
}
