//! Integration tests for the endpoint-discovery mirror.

use std::time::{Duration, Instant};

use axum::http::header::CONTENT_TYPE;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

#[tokio::test]
async fn mirrors_upstream_document_unchanged() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"foo":"bar"}"#, "application/json"))
        .mount(&upstream)
        .await;

    let storage = tempfile::tempdir().unwrap();
    let (addr, shutdown, _handle) =
        common::spawn_relay(common::relay_config(&upstream.uri(), storage.path()), None).await;

    let response = reqwest::get(format!("http://{addr}/api/v1/endpoints"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(response.bytes().await.unwrap(), r#"{"foo":"bar"}"#.as_bytes());

    shutdown.trigger();
}

#[tokio::test]
async fn passthrough_is_byte_for_byte() {
    // Odd whitespace and key order survive only if the body is never
    // re-serialized.
    let body = "{\n  \"zeta\": 1,\n\t\"alpha\": [1, 2,    3]\n}";
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&upstream)
        .await;

    let storage = tempfile::tempdir().unwrap();
    let (addr, shutdown, _handle) =
        common::spawn_relay(common::relay_config(&upstream.uri(), storage.path()), None).await;

    let relayed = reqwest::get(format!("http://{addr}/api/v1/endpoints"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(relayed, body.as_bytes());

    shutdown.trigger();
}

#[tokio::test]
async fn requests_json_from_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/endpoints"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .expect(1)
        .mount(&upstream)
        .await;

    let storage = tempfile::tempdir().unwrap();
    let (addr, shutdown, _handle) =
        common::spawn_relay(common::relay_config(&upstream.uri(), storage.path()), None).await;

    let response = reqwest::get(format!("http://{addr}/api/v1/endpoints"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn upstream_error_maps_to_502() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/endpoints"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;

    let storage = tempfile::tempdir().unwrap();
    let (addr, shutdown, _handle) =
        common::spawn_relay(common::relay_config(&upstream.uri(), storage.path()), None).await;

    let response = reqwest::get(format!("http://{addr}/api/v1/endpoints"))
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("500"));

    shutdown.trigger();
}

#[tokio::test]
async fn unreachable_upstream_maps_to_502() {
    // Bind and immediately drop a listener so the port is known to refuse.
    let refused = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let upstream_addr = refused.local_addr().unwrap();
    drop(refused);

    let storage = tempfile::tempdir().unwrap();
    let (addr, shutdown, _handle) = common::spawn_relay(
        common::relay_config(&format!("http://{upstream_addr}"), storage.path()),
        None,
    )
    .await;

    let response = reqwest::get(format!("http://{addr}/api/v1/endpoints"))
        .await
        .unwrap();
    assert_eq!(response.status(), 502);

    shutdown.trigger();
}

#[tokio::test]
async fn unresponsive_upstream_maps_to_504_within_bound() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/endpoints"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("{}", "application/json")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&upstream)
        .await;

    let storage = tempfile::tempdir().unwrap();
    let (addr, shutdown, _handle) =
        common::spawn_relay(common::relay_config(&upstream.uri(), storage.path()), None).await;

    let start = Instant::now();
    let response = reqwest::get(format!("http://{addr}/api/v1/endpoints"))
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(response.status(), 504);
    assert!(
        elapsed < Duration::from_secs(4),
        "timeout took {elapsed:?}, expected the 1s upstream bound to fire"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn concurrent_relays_pair_responses_with_their_upstreams() {
    let mut relays = Vec::new();
    for i in 0..4 {
        let upstream = MockServer::start().await;
        let body = format!(r#"{{"relay":{i}}}"#);
        Mock::given(method("GET"))
            .and(path("/api/v1/endpoints"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body.clone(), "application/json"))
            .mount(&upstream)
            .await;

        let storage = tempfile::tempdir().unwrap();
        let (addr, shutdown, _handle) =
            common::spawn_relay(common::relay_config(&upstream.uri(), storage.path()), None).await;
        relays.push((addr, body, upstream, storage, shutdown));
    }

    let mut tasks = Vec::new();
    for (addr, expected, ..) in &relays {
        let addr = *addr;
        let expected = expected.clone();
        tasks.push(tokio::spawn(async move {
            let body = reqwest::get(format!("http://{addr}/api/v1/endpoints"))
                .await
                .unwrap()
                .text()
                .await
                .unwrap();
            assert_eq!(body, expected);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for (_, _, _, _, shutdown) in &relays {
        shutdown.trigger();
    }
}

#[tokio::test]
async fn concurrent_requests_do_not_interfere() {
    let upstream = MockServer::start().await;
    let body = r#"{"endpoints":["a","b","c"]}"#;
    Mock::given(method("GET"))
        .and(path("/api/v1/endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&upstream)
        .await;

    let storage = tempfile::tempdir().unwrap();
    let (addr, shutdown, _handle) =
        common::spawn_relay(common::relay_config(&upstream.uri(), storage.path()), None).await;

    let client = reqwest::Client::new();
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            client
                .get(format!("http://{addr}/api/v1/endpoints"))
                .send()
                .await
                .unwrap()
                .text()
                .await
                .unwrap()
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap(), body);
    }

    shutdown.trigger();
}
