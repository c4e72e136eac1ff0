//! Live server tests over TCP.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};

use quick_router::config::ServerConfig;
use quick_router::{Ctx, Router};

fn demo_router() -> Router {
    let router = Router::new();
    router
        .get("/v1/customer/:id", |c: &mut Ctx| {
            let id = c.param("id").to_string();
            c.json(&json!({ "id": id }))
        })
        .unwrap();
    router
        .post("/bind", |c: &mut Ctx| {
            let value: Value = c.bind()?;
            c.json(&value)
        })
        .unwrap();
    router
        .get("/slow", |c: &mut Ctx| {
            std::thread::sleep(Duration::from_millis(500));
            c.send_string("done")
        })
        .unwrap();
    router
}

#[tokio::test]
async fn test_serves_routes() {
    let (addr, shutdown) = common::start_server(demo_router(), ServerConfig::default()).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("http://{}/v1/customer/42", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "id": "42" }));

    let missing = client.get(format!("http://{}/nope", addr)).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(missing.text().await.unwrap(), "404 page not found");

    shutdown.trigger();
}

#[tokio::test]
async fn test_post_body_round_trip() {
    let (addr, shutdown) = common::start_server(demo_router(), ServerConfig::default()).await;

    let res = reqwest::Client::new()
        .post(format!("http://{}/bind", addr))
        .json(&json!({ "name": "jeff", "age": 35 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), r#"{"age":35,"name":"jeff"}"#);

    shutdown.trigger();
}

#[tokio::test]
async fn test_body_limit() {
    let mut config = ServerConfig::default();
    config.listener.max_body_size = 16;
    let (addr, shutdown) = common::start_server(demo_router(), config).await;

    let res = reqwest::Client::new()
        .post(format!("http://{}/bind", addr))
        .header("Content-Type", "application/json")
        .body(format!(r#"{{"pad":"{}"}}"#, "x".repeat(64)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let (addr, shutdown) = common::start_server(demo_router(), ServerConfig::default()).await;

    let res = reqwest::Client::new()
        .get(format!("http://{}/v1/customer/1", addr))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");

    shutdown.trigger();
}

#[tokio::test]
async fn test_blocking_handler_does_not_stall_others() {
    let (addr, shutdown) = common::start_server(demo_router(), ServerConfig::default()).await;
    let client = reqwest::Client::new();

    let slow = tokio::spawn({
        let client = client.clone();
        async move { client.get(format!("http://{}/slow", addr)).send().await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let fast = client
        .get(format!("http://{}/v1/customer/7", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(fast.status(), StatusCode::OK);
    assert!(!slow.is_finished());

    let slow = slow.await.unwrap().unwrap();
    assert_eq!(slow.text().await.unwrap(), "done");

    shutdown.trigger();
}
