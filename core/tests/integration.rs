//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port in its own runtime
//! thread, then drives `Plug` over real HTTP through `UreqTransport`. The
//! echo endpoint reports what actually went over the wire, so verb
//! emulation, injected query parameters and headers are checked as the
//! server saw them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mock_server::{EchoedRequest, REQUEST_ID};
use plug_core::{Plug, PlugError, PlugOptions, UreqTransport};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn root(addr: SocketAddr) -> Plug {
    Plug::new(&format!("http://{addr}"), Arc::new(UreqTransport::new())).unwrap()
}

fn echoed(body: &str) -> EchoedRequest {
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn get_sends_injected_query_parameters() {
    let addr = start_server();
    let body = root(addr).at(["echo", "api", "items"]).get().await.unwrap();

    let seen = echoed(&body);
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path, "/echo/api/items");
    assert!(seen.query["_"].parse::<i64>().is_ok());
    assert_eq!(seen.query["origin"], "mt-web");
    assert_eq!(seen.query["dream.out.format"], "json");
    assert!(!seen.headers.contains_key("front-end-https"));
}

#[tokio::test]
async fn builder_params_and_headers_reach_the_server() {
    let addr = start_server();
    let body = root(addr)
        .at(["echo"])
        .with_params([("limit", "10"), ("offset", "20")])
        .without_param("offset")
        .with_header("X-Deki-Client", "tests")
        .get()
        .await
        .unwrap();

    let seen = echoed(&body);
    assert_eq!(seen.query["limit"], "10");
    assert!(!seen.query.contains_key("offset"));
    assert_eq!(seen.headers["x-deki-client"], "tests");
}

#[tokio::test]
async fn raw_mode_skips_format_negotiation() {
    let addr = start_server();
    let options = PlugOptions {
        raw: true,
        ..PlugOptions::default()
    };
    let plug = Plug::with_options(&format!("http://{addr}"), options, Arc::new(UreqTransport::new())).unwrap();

    let seen = echoed(&plug.at(["echo"]).get().await.unwrap());
    assert!(!seen.query.contains_key("dream.out.format"));
    assert_eq!(seen.query["origin"], "mt-web");
}

#[tokio::test]
async fn post_sends_body_and_content_type() {
    let addr = start_server();
    let body = root(addr)
        .at(["echo", "search"])
        .post(Some(r#"{"q":"rust"}"#.to_string()), Some("application/json"))
        .await
        .unwrap();

    let seen = echoed(&body);
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.headers["content-type"], "application/json");
    assert_eq!(seen.body, r#"{"q":"rust"}"#);
}

#[tokio::test]
async fn put_goes_out_as_post_with_override() {
    let addr = start_server();
    let body = root(addr)
        .at(["echo", "items", "5"])
        .put(Some("title=x".to_string()), Some("text/plain"))
        .await
        .unwrap();

    let seen = echoed(&body);
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.headers["x-http-method-override"], "PUT");
    assert_eq!(seen.headers["content-type"], "text/plain");
    assert_eq!(seen.body, "title=x");
}

#[tokio::test]
async fn del_goes_out_as_bodyless_post_with_override() {
    let addr = start_server();
    let body = root(addr).at(["echo", "items", "5"]).del().await.unwrap();

    let seen = echoed(&body);
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.path, "/echo/items/5");
    assert_eq!(seen.headers["x-http-method-override"], "DELETE");
    assert!(seen.body.is_empty());
}

#[tokio::test]
async fn head_and_options_use_their_own_verbs() {
    let addr = start_server();
    let plug = root(addr).at(["echo"]);

    let head = plug.head_raw().await.unwrap();
    assert_eq!(head.status, 200);
    assert!(head.body.is_empty());
    assert_eq!(plug.head().await.unwrap(), "");

    let seen = echoed(&plug.options().await.unwrap());
    assert_eq!(seen.method, "OPTIONS");
}

#[tokio::test]
async fn raw_response_carries_headers() {
    let addr = start_server();
    let response = root(addr).at(["echo"]).get_raw().await.unwrap();
    assert_eq!(response.status, 200);
    assert!(response.header(REQUEST_ID).is_some());
}

#[tokio::test]
async fn classified_tier_rejects_error_statuses() {
    let addr = start_server();
    let plug = root(addr);

    let err = plug.at(["status", "404"]).get().await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.response().unwrap().body, "status 404");

    let err = plug.at(["status", "500"]).post(None, None).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn classified_tier_accepts_success_and_not_modified() {
    let addr = start_server();
    let plug = root(addr);

    assert_eq!(plug.at(["status", "201"]).get().await.unwrap(), "status 201");
    assert_eq!(plug.at(["status", "304"]).get().await.unwrap(), "");
}

#[tokio::test]
async fn raw_tier_returns_error_statuses() {
    let addr = start_server();
    let response = root(addr).at(["status", "500"]).get_raw().await.unwrap();
    assert_eq!(response.status, 500);
    assert_eq!(response.body, "status 500");
}

#[tokio::test]
async fn timeout_fails_both_tiers() {
    let addr = start_server();
    let plug = root(addr)
        .at(["slow", "2000"])
        .with_timeout(Duration::from_millis(100));

    assert!(matches!(plug.get_raw().await, Err(PlugError::Timeout)));
    assert!(matches!(plug.get().await, Err(PlugError::Timeout)));
}

#[tokio::test]
async fn connection_failure_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let err = root(addr).at(["echo"]).get_raw().await.unwrap_err();
    assert!(matches!(err, PlugError::Transport(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn calls_run_concurrently_from_one_root() {
    let addr = start_server();
    let plug = root(addr);

    let (first, second, slow) = (plug.at(["echo", "a"]), plug.at(["echo", "b"]), plug.at(["slow", "50"]));

    let (a, b, c) = tokio::join!(first.get(), second.get(), slow.get());
    assert_eq!(echoed(&a.unwrap()).path, "/echo/a");
    assert_eq!(echoed(&b.unwrap()).path, "/echo/b");
    assert_eq!(c.unwrap(), "ok");
}
