//! End-to-end tests: real listener, mock backends, reqwest client.

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use shadow_proxy::config::ProxyConfig;
use shadow_proxy::lifecycle::Shutdown;
use shadow_proxy::{HttpServer, ShadowPipeline};
use tower::ServiceExt;

mod common;
use common::{eventually, start_mock_backend, start_raw_backend, unused_addr, MockResponse};

const USER_ROUTE: &str = r"^/api/user/\d+$";

fn config(primary: SocketAddr, shadow: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.backends.primary = format!("http://{}", primary);
    config.backends.shadow = format!("http://{}", shadow);
    config.routes.path_patterns = vec![USER_ROUTE.to_string()];
    config.admin.enabled = false;
    config.observability.metrics_enabled = false;
    config
}

/// Start the proxy on an ephemeral port.
async fn start_proxy(config: ProxyConfig) -> (SocketAddr, ShadowPipeline, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let pipeline = server.pipeline().clone();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let run_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, run_shutdown).await;
    });

    (addr, pipeline, shutdown)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn test_excluded_timestamp_counts_as_identical() {
    let (a, _) = start_mock_backend(MockResponse::json(200, r#"{"a":1,"ts":100}"#)).await;
    let (b, _) = start_mock_backend(MockResponse::json(200, r#"{"a":1,"ts":200}"#)).await;

    let mut config = config(a, b);
    config.comparison.bodies_exclude = vec!["/ts".to_string()];
    let (proxy, pipeline, shutdown) = start_proxy(config).await;

    let res = client()
        .get(format!("http://{}/api/user/42", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), r#"{"a":1,"ts":100}"#);

    let stats = pipeline.statistics().clone();
    assert!(eventually(|| stats.get_or_create(USER_ROUTE).identical_count() == 1).await);
    assert_eq!(stats.get_or_create(USER_ROUTE).mismatch_count(), 0);
    assert!(pipeline.replay_log().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_body_mismatch_is_replayable() {
    let (a, _) = start_mock_backend(MockResponse::json(200, r#"{"a":1}"#)).await;
    let (b, _) = start_mock_backend(MockResponse::json(200, r#"{"a":2}"#)).await;
    let (proxy, pipeline, shutdown) = start_proxy(config(a, b)).await;

    client()
        .post(format!("http://{}/api/user/7?full=1", proxy))
        .body(r#"{"name":"x"}"#)
        .send()
        .await
        .unwrap();

    let log = pipeline.replay_log().clone();
    assert!(eventually(|| !log.query(USER_ROUTE, "body mismatch").is_empty()).await);

    let records = log.query(USER_ROUTE, "body mismatch");
    assert_eq!(records.len(), 1);
    let curl = &records[0].curl_cmd;
    assert!(curl.starts_with(&format!("curl -X POST 'http://{}/api/user/7?full=1'", proxy)));
    assert!(curl.ends_with(r#"--data '{"name":"x"}'"#));
    assert!(!curl.contains("x-source-proxy"));

    let snapshot = &pipeline.statistics().snapshot_all()[0];
    assert_eq!(snapshot.mismatch_count, 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_both_backends_receive_tagged_request() {
    let (a, a_seen) = start_mock_backend(MockResponse::json(200, "{}")).await;
    let (b, b_seen) = start_mock_backend(MockResponse::json(200, "{}")).await;
    let (proxy, pipeline, shutdown) = start_proxy(config(a, b)).await;

    client()
        .get(format!("http://{}/other/path?q=1", proxy))
        .send()
        .await
        .unwrap();

    for seen in [&a_seen, &b_seen] {
        let heads = seen.lock().clone();
        assert_eq!(heads.len(), 1);
        let head = heads[0].to_lowercase();
        assert!(head.starts_with("get /other/path?q=1 http/1.1"));
        assert!(head.contains("x-source-proxy: shadow-proxy"));
        assert!(head.contains("x-request-id: "));
        assert!(head.contains("x-forwarded-for: 127.0.0.1"));
    }

    // Unmatched paths use the literal path as their route key.
    let stats = pipeline.statistics().clone();
    assert!(eventually(|| stats.get_or_create("/other/path").identical_count() == 1).await);

    shutdown.trigger();
}

#[tokio::test]
async fn test_equivalent_status_codes_are_identical() {
    let (a, _) = start_mock_backend(MockResponse::json(200, "{}")).await;
    let (b, _) = start_mock_backend(MockResponse::json(201, "{}")).await;
    let mut config = config(a, b);
    config.comparison.equivalent_status_codes = vec![vec![200, 201]];
    let (proxy, pipeline, shutdown) = start_proxy(config).await;

    let res = client()
        .get(format!("http://{}/api/user/1", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let stats = pipeline.statistics().clone();
    assert!(eventually(|| stats.get_or_create(USER_ROUTE).identical_count() == 1).await);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_shadow_is_backend_error() {
    let (a, _) = start_mock_backend(MockResponse::json(200, r#"{"ok":true}"#)).await;
    let b = unused_addr().await;
    let (proxy, pipeline, shutdown) = start_proxy(config(a, b)).await;

    let res = client()
        .get(format!("http://{}/api/user/3", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), r#"{"ok":true}"#);

    let log = pipeline.replay_log().clone();
    assert!(eventually(|| log.query(USER_ROUTE, "backend error").len() == 1).await);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_primary_returns_bad_gateway() {
    let a = unused_addr().await;
    let (b, b_seen) = start_mock_backend(MockResponse::json(200, "{}")).await;
    let (proxy, pipeline, shutdown) = start_proxy(config(a, b)).await;

    let res = client()
        .get(format!("http://{}/api/user/3", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);
    assert_eq!(b_seen.lock().len(), 1);

    let stats = pipeline.statistics().clone();
    assert!(eventually(|| stats.get_or_create(USER_ROUTE).mismatch_count() == 1).await);

    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_debug_endpoints() {
    let (a, _) = start_mock_backend(MockResponse::json(200, r#"{"a":1}"#)).await;
    let (b, _) = start_mock_backend(MockResponse::json(500, r#"{"a":1}"#)).await;
    let mut config = config(a, b);
    config.admin.api_key = Some("secret".to_string());
    let server = HttpServer::new(config).unwrap();

    let proxied = server
        .router()
        .oneshot(Request::get("/api/user/9").header("host", "svc").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(proxied.status(), StatusCode::OK);

    let log = server.replay_log();
    assert!(eventually(|| !log.query(USER_ROUTE, "status code mismatch").is_empty()).await);

    let admin = server.admin_router();

    let denied = admin
        .clone()
        .oneshot(Request::get("/debug/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let uri = format!(
        "/debug/errors?api={}&state=status%20code%20mismatch",
        USER_ROUTE.replace('\\', "%5C").replace('^', "%5E").replace('$', "%24")
    );
    let errors = admin
        .clone()
        .oneshot(
            Request::get(uri.as_str())
                .header("authorization", "Bearer secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(errors.status(), StatusCode::OK);
    let body = errors.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["outcome"], "status code mismatch");
    // The proxy-assigned request ID is not part of what the client sent.
    assert_eq!(json[0]["curl_cmd"], "curl -X GET 'http://svc/api/user/9' -H 'host: svc'");

    let empty = admin
        .oneshot(
            Request::get("/debug/errors?api=/nope&state=ok")
                .header("authorization", "Bearer secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = empty.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"[]");
}

#[tokio::test]
async fn test_client_request_id_kept_in_replay() {
    let (a, _) = start_mock_backend(MockResponse::json(200, r#"{"a":1}"#)).await;
    let (b, _) = start_mock_backend(MockResponse::json(200, r#"{"a":2}"#)).await;
    let server = HttpServer::new(config(a, b)).unwrap();

    let response = server
        .router()
        .oneshot(
            Request::get("/api/user/5")
                .header("host", "svc")
                .header("x-request-id", "trace-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-1");

    let log = server.replay_log();
    assert!(eventually(|| !log.query(USER_ROUTE, "body mismatch").is_empty()).await);
    assert_eq!(
        log.query(USER_ROUTE, "body mismatch")[0].curl_cmd,
        "curl -X GET 'http://svc/api/user/5' -H 'host: svc' -H 'x-request-id: trace-1'"
    );
}

#[tokio::test]
async fn test_truncated_primary_body_is_body_mismatch() {
    // Declares 100 bytes but sends 7 before closing.
    let a = start_raw_backend(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\nConnection: close\r\n\r\n{\"a\":1}",
    )
    .await;
    let (b, _) = start_mock_backend(MockResponse::json(200, r#"{"a":1}"#)).await;
    let (proxy, pipeline, shutdown) = start_proxy(config(a, b)).await;

    let _ = client()
        .get(format!("http://{}/api/user/8", proxy))
        .send()
        .await;

    let log = pipeline.replay_log().clone();
    assert!(eventually(|| log.query(USER_ROUTE, "body mismatch").len() == 1).await);

    let snapshot = &pipeline.statistics().snapshot_all()[0];
    assert_eq!(snapshot.mismatch_count, 1);
    assert_eq!(snapshot.identical_count, 0);

    shutdown.trigger();
}
