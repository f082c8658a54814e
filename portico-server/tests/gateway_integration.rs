//! Gateway integration tests.
//!
//! Router-level tests drive the assembled router with `tower::oneshot`
//! (origin policy, GraphQL surface, REST routes); lifecycle tests start a
//! real listener to verify startup ordering, drain behavior, and
//! startup-fatal conditions.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::Value;
use tokio::sync::{oneshot, Notify};
use tower::ServiceExt;

use portico_server::{
    build_router_with, graphql, rest_routes, AppState, Config, CorsPolicy, Gateway, GatewayError,
    Identity, Phase, SharedConnections,
};

/// Config pointing at ports nothing listens on; both store clients parse
/// without dialing, so tests never need live backing stores.
fn lazy_config() -> Config {
    Config {
        port: 0,
        redis_url: "redis://127.0.0.1:1".to_string(),
        mongodb_url: "mongodb://127.0.0.1:1".to_string(),
        ..Config::default()
    }
}

async fn test_connections() -> Arc<SharedConnections> {
    Arc::new(SharedConnections::connect(&lazy_config()).await.unwrap())
}

async fn test_app(allowed_origins: Vec<&str>) -> Router {
    let connections = test_connections().await;
    let schema = graphql::init().await.unwrap();
    let cors = Arc::new(CorsPolicy::new(
        allowed_origins.into_iter().map(String::from).collect(),
    ));
    let state = AppState::new(connections, cors, schema);
    build_router_with(state, rest_routes(), &lazy_config())
}

async fn default_app() -> Router {
    test_app(vec![
        "http://localhost:4000",
        "https://studio.apollographql.com",
    ])
    .await
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Origin policy
// ============================================================================

#[tokio::test]
async fn test_request_without_origin_is_allowed() {
    let app = default_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "portico-server");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_allowed_origin_passes_with_cors_headers() {
    for origin in ["http://localhost:4000", "https://studio.apollographql.com"] {
        let app = default_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("Origin", origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some(origin)
        );
    }
}

#[tokio::test]
async fn test_denied_origin_gets_policy_violation() {
    // Both the REST routes and the GraphQL endpoint sit behind the gate.
    for uri in ["/health", "/graphql"] {
        let app = default_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Origin", "https://evil.example")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"query":"{ __typename }"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let json = body_json(response).await;
        assert_eq!(json["code"], "CORS_ORIGIN_DENIED");
        assert!(json["error"]
            .as_str()
            .unwrap()
            .contains("CORS policy"));
    }
}

#[tokio::test]
async fn test_empty_allow_list_denies_browsers_but_not_cli_clients() {
    let app = test_app(vec![]).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let app = test_app(vec![]).await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:4000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// GraphQL surface
// ============================================================================

#[tokio::test]
async fn test_graphql_service_query() {
    let app = default_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/graphql")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"query":"{ service { name version } }"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["service"]["name"], "portico-server");
    assert!(json["data"]["service"]["version"].is_string());
}

#[tokio::test]
async fn test_graphql_viewer_is_null_without_identity() {
    let app = default_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/graphql")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"query":"{ viewer }"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert!(json["data"]["viewer"].is_null());
}

#[tokio::test]
async fn test_graphql_viewer_reflects_forwarded_identity() {
    let app = default_app().await;

    let mut request = Request::builder()
        .method("POST")
        .uri("/graphql")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"query":"{ viewer }"}"#))
        .unwrap();
    // Upstream middleware attaches identity; the gateway only forwards it.
    request.extensions_mut().insert(Identity {
        subject: "user-123".to_string(),
    });

    let response = app.oneshot(request).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"]["viewer"], "user-123");
}

#[tokio::test]
async fn test_graphiql_served_on_get() {
    let app = default_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/graphql")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_listening_with_unreachable_stores() {
    // Connections stay lazily-unverified: the listener accepts as soon as
    // the execution layer is up, with no store reachability check.
    let running = Gateway::new(lazy_config(), test_connections().await)
        .with_routes(rest_routes())
        .start()
        .await
        .unwrap();

    let mut phase = running.phase();
    assert_eq!(*phase.borrow(), Phase::Listening);

    let url = format!("http://{}/health", running.local_addr());
    let response = reqwest::get(url).await.unwrap();
    assert_eq!(response.status(), 200);

    running.shutdown();
    running.finished().await.unwrap();
    assert_eq!(*phase.borrow_and_update(), Phase::Stopped);
}

#[tokio::test]
async fn test_listener_waits_for_execution_layer_init() {
    let gateway = Gateway::new(lazy_config(), test_connections().await);
    let mut phase = gateway.phase();

    let (release_tx, release_rx) = oneshot::channel::<()>();
    let startup = tokio::spawn(gateway.start_with_schema(async move {
        release_rx.await.ok();
        graphql::init().await
    }));

    // While init is gated the transport must still be in Starting: the
    // socket is not yet bound, let alone accepting.
    phase.wait_for(|p| *p == Phase::Starting).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*phase.borrow_and_update(), Phase::Starting);

    release_tx.send(()).unwrap();
    let running = startup.await.unwrap().unwrap();
    assert_eq!(*phase.borrow_and_update(), Phase::Listening);

    running.shutdown();
    running.finished().await.unwrap();
}

#[tokio::test]
async fn test_failing_execution_layer_init_is_startup_fatal() {
    let gateway = Gateway::new(lazy_config(), test_connections().await);
    let phase = gateway.phase();

    let result = gateway
        .start_with_schema(async { Err(GatewayError::ExecutionInit("schema build failed".into())) })
        .await;

    assert!(matches!(result, Err(GatewayError::ExecutionInit(_))));
    // Never reached Listening; no socket was bound.
    assert_eq!(*phase.borrow(), Phase::Starting);
}

#[tokio::test]
async fn test_bind_conflict_is_startup_fatal() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = Config {
        port: occupied.local_addr().unwrap().port(),
        ..lazy_config()
    };

    let result = Gateway::new(config, test_connections().await)
        .start()
        .await;

    assert!(matches!(result, Err(GatewayError::Bind { .. })));
}

#[tokio::test]
async fn test_drain_refuses_new_connections_and_completes_inflight() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    let slow_route = {
        let entered = Arc::clone(&entered);
        let release = Arc::clone(&release);
        Router::new().route(
            "/slow",
            get(move || {
                let entered = Arc::clone(&entered);
                let release = Arc::clone(&release);
                async move {
                    entered.notify_one();
                    release.notified().await;
                    "drained"
                }
            }),
        )
    };

    let running = Gateway::new(lazy_config(), test_connections().await)
        .with_routes(slow_route)
        .start()
        .await
        .unwrap();
    let addr = running.local_addr();

    let inflight =
        tokio::spawn(async move { reqwest::get(format!("http://{addr}/slow")).await });

    // Wait until the request is inside the handler, then request a drain.
    entered.notified().await;
    running.shutdown();

    let mut phase = running.phase();
    phase.wait_for(|p| *p == Phase::Draining).await.unwrap();

    // New connection attempts are refused once the listener closed.
    let mut refused = false;
    for _ in 0..50 {
        match tokio::net::TcpStream::connect(addr).await {
            Err(_) => {
                refused = true;
                break;
            }
            Ok(_) => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    assert!(refused, "new connections must be refused during drain");

    // The request that was in flight before the drain still completes.
    release.notify_one();
    let response = inflight.await.unwrap().unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "drained");

    running.finished().await.unwrap();
    assert_eq!(*phase.borrow_and_update(), Phase::Stopped);
}
