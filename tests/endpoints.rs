//! End-to-end tests for the health endpoints.
//!
//! The router runs in-process via `tower::ServiceExt::oneshot`, with a fake
//! role source standing in for Redis.
//!
//! Run with: cargo test --test endpoints
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use rolecheck::store::{LinkState, ReplyError, RoleReply, RoleSource};
use rolecheck::{create_router, AppState, StoreError};

/// What the fake Redis answers to every ROLE query
#[derive(Clone)]
enum Fixture {
    Reply(RoleReply),
    Unreachable,
    Malformed,
}

struct FakeRedis {
    fixture: Fixture,
    queries: Arc<AtomicUsize>,
}

#[async_trait]
impl RoleSource for FakeRedis {
    async fn role(&self) -> Result<RoleReply, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match &self.fixture {
            Fixture::Reply(reply) => Ok(reply.clone()),
            Fixture::Unreachable => Err(StoreError::Timeout(Duration::from_secs(3))),
            Fixture::Malformed => Err(StoreError::Malformed(ReplyError::Malformed {
                label: Some("slave".to_string()),
                reason: "slave reply has 2 elements, expected 5".to_string(),
            })),
        }
    }
}

fn app_with(fixture: Fixture) -> (Router, Arc<AtomicUsize>) {
    let queries = Arc::new(AtomicUsize::new(0));
    let store = FakeRedis {
        fixture,
        queries: queries.clone(),
    };
    let state = AppState::new(store);
    (create_router(state), queries)
}

fn master() -> Fixture {
    Fixture::Reply(RoleReply::Master {
        replication_offset: 0,
        replicas: vec![],
    })
}

fn replica(link_state: &str) -> Fixture {
    Fixture::Reply(RoleReply::Replica {
        master_host: "127.0.0.1".to_string(),
        master_port: 6379,
        link_state: LinkState::parse(link_state),
        replication_offset: 0,
    })
}

async fn get(app: &Router, path: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn master_is_ok_on_both_endpoints() {
    let (app, _) = app_with(master());

    assert_eq!(
        get(&app, "/status").await,
        (StatusCode::OK, "Redis master Healthy\n".to_string())
    );
    assert_eq!(
        get(&app, "/lb_status").await,
        (StatusCode::OK, "Redis master Healthy\n".to_string())
    );
}

#[tokio::test]
async fn connected_replica_is_healthy_but_not_serving_traffic() {
    let (app, _) = app_with(replica("connected"));

    assert_eq!(
        get(&app, "/status").await,
        (StatusCode::OK, "Redis slave connected\n".to_string())
    );
    assert_eq!(
        get(&app, "/lb_status").await,
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Redis slave Not serving traffic\n".to_string()
        )
    );
}

#[tokio::test]
async fn unsynced_replica_is_unavailable_on_both_endpoints() {
    for link_state in ["connect", "connecting", "sync"] {
        let (app, _) = app_with(replica(link_state));

        assert_eq!(
            get(&app, "/status").await,
            (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Redis slave Unhealthy state: {}\n", link_state)
            )
        );
        assert_eq!(
            get(&app, "/lb_status").await,
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Redis slave Not serving traffic\n".to_string()
            )
        );
    }
}

#[tokio::test]
async fn unreachable_redis_cannot_connect() {
    let (app, _) = app_with(Fixture::Unreachable);

    for path in ["/status", "/lb_status"] {
        assert_eq!(
            get(&app, path).await,
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Redis Server Unavailable - Cannot connect\n".to_string()
            )
        );
    }
}

#[tokio::test]
async fn malformed_reply_fails_closed() {
    let (app, _) = app_with(Fixture::Malformed);

    assert_eq!(
        get(&app, "/status").await,
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Redis slave Malformed reply\n".to_string()
        )
    );
    assert_eq!(
        get(&app, "/lb_status").await,
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Redis slave Not serving traffic\n".to_string()
        )
    );
}

#[tokio::test]
async fn each_request_queries_redis_once() {
    let (app, queries) = app_with(master());

    get(&app, "/status").await;
    get(&app, "/lb_status").await;
    get(&app, "/status").await;

    assert_eq!(queries.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn repeated_requests_are_identical() {
    let (app, _) = app_with(replica("sync"));

    let first = get(&app, "/status").await;
    let second = get(&app, "/status").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn responses_are_plain_text_and_uncached() {
    let (app, _) = app_with(master());

    let response = app
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
}

#[tokio::test]
async fn unknown_path_is_not_found_and_skips_redis() {
    let (app, queries) = app_with(master());

    assert_eq!(get(&app, "/health").await.0, StatusCode::NOT_FOUND);
    assert_eq!(queries.load(Ordering::SeqCst), 0);
}
