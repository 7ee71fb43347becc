//! Health endpoints for load balancers and orchestration probes.
//!
//! - `GET /status` reports general health: a master, or a replica whose link
//!   to its master is `connected`, answers 200.
//! - `GET /lb_status` reports load-balancer eligibility: only a healthy master
//!   answers 200. A connected replica is healthy but never receives traffic.
//!
//! Every request issues exactly one `ROLE` query; nothing is cached.

use axum::extract::State;
use http::StatusCode;

use crate::state::AppState;
use crate::status::{interpret, NormalizedStatus};

/// Body returned by both endpoints when Redis cannot be reached
pub const UNAVAILABLE_BODY: &str = "Redis Server Unavailable - Cannot connect\n";

/// Detail shown by `/lb_status` for anything that is not a healthy master
pub const NOT_SERVING_DETAIL: &str = "Not serving traffic";

/// Map a verdict to the `/status` response.
pub fn render_status(status: &NormalizedStatus) -> (StatusCode, String) {
    if !status.is_available() {
        return (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_BODY.to_string());
    }

    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, format!("Redis {} {}\n", status.label, status.detail))
}

/// Map a verdict to the `/lb_status` response.
pub fn render_lb_status(status: &NormalizedStatus) -> (StatusCode, String) {
    if !status.is_available() {
        return (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_BODY.to_string());
    }

    if status.is_lb_eligible() {
        (
            StatusCode::OK,
            format!("Redis {} {}\n", status.label, status.detail),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Redis {} {}\n", status.label, NOT_SERVING_DETAIL),
        )
    }
}

async fn current_status(state: &AppState) -> NormalizedStatus {
    let status = interpret(state.store.role().await);
    tracing::info!(
        role = ?status.role,
        healthy = status.healthy,
        detail = %status.detail,
        "Classified Redis role"
    );
    status
}

/// `GET /status`
pub async fn status(State(state): State<AppState>) -> (StatusCode, String) {
    render_status(&current_status(&state).await)
}

/// `GET /lb_status`
pub async fn lb_status(State(state): State<AppState>) -> (StatusCode, String) {
    render_lb_status(&current_status(&state).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{LinkState, RoleReply};
    use std::time::Duration;

    fn replica(link_state: &str) -> NormalizedStatus {
        interpret(Ok(RoleReply::Replica {
            master_host: "127.0.0.1".to_string(),
            master_port: 6379,
            link_state: LinkState::parse(link_state),
            replication_offset: 0,
        }))
    }

    fn master() -> NormalizedStatus {
        interpret(Ok(RoleReply::Master {
            replication_offset: 0,
            replicas: vec![],
        }))
    }

    fn unavailable() -> NormalizedStatus {
        interpret(Err(StoreError::Timeout(Duration::from_secs(1))))
    }

    #[test]
    fn test_master_is_ok_on_both_endpoints() {
        let expected = (StatusCode::OK, "Redis master Healthy\n".to_string());
        assert_eq!(render_status(&master()), expected);
        assert_eq!(render_lb_status(&master()), expected);
    }

    #[test]
    fn test_connected_replica_not_serving_traffic() {
        let status = replica("connected");
        assert_eq!(
            render_status(&status),
            (StatusCode::OK, "Redis slave connected\n".to_string())
        );
        assert_eq!(
            render_lb_status(&status),
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Redis slave Not serving traffic\n".to_string()
            )
        );
    }

    #[test]
    fn test_unsynced_replica_unavailable_on_both_endpoints() {
        for link_state in ["connect", "connecting", "sync"] {
            let status = replica(link_state);
            assert_eq!(
                render_status(&status),
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("Redis slave Unhealthy state: {}\n", link_state)
                )
            );
            assert_eq!(render_lb_status(&status).0, StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    #[test]
    fn test_unreachable_redis_cannot_connect() {
        let expected = (
            StatusCode::SERVICE_UNAVAILABLE,
            "Redis Server Unavailable - Cannot connect\n".to_string(),
        );
        assert_eq!(render_status(&unavailable()), expected);
        assert_eq!(render_lb_status(&unavailable()), expected);
    }

    #[test]
    fn test_empty_role_label_is_not_reported_as_unreachable() {
        let outcome = RoleReply::from_value(&redis::Value::Array(vec![
            redis::Value::BulkString(Vec::new()),
        ]))
        .map_err(StoreError::from);
        let status = interpret(outcome);
        assert_eq!(
            render_status(&status),
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Redis unknown Malformed reply\n".to_string()
            )
        );
        assert_eq!(
            render_lb_status(&status),
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Redis unknown Not serving traffic\n".to_string()
            )
        );
    }

    #[test]
    fn test_unknown_role_fails_closed() {
        let status = interpret(Ok(RoleReply::Other {
            label: "sentinel".to_string(),
        }));
        assert_eq!(
            render_status(&status),
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Redis sentinel Unknown\n".to_string()
            )
        );
        assert_eq!(
            render_lb_status(&status),
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Redis sentinel Not serving traffic\n".to_string()
            )
        );
    }
}
