//! HTTP routes.
//!
//! Both health endpoints answer with `Cache-Control: no-store` so that no
//! intermediary serves a stale verdict. Request tracing is enabled via
//! middleware that generates a unique request ID for each incoming request.

pub mod status;

use axum::{middleware, routing::get, Router};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::CACHE_CONTROL_STATUS;
use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Creates the Axum router with the health endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status::status))
        .route("/lb_status", get(status::lb_status))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_STATUS),
        ))
        .with_state(state)
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
