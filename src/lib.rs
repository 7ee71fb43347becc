//! rolecheck: HTTP health checks for a Redis server's replication role.
//!
//! Exposes `/status` (is this instance healthy?) and `/lb_status` (should a
//! load balancer route traffic here?) by issuing one `ROLE` query per request.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod status;
pub mod store;

pub use error::StoreError;
pub use routes::create_router;
pub use state::AppState;
