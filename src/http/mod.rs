//! HTTP server lifecycle.
//!
//! Binds the health endpoints on plain HTTP and drains in-flight probes on
//! SIGTERM/SIGINT before exiting.

mod server;
mod shutdown;

pub use server::{start_server, ServerError};
