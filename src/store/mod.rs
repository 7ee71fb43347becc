//! Access to the monitored Redis server.
//!
//! [`RoleSource`] is the seam between the HTTP layer and Redis: handlers ask it
//! for the current [`RoleReply`] and never see the wire protocol.
//! [`RedisRoleClient`] is the production implementation.

mod client;
mod reply;

pub use client::RedisRoleClient;
pub use reply::{ConnectedReplica, LinkState, ReplyError, RoleReply, ROLE_MASTER, ROLE_REPLICA};

use async_trait::async_trait;

use crate::error::StoreError;

/// Anything that can answer a single `ROLE` query.
#[async_trait]
pub trait RoleSource: Send + Sync {
    /// Issue one role query. No retries.
    async fn role(&self) -> Result<RoleReply, StoreError>;
}
