use std::time::Duration;

use async_trait::async_trait;
use redis::Value;
use tokio::time::timeout;
use tracing::instrument;

use crate::config::{RedisConfig, StoreTarget};
use crate::error::StoreError;

use super::{RoleReply, RoleSource};

/// Role queries against a real Redis server.
///
/// Holds only the parsed connection info; every query opens its own
/// multiplexed connection, sends `ROLE` once and drops the connection.
#[derive(Clone)]
pub struct RedisRoleClient {
    client: redis::Client,
    target: StoreTarget,
    timeout: Duration,
}

impl RedisRoleClient {
    /// Create a client from connection parameters. Fails only if the
    /// parameters cannot form a valid connection URL; nothing is dialed yet.
    pub fn new(config: &RedisConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.connection_url())?;

        Ok(Self {
            client,
            target: config.target(),
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    pub fn target(&self) -> &StoreTarget {
        &self.target
    }

    async fn query_role(&self) -> Result<Value, StoreError> {
        let mut conn = timeout(self.timeout, self.client.get_multiplexed_async_connection())
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))??;

        let reply: Value = timeout(self.timeout, redis::cmd("ROLE").query_async(&mut conn))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))??;

        Ok(reply)
    }
}

#[async_trait]
impl RoleSource for RedisRoleClient {
    #[instrument(name = "redis.role", skip(self), fields(redis = %self.target))]
    async fn role(&self) -> Result<RoleReply, StoreError> {
        let value = self.query_role().await.inspect_err(|e| {
            tracing::warn!(error = %e, "ROLE query failed");
        })?;

        let reply = RoleReply::from_value(&value).inspect_err(|e| {
            tracing::warn!(error = %e, reply = ?value, "Unexpected ROLE reply");
        })?;

        tracing::debug!(role = reply.label(), "ROLE query succeeded");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(port: u16) -> RedisConfig {
        RedisConfig {
            host: "127.0.0.1".to_string(),
            port,
            timeout_seconds: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_does_not_connect() {
        // Nothing listens on this port, construction must still succeed
        let client = RedisRoleClient::new(&config_for(1)).unwrap();
        assert_eq!(client.target().to_string(), "127.0.0.1:1");
    }

    #[tokio::test]
    async fn test_refused_connection_is_unavailable() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = RedisRoleClient::new(&config_for(port)).unwrap();
        let err = client.role().await.unwrap_err();
        assert!(err.is_unavailable(), "unexpected error: {:?}", err);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // Accepts connections via the backlog but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let client = RedisRoleClient::new(&config_for(port)).unwrap();
        let err = client.role().await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(_)), "unexpected error: {:?}", err);
        assert!(err.is_unavailable());

        drop(listener);
    }
}
