use std::time::Duration;

use crate::store::ReplyError;

/// Failure to obtain a usable `ROLE` reply from the Redis server.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Redis did not answer within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Malformed(#[from] ReplyError),
}

impl StoreError {
    /// True when the server could not be reached or did not answer at all,
    /// as opposed to answering with something unexpected.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Connection(_) | StoreError::Timeout(_))
    }
}
