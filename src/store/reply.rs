//! Typed decoding of the Redis `ROLE` reply.
//!
//! Reply samples:
//! - `["master", 0, []]` master without replicas
//! - `["master", 3129659, [["127.0.0.1", "9001", "3129242"]]]` master with one replica
//! - `["slave", "127.0.0.1", 6379, "connected", 0]` replica connected and synced
//! - `["slave", "127.0.0.1", 6379, "sync", 0]` replica performing a full sync
//!
//! Anything that does not fit one of these shapes is a [`ReplyError`], never a panic.

use std::fmt;

use redis::Value;

/// Role label reported by a primary
pub const ROLE_MASTER: &str = "master";

/// Role label reported by a secondary
pub const ROLE_REPLICA: &str = "slave";

const MASTER_REPLY_LEN: usize = 3;
const REPLICA_REPLY_LEN: usize = 5;

/// Decoded `ROLE` reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleReply {
    Master {
        replication_offset: i64,
        replicas: Vec<ConnectedReplica>,
    },
    Replica {
        master_host: String,
        master_port: u16,
        link_state: LinkState,
        replication_offset: i64,
    },
    /// Any other role label, e.g. "sentinel"
    Other { label: String },
}

/// A replica entry listed in a master's reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedReplica {
    pub host: String,
    pub port: u16,
    pub replication_offset: i64,
}

/// Synchronization phase of a replica with its master
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    Connect,
    Connecting,
    Sync,
    Connected,
    /// States newer servers may report (e.g. "handshake"), kept verbatim
    Other(String),
}

impl LinkState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "connect" => LinkState::Connect,
            "connecting" => LinkState::Connecting,
            "sync" => LinkState::Sync,
            "connected" => LinkState::Connected,
            other => LinkState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LinkState::Connect => "connect",
            LinkState::Connecting => "connecting",
            LinkState::Sync => "sync",
            LinkState::Connected => "connected",
            LinkState::Other(raw) => raw.as_str(),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Connected)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reply did not match any expected `ROLE` shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplyError {
    #[error("malformed ROLE reply: {reason}")]
    Malformed {
        /// Role label, when one could be read
        label: Option<String>,
        reason: String,
    },
}

impl ReplyError {
    fn malformed(label: Option<&str>, reason: impl Into<String>) -> Self {
        ReplyError::Malformed {
            label: label.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// Role label carried by the malformed reply, if it had one
    pub fn label(&self) -> Option<&str> {
        match self {
            ReplyError::Malformed { label, .. } => label.as_deref(),
        }
    }
}

impl RoleReply {
    /// Decode a raw reply into one of the known variants.
    pub fn from_value(value: &Value) -> Result<Self, ReplyError> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(ReplyError::malformed(
                    None,
                    format!("expected an array, got {}", kind(other)),
                ))
            }
        };

        let label = items
            .first()
            .and_then(as_string)
            .filter(|label| !label.is_empty())
            .ok_or_else(|| ReplyError::malformed(None, "missing role label"))?;

        match label.as_str() {
            ROLE_MASTER => decode_master(items),
            ROLE_REPLICA => decode_replica(items),
            _ => Ok(RoleReply::Other { label }),
        }
    }

    /// Raw role label as reported by the server
    pub fn label(&self) -> &str {
        match self {
            RoleReply::Master { .. } => ROLE_MASTER,
            RoleReply::Replica { .. } => ROLE_REPLICA,
            RoleReply::Other { label } => label.as_str(),
        }
    }
}

fn decode_master(items: &[Value]) -> Result<RoleReply, ReplyError> {
    let label = Some(ROLE_MASTER);
    if items.len() < MASTER_REPLY_LEN {
        return Err(ReplyError::malformed(
            label,
            format!(
                "master reply has {} elements, expected {}",
                items.len(),
                MASTER_REPLY_LEN
            ),
        ));
    }

    let replication_offset = as_int(&items[1])
        .ok_or_else(|| ReplyError::malformed(label, "replication offset is not an integer"))?;

    let replicas = match &items[2] {
        Value::Array(entries) => entries
            .iter()
            .map(decode_connected_replica)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ReplyError::malformed(label, "invalid replica list entry"))?,
        _ => return Err(ReplyError::malformed(label, "replica list is not an array")),
    };

    Ok(RoleReply::Master {
        replication_offset,
        replicas,
    })
}

fn decode_connected_replica(entry: &Value) -> Option<ConnectedReplica> {
    match entry {
        Value::Array(fields) if fields.len() >= 3 => Some(ConnectedReplica {
            host: as_string(&fields[0])?,
            port: u16::try_from(as_int(&fields[1])?).ok()?,
            replication_offset: as_int(&fields[2])?,
        }),
        _ => None,
    }
}

fn decode_replica(items: &[Value]) -> Result<RoleReply, ReplyError> {
    let label = Some(ROLE_REPLICA);
    if items.len() < REPLICA_REPLY_LEN {
        return Err(ReplyError::malformed(
            label,
            format!(
                "slave reply has {} elements, expected {}",
                items.len(),
                REPLICA_REPLY_LEN
            ),
        ));
    }

    let master_host = as_string(&items[1])
        .ok_or_else(|| ReplyError::malformed(label, "master host is not a string"))?;
    let master_port = as_int(&items[2])
        .and_then(|port| u16::try_from(port).ok())
        .ok_or_else(|| ReplyError::malformed(label, "master port is not a valid port"))?;
    let link_state = as_string(&items[3])
        .map(|raw| LinkState::parse(&raw))
        .ok_or_else(|| ReplyError::malformed(label, "link state is not a string"))?;
    let replication_offset = as_int(&items[4])
        .ok_or_else(|| ReplyError::malformed(label, "replication offset is not an integer"))?;

    Ok(RoleReply::Replica {
        master_host,
        master_port,
        link_state,
        replication_offset,
    })
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(bytes) => String::from_utf8(bytes.clone()).ok(),
        Value::SimpleString(s) => Some(s.clone()),
        _ => None,
    }
}

/// Integers arrive as RESP integers, but replica list entries carry them as strings.
fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        other => as_string(other)?.parse().ok(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Nil => "nil",
        Value::Int(_) => "integer",
        Value::BulkString(_) | Value::SimpleString(_) => "string",
        Value::Okay => "status",
        _ => "unsupported type",
    }
}
