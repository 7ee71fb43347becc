//! Classification of a `ROLE` query outcome into a health verdict.
//!
//! The classification is pure: the same reply always yields the same
//! [`NormalizedStatus`], and nothing is remembered between requests.
//!
//! | outcome                        | role    | healthy | detail                    |
//! |--------------------------------|---------|---------|---------------------------|
//! | unreachable / timed out        | Unknown | no      | `Unavailable`             |
//! | `master`                       | Master  | yes     | `Healthy`                 |
//! | `slave`, link `connected`      | Replica | yes     | `connected`               |
//! | `slave`, any other link state  | Replica | no      | `Unhealthy state: <link>` |
//! | any other label                | Unknown | no      | `Unknown`                 |
//! | malformed reply                | Unknown | no      | `Malformed reply`         |

use crate::error::StoreError;
use crate::store::RoleReply;

pub const DETAIL_UNAVAILABLE: &str = "Unavailable";
pub const DETAIL_HEALTHY: &str = "Healthy";
pub const DETAIL_CONNECTED: &str = "connected";
pub const DETAIL_UNHEALTHY_PREFIX: &str = "Unhealthy state: ";
pub const DETAIL_UNKNOWN: &str = "Unknown";
pub const DETAIL_MALFORMED: &str = "Malformed reply";

/// Label used in bodies when a malformed reply carried no readable role
const UNKNOWN_LABEL: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Master,
    Replica,
    Unknown,
}

/// Health verdict derived from one role query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedStatus {
    pub role: Role,
    /// Role label as reported by Redis; empty when Redis could not be reached
    pub label: String,
    /// Redis answered the query, whatever the answer was
    pub available: bool,
    pub healthy: bool,
    pub detail: String,
}

impl NormalizedStatus {
    fn new(role: Role, label: &str, healthy: bool, detail: impl Into<String>) -> Self {
        Self {
            role,
            label: label.to_string(),
            available: true,
            healthy,
            detail: detail.into(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(Role::Unknown, "", false, DETAIL_UNAVAILABLE)
        }
    }

    /// False only when Redis could not be reached or did not answer.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Eligible to receive load-balanced traffic: a healthy master only.
    pub fn is_lb_eligible(&self) -> bool {
        self.role == Role::Master && self.healthy
    }
}

/// Classify the outcome of a role query.
pub fn interpret(outcome: Result<RoleReply, StoreError>) -> NormalizedStatus {
    match outcome {
        Ok(reply) => interpret_reply(&reply),
        Err(e) if e.is_unavailable() => NormalizedStatus::unavailable(),
        Err(StoreError::Malformed(e)) => NormalizedStatus::new(
            Role::Unknown,
            e.label().unwrap_or(UNKNOWN_LABEL),
            false,
            DETAIL_MALFORMED,
        ),
        Err(_) => NormalizedStatus::unavailable(),
    }
}

fn interpret_reply(reply: &RoleReply) -> NormalizedStatus {
    match reply {
        RoleReply::Master { .. } => {
            NormalizedStatus::new(Role::Master, reply.label(), true, DETAIL_HEALTHY)
        }
        RoleReply::Replica { link_state, .. } if link_state.is_connected() => {
            NormalizedStatus::new(Role::Replica, reply.label(), true, DETAIL_CONNECTED)
        }
        RoleReply::Replica { link_state, .. } => NormalizedStatus::new(
            Role::Replica,
            reply.label(),
            false,
            format!("{}{}", DETAIL_UNHEALTHY_PREFIX, link_state),
        ),
        RoleReply::Other { label } => {
            NormalizedStatus::new(Role::Unknown, label, false, DETAIL_UNKNOWN)
        }
    }
}
