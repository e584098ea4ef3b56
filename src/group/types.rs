//! Shared group types

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{DeliveryPolicyKind, GroupConfig};

/// One encoded outbound frame, shared by every member it is delivered to
pub type Frame = Arc<str>;

/// Identity of a member within a group. Display names may collide; ids do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MemberId(Uuid);

impl MemberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GroupError {
    /// The group's control loop is no longer running
    #[error("group '{group}' is closed")]
    Closed { group: String },

    /// The control loop did not answer in time, usually because a broadcast
    /// is waiting on a full member queue
    #[error("group '{group}' did not respond within {timeout_ms}ms")]
    Unresponsive { group: String, timeout_ms: u64 },
}

/// How a broadcast treats a member whose outbound queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Wait for space. One slow member delays the broadcast for everyone.
    Block,
    /// Wait up to `timeout`, then remove the member and close its queue.
    Evict { timeout: Duration },
}

/// Settings every group in a registry is started with
#[derive(Debug, Clone, Copy)]
pub struct GroupSettings {
    pub request_buffer_size: usize,
    pub message_buffer_size: usize,
    pub delivery_policy: DeliveryPolicy,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self::from(&GroupConfig::default())
    }
}

impl From<&GroupConfig> for GroupSettings {
    fn from(config: &GroupConfig) -> Self {
        let delivery_policy = match config.delivery_policy {
            DeliveryPolicyKind::Block => DeliveryPolicy::Block,
            DeliveryPolicyKind::Evict => DeliveryPolicy::Evict {
                timeout: Duration::from_millis(config.delivery_timeout_ms),
            },
        };

        Self {
            // mpsc::channel panics on a zero capacity
            request_buffer_size: config.request_buffer_size.max(1),
            message_buffer_size: config.message_buffer_size.max(1),
            delivery_policy,
        }
    }
}

/// A member as seen from the group's serialization point
#[derive(Debug, Clone, Serialize)]
pub struct MemberInfo {
    pub id: MemberId,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

/// Outcome of one broadcast fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Frames enqueued onto member queues
    pub delivered: usize,
    /// Members whose writer had already gone away
    pub dropped: usize,
    /// Members removed under the evict policy
    pub evicted: usize,
}

/// Counters for one group
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub member_count: usize,
    pub broadcasts: u64,
    pub frames_delivered: u64,
}

/// Counters for a whole registry
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total_groups: usize,
    pub total_members: usize,
    pub groups: Vec<GroupStats>,
}
