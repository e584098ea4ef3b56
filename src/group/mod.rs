//! Group membership and message fan-out.
//!
//! - `engine`: per-group control loop (the serialization point) and its handle
//! - `member`: member identity and bounded outbound queue
//! - `registry`: name to group mapping with exactly-once creation
//! - `types`: ids, settings, errors and stats

mod engine;
mod member;
mod registry;
mod types;

pub use engine::{Group, GroupHandle};
pub use member::{generate_display_name, Member, Outbox};
pub use registry::GroupRegistry;
pub use types::{
    BroadcastReport, DeliveryPolicy, Frame, GroupError, GroupSettings, GroupStats, MemberId,
    MemberInfo, RegistryStats,
};
