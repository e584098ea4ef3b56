//! Prometheus metrics for the relay.
//!
//! - Group metrics (active groups, creations)
//! - Member metrics (connected, joined, left, evicted)
//! - Message metrics (inbound frames, broadcasts, deliveries, drops)
//! - Latency metrics (broadcast fan-out duration, session duration)

mod helpers;

pub use helpers::{encode_metrics, GroupMetrics, MessageMetrics, SessionMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter,
    IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "relay";

lazy_static! {
    // ============================================================================
    // Group Metrics
    // ============================================================================

    /// Number of groups held by the registry
    pub static ref GROUPS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_groups_active", METRIC_PREFIX),
        "Number of groups held by the registry"
    ).unwrap();

    pub static ref GROUPS_CREATED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_groups_created_total", METRIC_PREFIX),
        "Total groups created"
    ).unwrap();

    // ============================================================================
    // Member Metrics
    // ============================================================================

    /// Members currently joined to any group
    pub static ref MEMBERS_CONNECTED: IntGauge = register_int_gauge!(
        format!("{}_members_connected", METRIC_PREFIX),
        "Members currently joined to a group"
    ).unwrap();

    pub static ref MEMBERS_JOINED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_members_joined_total", METRIC_PREFIX),
        "Total join requests processed"
    ).unwrap();

    pub static ref MEMBERS_LEFT_TOTAL: IntCounter = register_int_counter!(
        format!("{}_members_left_total", METRIC_PREFIX),
        "Total leave requests that removed a member"
    ).unwrap();

    /// Members removed because their outbound queue stayed full
    pub static ref MEMBERS_EVICTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_members_evicted_total", METRIC_PREFIX),
        "Total members evicted for slow consumption"
    ).unwrap();

    // ============================================================================
    // Message Metrics
    // ============================================================================

    pub static ref FRAMES_RECEIVED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_frames_received_total", METRIC_PREFIX),
        "Total inbound frames read from connections"
    ).unwrap();

    pub static ref BROADCASTS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_broadcasts_total", METRIC_PREFIX),
        "Total broadcasts processed by groups"
    ).unwrap();

    pub static ref FRAMES_DELIVERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_frames_delivered_total", METRIC_PREFIX),
        "Total frames enqueued onto member outbound queues"
    ).unwrap();

    /// Frames addressed to a member whose writer had already stopped
    pub static ref FRAMES_DROPPED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_frames_dropped_total", METRIC_PREFIX),
        "Total frames dropped because the member queue was closed"
    ).unwrap();

    pub static ref ENCODING_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_encoding_failures_total", METRIC_PREFIX),
        "Total inbound frames dropped because encoding failed"
    ).unwrap();

    // ============================================================================
    // Latency Metrics
    // ============================================================================

    /// Time a group spends fanning one broadcast out to all members
    pub static ref BROADCAST_DURATION: Histogram = register_histogram!(
        format!("{}_broadcast_duration_seconds", METRIC_PREFIX),
        "Broadcast fan-out duration in seconds",
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    ).unwrap();

    pub static ref SESSION_DURATION: Histogram = register_histogram!(
        format!("{}_session_duration_seconds", METRIC_PREFIX),
        "Member session duration in seconds",
        vec![1.0, 10.0, 60.0, 300.0, 900.0, 3600.0, 14400.0]
    ).unwrap();
}
