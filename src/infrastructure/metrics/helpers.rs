//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    BROADCASTS_TOTAL, BROADCAST_DURATION, ENCODING_FAILURES_TOTAL, FRAMES_DELIVERED_TOTAL,
    FRAMES_DROPPED_TOTAL, FRAMES_RECEIVED_TOTAL, GROUPS_ACTIVE, GROUPS_CREATED_TOTAL,
    MEMBERS_CONNECTED, MEMBERS_EVICTED_TOTAL, MEMBERS_JOINED_TOTAL, MEMBERS_LEFT_TOTAL,
    SESSION_DURATION,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording group membership metrics
pub struct GroupMetrics;

impl GroupMetrics {
    pub fn record_group_created() {
        GROUPS_CREATED_TOTAL.inc();
        GROUPS_ACTIVE.inc();
    }

    pub fn record_joined() {
        MEMBERS_JOINED_TOTAL.inc();
        MEMBERS_CONNECTED.inc();
    }

    pub fn record_left() {
        MEMBERS_LEFT_TOTAL.inc();
        MEMBERS_CONNECTED.dec();
    }

    pub fn record_evicted() {
        MEMBERS_EVICTED_TOTAL.inc();
        MEMBERS_CONNECTED.dec();
    }
}

/// Helper struct for recording message metrics
pub struct MessageMetrics;

impl MessageMetrics {
    pub fn record_received() {
        FRAMES_RECEIVED_TOTAL.inc();
    }

    pub fn record_encoding_failure() {
        ENCODING_FAILURES_TOTAL.inc();
    }

    /// Record one processed broadcast and its fan-out outcome
    pub fn record_broadcast(delivered: u64, dropped: u64, elapsed: Duration) {
        BROADCASTS_TOTAL.inc();
        FRAMES_DELIVERED_TOTAL.inc_by(delivered);
        FRAMES_DROPPED_TOTAL.inc_by(dropped);
        BROADCAST_DURATION.observe(elapsed.as_secs_f64());
    }
}

/// Helper struct for recording session metrics
pub struct SessionMetrics;

impl SessionMetrics {
    pub fn record_closed(duration: Duration) {
        SESSION_DURATION.observe(duration.as_secs_f64());
    }
}
