//! The group fan-out engine.
//!
//! Every group runs one control loop task that owns its membership set.
//! Join, leave and broadcast requests reach it through a single FIFO channel,
//! so membership changes and deliveries are applied one at a time in arrival
//! order and no broadcast ever sees a half-updated member set.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::error::{SendError, SendTimeoutError};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::metrics::{GroupMetrics, MessageMetrics};

use super::member::Member;
use super::types::{
    BroadcastReport, DeliveryPolicy, Frame, GroupError, GroupSettings, GroupStats, MemberId,
    MemberInfo,
};

enum GroupCommand {
    Join(Member),
    Leave {
        member_id: MemberId,
        done: Option<oneshot::Sender<bool>>,
    },
    Broadcast {
        frame: Frame,
        done: Option<oneshot::Sender<BroadcastReport>>,
    },
    Snapshot(oneshot::Sender<Vec<MemberInfo>>),
}

/// Counters written by the control loop and read by handles
#[derive(Debug, Default)]
struct GroupCounters {
    members: AtomicUsize,
    broadcasts: AtomicU64,
    frames_delivered: AtomicU64,
}

/// Cloneable handle used to submit requests to a running group
#[derive(Debug, Clone)]
pub struct GroupHandle {
    id: Uuid,
    name: Arc<str>,
    created_at: DateTime<Utc>,
    requests: mpsc::Sender<GroupCommand>,
    counters: Arc<GroupCounters>,
}

impl GroupHandle {
    /// Instance id, distinct for every group ever started
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Member count as of the last processed request
    pub fn member_count(&self) -> usize {
        self.counters.members.load(Ordering::Relaxed)
    }

    /// Submit a join. Broadcasts processed before it are never delivered to the member.
    pub async fn join(&self, member: Member) -> Result<(), GroupError> {
        self.submit(GroupCommand::Join(member)).await
    }

    /// Submit a leave and wait until the group has processed it.
    ///
    /// Returns whether the member was present. Once this returns, the member's
    /// outbound queue is closed and no later broadcast can reach it.
    pub async fn leave(&self, member_id: MemberId) -> Result<bool, GroupError> {
        let (done, processed) = oneshot::channel();
        self.submit(GroupCommand::Leave {
            member_id,
            done: Some(done),
        })
        .await?;
        processed.await.map_err(|_| self.closed())
    }

    /// Submit a leave without waiting for it to be processed
    pub async fn request_leave(&self, member_id: MemberId) -> Result<(), GroupError> {
        self.submit(GroupCommand::Leave {
            member_id,
            done: None,
        })
        .await
    }

    /// Submit a broadcast. Returns once the request is queued, not delivered.
    pub async fn broadcast(&self, frame: impl Into<Frame>) -> Result<(), GroupError> {
        self.submit(GroupCommand::Broadcast {
            frame: frame.into(),
            done: None,
        })
        .await
    }

    /// Submit a broadcast and wait for its fan-out to finish
    pub async fn broadcast_and_wait(
        &self,
        frame: impl Into<Frame>,
    ) -> Result<BroadcastReport, GroupError> {
        let (done, processed) = oneshot::channel();
        self.submit(GroupCommand::Broadcast {
            frame: frame.into(),
            done: Some(done),
        })
        .await?;
        processed.await.map_err(|_| self.closed())
    }

    /// Current members, observed at the serialization point
    pub async fn members(&self) -> Result<Vec<MemberInfo>, GroupError> {
        let (reply, snapshot) = oneshot::channel();
        self.submit(GroupCommand::Snapshot(reply)).await?;
        snapshot.await.map_err(|_| self.closed())
    }

    /// Like [`members`](Self::members), but gives up after `timeout`.
    ///
    /// Under the block policy a broadcast can hold the control loop while a
    /// member's queue is full; callers outside the data path use this so they
    /// never wait on that.
    pub async fn members_within(&self, timeout: Duration) -> Result<Vec<MemberInfo>, GroupError> {
        tokio::time::timeout(timeout, self.members())
            .await
            .map_err(|_| GroupError::Unresponsive {
                group: self.name.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })?
    }

    pub fn stats(&self) -> GroupStats {
        GroupStats {
            name: self.name.to_string(),
            created_at: self.created_at,
            member_count: self.member_count(),
            broadcasts: self.counters.broadcasts.load(Ordering::Relaxed),
            frames_delivered: self.counters.frames_delivered.load(Ordering::Relaxed),
        }
    }

    async fn submit(&self, command: GroupCommand) -> Result<(), GroupError> {
        self.requests
            .send(command)
            .await
            .map_err(|SendError(_)| self.closed())
    }

    fn closed(&self) -> GroupError {
        GroupError::Closed {
            group: self.name.to_string(),
        }
    }
}

/// The serialization point for one group. Owned by its control loop task.
pub struct Group {
    name: Arc<str>,
    members: HashMap<MemberId, Member>,
    requests: mpsc::Receiver<GroupCommand>,
    policy: DeliveryPolicy,
    counters: Arc<GroupCounters>,
}

impl Group {
    /// Start a group's control loop on the current runtime
    pub fn spawn(name: &str, settings: &GroupSettings) -> GroupHandle {
        let (requests_tx, requests_rx) = mpsc::channel(settings.request_buffer_size);
        let counters = Arc::new(GroupCounters::default());
        let name: Arc<str> = Arc::from(name);

        let group = Group {
            name: name.clone(),
            members: HashMap::new(),
            requests: requests_rx,
            policy: settings.delivery_policy,
            counters: counters.clone(),
        };
        tokio::spawn(group.run());

        GroupHandle {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
            requests: requests_tx,
            counters,
        }
    }

    /// Process requests until every handle has been dropped
    async fn run(mut self) {
        tracing::debug!(group = %self.name, "Group started");

        while let Some(command) = self.requests.recv().await {
            match command {
                GroupCommand::Join(member) => self.join(member),
                GroupCommand::Leave { member_id, done } => {
                    let removed = self.leave(member_id);
                    if let Some(done) = done {
                        let _ = done.send(removed);
                    }
                }
                GroupCommand::Broadcast { frame, done } => {
                    let report = self.broadcast(frame).await;
                    if let Some(done) = done {
                        let _ = done.send(report);
                    }
                }
                GroupCommand::Snapshot(reply) => {
                    let _ = reply.send(self.members.values().map(Member::info).collect());
                }
            }
        }

        // Remaining members' queues close as the map drops
        for _ in self.members.drain() {
            GroupMetrics::record_left();
        }
        tracing::debug!(group = %self.name, "Group stopped");
    }

    fn join(&mut self, member: Member) {
        let member_id = member.id();
        let name = member.name().to_string();

        if self.members.insert(member_id, member).is_some() {
            // Same member joined twice; the earlier entry (and its queue) is replaced
            tracing::warn!(group = %self.name, member_id = %member_id, "Member joined twice");
        } else {
            GroupMetrics::record_joined();
        }
        self.sync_member_count();

        tracing::info!(
            group = %self.name,
            member_id = %member_id,
            member_name = %name,
            members = self.members.len(),
            "Member joined"
        );
    }

    fn leave(&mut self, member_id: MemberId) -> bool {
        // Dropping the member closes its outbound queue
        let Some(member) = self.members.remove(&member_id) else {
            tracing::debug!(group = %self.name, member_id = %member_id, "Leave for absent member");
            return false;
        };
        GroupMetrics::record_left();
        self.sync_member_count();

        tracing::info!(
            group = %self.name,
            member_id = %member_id,
            member_name = %member.name(),
            members = self.members.len(),
            "Member left"
        );
        true
    }

    async fn broadcast(&mut self, frame: Frame) -> BroadcastReport {
        let start = Instant::now();
        let mut report = BroadcastReport::default();
        let mut evicted = Vec::new();

        for (member_id, member) in &self.members {
            let outcome = match self.policy {
                DeliveryPolicy::Block => member
                    .queue()
                    .send(frame.clone())
                    .await
                    .map_err(|_| Undelivered::Closed),
                DeliveryPolicy::Evict { timeout } => member
                    .queue()
                    .send_timeout(frame.clone(), timeout)
                    .await
                    .map_err(|e| match e {
                        SendTimeoutError::Timeout(_) => Undelivered::TimedOut,
                        SendTimeoutError::Closed(_) => Undelivered::Closed,
                    }),
            };

            match outcome {
                Ok(()) => report.delivered += 1,
                // Writer already stopped; its leave is on the way
                Err(Undelivered::Closed) => report.dropped += 1,
                Err(Undelivered::TimedOut) => evicted.push(*member_id),
            }
        }

        for member_id in evicted {
            if let Some(member) = self.members.remove(&member_id) {
                report.evicted += 1;
                GroupMetrics::record_evicted();
                tracing::warn!(
                    group = %self.name,
                    member_id = %member_id,
                    member_name = %member.name(),
                    "Evicted member with full outbound queue"
                );
            }
        }
        if report.evicted > 0 {
            self.sync_member_count();
        }

        self.counters.broadcasts.fetch_add(1, Ordering::Relaxed);
        self.counters
            .frames_delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        MessageMetrics::record_broadcast(
            report.delivered as u64,
            report.dropped as u64,
            start.elapsed(),
        );

        tracing::debug!(
            group = %self.name,
            delivered = report.delivered,
            dropped = report.dropped,
            evicted = report.evicted,
            "Broadcast processed"
        );

        report
    }

    fn sync_member_count(&self) {
        self.counters
            .members
            .store(self.members.len(), Ordering::Relaxed);
    }
}

enum Undelivered {
    Closed,
    TimedOut,
}
