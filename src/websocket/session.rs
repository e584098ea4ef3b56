//! Member session lifecycle: one reader and one writer per connection.
//!
//! The reader turns inbound frames into broadcasts. The writer drains the
//! member's outbound queue to the connection. Whichever stops first ends the
//! session; teardown then waits for the group to process the leave (which
//! closes the queue) before letting the writer finish and close the
//! connection.

use std::time::Instant;

use serde::Serialize;
use tokio::task::JoinError;

use crate::group::{GroupHandle, Member, MemberId, Outbox};
use crate::metrics::{MessageMetrics, SessionMetrics};

use super::endpoint::{FrameSink, FrameSource};
use super::message::ChatMessage;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// The client closed the connection
    ClientClosed,
    /// Reading from the connection failed
    ReceiveFailed,
    /// The writer stopped first (write failure or queue closed by the group)
    WriterStopped,
    /// The group's control loop was gone
    GroupClosed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub member_id: MemberId,
    pub ended_by: SessionEnd,
    pub frames_received: u64,
    pub frames_sent: u64,
}

/// Run one member's session in `group` until either side of the connection stops
#[tracing::instrument(
    name = "ws.session",
    skip_all,
    fields(group = %group.name(), member_name = %name)
)]
pub async fn run_session<S, K>(
    group: GroupHandle,
    name: String,
    queue_capacity: usize,
    mut source: S,
    mut sink: K,
) -> SessionSummary
where
    S: FrameSource,
    K: FrameSink + 'static,
{
    let started = Instant::now();
    let (member, outbox) = Member::new(name.clone(), queue_capacity);
    let member_id = member.id();

    if let Err(e) = group.join(member).await {
        tracing::warn!(error = %e, "Join rejected");
        sink.close().await;
        return SessionSummary {
            member_id,
            ended_by: SessionEnd::GroupClosed,
            frames_received: 0,
            frames_sent: 0,
        };
    }

    let mut writer = tokio::spawn(write_loop(outbox, sink));
    let mut frames_received = 0;
    let mut writer_result = None;

    let ended_by = tokio::select! {
        end = read_loop(&mut source, &group, &name, &mut frames_received) => end,
        result = &mut writer => {
            writer_result = Some(result);
            SessionEnd::WriterStopped
        }
    };
    drop(source);

    // Processing the leave closes the outbound queue, which stops the writer
    match group.leave(member_id).await {
        Ok(_) => {}
        Err(e) => tracing::debug!(error = %e, "Leave not processed"),
    }

    let writer_result = match writer_result {
        Some(result) => result,
        None => writer.await,
    };
    let frames_sent = frames_sent(writer_result);

    SessionMetrics::record_closed(started.elapsed());
    tracing::info!(
        member_id = %member_id,
        ended_by = ?ended_by,
        frames_received,
        frames_sent,
        duration_secs = started.elapsed().as_secs_f64(),
        "Session closed"
    );

    SessionSummary {
        member_id,
        ended_by,
        frames_received,
        frames_sent,
    }
}

async fn read_loop<S: FrameSource>(
    source: &mut S,
    group: &GroupHandle,
    name: &str,
    received: &mut u64,
) -> SessionEnd {
    loop {
        let text = match source.receive_frame().await {
            Ok(Some(text)) => text,
            Ok(None) => return SessionEnd::ClientClosed,
            Err(e) => {
                tracing::debug!(error = %e, "Receive failed");
                return SessionEnd::ReceiveFailed;
            }
        };
        *received += 1;
        MessageMetrics::record_received();

        let frame = match ChatMessage::new(name, text).to_json() {
            Ok(json) => json,
            Err(e) => {
                MessageMetrics::record_encoding_failure();
                tracing::warn!(error = %e, "Failed to encode message, dropping it");
                continue;
            }
        };

        if let Err(e) = group.broadcast(frame).await {
            tracing::warn!(error = %e, "Broadcast rejected");
            return SessionEnd::GroupClosed;
        }
    }
}

async fn write_loop<K: FrameSink>(mut outbox: Outbox, mut sink: K) -> u64 {
    let mut sent = 0;
    while let Some(frame) = outbox.next().await {
        if let Err(e) = sink.send_frame(&frame).await {
            tracing::debug!(error = %e, "Send failed");
            break;
        }
        sent += 1;
    }
    sink.close().await;
    sent
}

fn frames_sent(result: Result<u64, JoinError>) -> u64 {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Writer task failed");
        0
    })
}
