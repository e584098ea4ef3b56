//! Member session state: identity plus the bounded outbound queue

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::mpsc;

use super::types::{Frame, MemberId, MemberInfo};

/// A participant as held by its group.
///
/// The group owns the only producer side of the outbound queue, so dropping
/// the `Member` (on leave or eviction) is what closes the queue for the
/// writer.
#[derive(Debug)]
pub struct Member {
    id: MemberId,
    name: String,
    queue: mpsc::Sender<Frame>,
    joined_at: DateTime<Utc>,
}

impl Member {
    /// Create a member and the consumer side of its outbound queue
    pub fn new(name: impl Into<String>, capacity: usize) -> (Self, Outbox) {
        let (queue, receiver) = mpsc::channel(capacity.max(1));
        let member = Self {
            id: MemberId::new(),
            name: name.into(),
            queue,
            joined_at: Utc::now(),
        };
        (member, Outbox { receiver })
    }

    pub fn id(&self) -> MemberId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    pub(crate) fn queue(&self) -> &mpsc::Sender<Frame> {
        &self.queue
    }

    pub fn info(&self) -> MemberInfo {
        MemberInfo {
            id: self.id,
            name: self.name.clone(),
            joined_at: self.joined_at,
        }
    }
}

/// Consumer side of a member's outbound queue, drained by the writer
#[derive(Debug)]
pub struct Outbox {
    receiver: mpsc::Receiver<Frame>,
}

impl Outbox {
    /// Next pending frame; `None` once the group has closed the queue and it is drained
    pub async fn next(&mut self) -> Option<Frame> {
        self.receiver.recv().await
    }

    pub fn try_next(&mut self) -> Option<Frame> {
        self.receiver.try_recv().ok()
    }

    /// Frames waiting to be written
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// True once the producer side is gone
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}

/// Random `user<0-999>` display name. Not unique across members.
pub fn generate_display_name() -> String {
    format!("user{}", rand::rng().random_range(0..1000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_format() {
        for _ in 0..100 {
            let name = generate_display_name();
            let suffix: u32 = name
                .strip_prefix("user")
                .and_then(|n| n.parse().ok())
                .expect("name should be user<number>");
            assert!(suffix < 1000);
        }
    }

    #[tokio::test]
    async fn test_dropping_member_closes_outbox() {
        let (member, mut outbox) = Member::new("alice", 4);
        member.queue().send(Frame::from("queued")).await.unwrap();
        assert_eq!(outbox.len(), 1);
        drop(member);

        // Pending frames survive the close, then the stream ends
        assert_eq!(outbox.next().await.as_deref(), Some("queued"));
        assert!(outbox.next().await.is_none());
        assert!(outbox.is_closed());
    }

    #[test]
    fn test_empty_outbox_is_pending() {
        let (_member, mut outbox) = Member::new("bob", 1);
        assert!(outbox.is_empty());
        assert_eq!(outbox.len(), 0);

        let mut next = tokio_test::task::spawn(outbox.next());
        tokio_test::assert_pending!(next.poll());
    }
}
