//! In-memory connection endpoints for driving sessions without a socket.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use room_relay::group::GroupHandle;
use room_relay::websocket::{ChatMessage, ConnectionError, FrameSink, FrameSource};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

pub struct MockSource {
    inbound: mpsc::UnboundedReceiver<Result<String, ConnectionError>>,
}

#[async_trait]
impl FrameSource for MockSource {
    async fn receive_frame(&mut self) -> Result<Option<String>, ConnectionError> {
        match self.inbound.recv().await {
            Some(Ok(text)) => Ok(Some(text)),
            Some(Err(e)) => Err(e),
            // Client side dropped: orderly close
            None => Ok(None),
        }
    }
}

pub struct MockSink {
    outbound: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
    fail_sends: bool,
}

#[async_trait]
impl FrameSink for MockSink {
    async fn send_frame(&mut self, frame: &str) -> Result<(), ConnectionError> {
        if self.fail_sends {
            return Err(ConnectionError::Send("broken pipe".into()));
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(ConnectionError::Closed);
        }
        self.outbound
            .send(frame.to_string())
            .map_err(|_| ConnectionError::Send("client gone".into()))
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// The client's view of a mock connection
pub struct MockClient {
    inbound: Option<mpsc::UnboundedSender<Result<String, ConnectionError>>>,
    outbound: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

impl MockClient {
    pub fn send_text(&self, text: &str) {
        if let Some(inbound) = &self.inbound {
            inbound.send(Ok(text.to_string())).unwrap();
        }
    }

    pub fn fail_read(&self) {
        if let Some(inbound) = &self.inbound {
            inbound
                .send(Err(ConnectionError::Receive("reset by peer".into())))
                .unwrap();
        }
    }

    /// Orderly close from the client side
    pub fn disconnect(&mut self) {
        self.inbound.take();
    }

    pub async fn next_message(&mut self) -> Option<ChatMessage> {
        let text = tokio::time::timeout(RECV_TIMEOUT, self.outbound.recv())
            .await
            .ok()??;
        Some(serde_json::from_str(&text).expect("outbound frame should be JSON"))
    }

    /// Frames already written to the client, without waiting
    pub fn drain_now(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.outbound.try_recv() {
            frames.push(frame);
        }
        frames
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub fn mock_connection() -> (MockClient, MockSource, MockSink) {
    connection(false)
}

/// A connection whose every write fails
pub fn broken_connection() -> (MockClient, MockSource, MockSink) {
    connection(true)
}

fn connection(fail_sends: bool) -> (MockClient, MockSource, MockSink) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));

    (
        MockClient {
            inbound: Some(inbound_tx),
            outbound: outbound_rx,
            closed: closed.clone(),
        },
        MockSource {
            inbound: inbound_rx,
        },
        MockSink {
            outbound: outbound_tx,
            closed,
            fail_sends,
        },
    )
}

/// Wait until the group reports `count` members at its serialization point
pub async fn wait_for_members(group: &GroupHandle, count: usize) {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            if group.members().await.unwrap().len() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("members did not settle in time");
}
