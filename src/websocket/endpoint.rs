//! Connection endpoint contract and its WebSocket implementation.
//!
//! A session only needs "receive next frame" on the read side and
//! "send frame" / "close" on the write side. Splitting them lets the reader
//! and writer run as independent tasks.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("receive failed: {0}")]
    Receive(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("connection already closed")]
    Closed,
}

/// Read side of a connection
#[async_trait]
pub trait FrameSource: Send {
    /// Next inbound frame, `Ok(None)` on orderly close
    async fn receive_frame(&mut self) -> Result<Option<String>, ConnectionError>;
}

/// Write side of a connection
#[async_trait]
pub trait FrameSink: Send {
    async fn send_frame(&mut self, frame: &str) -> Result<(), ConnectionError>;

    /// Close the connection. Safe to call more than once.
    async fn close(&mut self);
}

/// Split an upgraded socket into its two endpoint halves
pub fn split_socket(socket: WebSocket) -> (WsSink, WsSource) {
    let (sink, stream) = socket.split();
    (
        WsSink {
            inner: sink,
            closed: false,
        },
        WsSource { inner: stream },
    )
}

pub struct WsSource {
    inner: SplitStream<WebSocket>,
}

#[async_trait]
impl FrameSource for WsSource {
    async fn receive_frame(&mut self) -> Result<Option<String>, ConnectionError> {
        loop {
            let message = match self.inner.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Err(ConnectionError::Receive(e.to_string())),
                None => return Ok(None),
            };

            match message {
                Message::Text(text) => return Ok(Some(text.as_str().to_owned())),
                Message::Binary(bytes) => {
                    return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
                }
                // Axum answers pings itself
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => return Ok(None),
            }
        }
    }
}

pub struct WsSink {
    inner: SplitSink<WebSocket, Message>,
    closed: bool,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_frame(&mut self, frame: &str) -> Result<(), ConnectionError> {
        if self.closed {
            return Err(ConnectionError::Closed);
        }
        self.inner
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| ConnectionError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.inner.close().await {
            tracing::debug!(error = %e, "WebSocket close failed");
        }
    }
}
