//! Push-channel transport.
//!
//! [`PushConnector`] / [`PushConnection`] are the seam between the realtime
//! loop and the socket. [`WsConnector`] is the production implementation
//! over tokio-tungstenite; tests substitute an in-memory pair.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::constants::CONNECT_TIMEOUT;

/// Transport failures on the push channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("connect to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),
    #[error("send failed: {0}")]
    Send(String),
    #[error("receive failed: {0}")]
    Receive(String),
}

/// Opens push connections.
#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn PushConnection>, ChannelError>;
}

/// One open push connection.
#[async_trait]
pub trait PushConnection: Send {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError>;

    /// Next text message. `None` once the peer has closed.
    async fn recv_text(&mut self) -> Option<Result<String, ChannelError>>;

    /// Close from our side. Called at most once per connection.
    async fn close(&mut self);
}

// ============================================================================
// WebSocket
// ============================================================================

/// Connects over WebSocket (`ws://`).
#[derive(Clone, Debug)]
pub struct WsConnector {
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new(CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl PushConnector for WsConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn PushConnection>, ChannelError> {
        let (stream, response) = timeout(self.connect_timeout, connect_async(endpoint))
            .await
            .map_err(|_| ChannelError::Timeout(self.connect_timeout))?
            .map_err(|e| ChannelError::Connect { endpoint: endpoint.to_string(), reason: e.to_string() })?;

        tracing::debug!(endpoint, status = %response.status(), "push socket open");
        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushConnection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| ChannelError::Send(e.to_string()))
    }

    async fn recv_text(&mut self) -> Option<Result<String, ChannelError>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(data)) => match String::from_utf8(data) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => tracing::debug!("skipping non-UTF-8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "push socket closed by peer");
                    return None;
                }
                // Ping/pong are answered by tungstenite.
                Ok(_) => {}
                Err(e) => return Some(Err(ChannelError::Receive(e.to_string()))),
            }
        }
        None
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "push socket close");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
