use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use screenshare_core::{ParticipantId, SignalMessage};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single signal to arrive over the socket (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 3000;

/// Bare WebSocket participant speaking the relay's JSON protocol.
pub struct TestClient {
    pub participant_id: ParticipantId,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr, participant_id: &str) -> Result<Self> {
        let url = format!("ws://{}/ws/{}", addr, participant_id);
        let (stream, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        Ok(Self {
            participant_id: ParticipantId::from(participant_id),
            stream,
        })
    }

    pub async fn send(&mut self, msg: &SignalMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.stream
            .send(Message::text(json))
            .await
            .context("Failed to send signal")
    }

    pub async fn recv(&mut self, timeout_ms: u64) -> Result<SignalMessage> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);

        loop {
            let frame = tokio::time::timeout_at(deadline, self.stream.next())
                .await
                .context("Timeout waiting for signal")?
                .context("Socket closed")??;

            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).context("Malformed signal");
            }
        }
    }

    /// Skips signals until one matches.
    pub async fn recv_until<F>(&mut self, mut predicate: F, timeout_ms: u64) -> Result<SignalMessage>
    where
        F: FnMut(&SignalMessage) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let msg = self.recv(remaining.as_millis() as u64).await?;
            if predicate(&msg) {
                return Ok(msg);
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await.context("Failed to close socket")
    }
}
