use crate::transport::TransportConfig;
use screenshare_core::{ParticipantId, RoomId};
use std::time::Duration;
use urlencoding::encode;

/// Параметры переподключения сигнального канала.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
    pub factor: u32,
}

impl BackoffConfig {
    pub fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(self.factor.max(1)).min(self.max)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(10),
            factor: 2,
        }
    }
}

/// What `start_sharing` asks the capture layer for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareOptions {
    pub system_audio: bool,
    pub with_microphone: bool,
}

impl Default for ShareOptions {
    fn default() -> Self {
        Self {
            system_audio: true,
            with_microphone: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base address of the relay, e.g. `ws://127.0.0.1:3000`.
    pub relay_url: String,
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
    pub access_token: Option<String>,
    pub share: ShareOptions,
    pub backoff: BackoffConfig,
    pub transport: TransportConfig,
    /// A link stuck in `Negotiating` longer than this is closed.
    pub negotiation_timeout: Duration,
    /// Per-participant cap on candidates that arrive before their link exists.
    pub candidate_buffer_limit: usize,
}

impl ClientConfig {
    pub fn new(relay_url: impl Into<String>, room_id: impl Into<RoomId>) -> Self {
        Self {
            relay_url: relay_url.into(),
            room_id: room_id.into(),
            participant_id: ParticipantId::new(),
            access_token: None,
            share: ShareOptions::default(),
            backoff: BackoffConfig::default(),
            transport: TransportConfig::default(),
            negotiation_timeout: Duration::from_secs(20),
            candidate_buffer_limit: 64,
        }
    }

    pub fn with_participant(mut self, participant_id: impl Into<ParticipantId>) -> Self {
        self.participant_id = participant_id.into();
        self
    }

    /// WebSocket address of this participant's signaling endpoint. The id is
    /// a single percent-encoded path segment.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/ws/{}",
            self.relay_url.trim_end_matches('/'),
            encode(self.participant_id.as_str())
        )
    }
}
