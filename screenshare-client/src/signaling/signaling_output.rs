use crate::error::SignalingError;
use async_trait::async_trait;
use screenshare_core::{IceCandidate, ParticipantId, SignalMessage};

/// Трейт исходящих сигнальных сообщений. Оркестратор пишет сюда offer/answer/ICE,
/// не зная, как устроен транспорт до релея.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Отправить SDP Offer конкретному участнику.
    async fn send_offer(&self, to: ParticipantId, sdp: String) -> Result<(), SignalingError>;

    /// Отправить SDP Answer конкретному участнику.
    async fn send_answer(&self, to: ParticipantId, sdp: String) -> Result<(), SignalingError>;

    /// Отправить ICE кандидата конкретному участнику.
    async fn send_candidate(
        &self,
        to: ParticipantId,
        candidate: IceCandidate,
    ) -> Result<(), SignalingError>;

    /// Попросить инициатора линка прислать новый offer.
    async fn send_renegotiate(&self, to: ParticipantId) -> Result<(), SignalingError>;

    /// Room-level messages (`join`, `leave`).
    async fn send(&self, msg: SignalMessage) -> Result<(), SignalingError>;
}
