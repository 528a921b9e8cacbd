use crate::room::{ConnectionId, LeaveOutcome, Outbox, RelayOutcome};
use async_trait::async_trait;
use screenshare_core::{ParticipantId, RoomId, SignalMessage};

/// Узкий интерфейс реестра комнат. Сейчас за ним стоит `RoomManager` в памяти
/// процесса; вызывающий код не зависит от способа хранения.
#[async_trait]
pub trait MembershipRegistry: Send + Sync {
    /// Registers the participant (idempotent for the same connection), broadcasts
    /// `joined` to the rest of the room and returns who was there before.
    async fn join(
        &self,
        room_id: &RoomId,
        participant: ParticipantId,
        connection: ConnectionId,
        outbox: Outbox,
    ) -> Vec<ParticipantId>;

    async fn leave(
        &self,
        room_id: &RoomId,
        participant: &ParticipantId,
        connection: ConnectionId,
    ) -> LeaveOutcome;

    /// Forwards an offer/answer/candidate to `to`. Never fails for the sender.
    async fn relay(&self, room_id: &RoomId, message: SignalMessage) -> RelayOutcome;

    async fn snapshot(&self, room_id: &RoomId) -> Vec<ParticipantId>;

    fn room_count(&self) -> usize;
}
