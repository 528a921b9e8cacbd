use crate::room::{ConnectionId, Outbox};
use screenshare_core::{ParticipantId, SignalMessage};
use tokio::sync::oneshot;

/// Команды, поступающие в актор комнаты от сигнального слоя.
#[derive(Debug)]
pub enum RoomCommand {
    /// Вход участника. В ответ приходят участники, бывшие в комнате до него.
    Join {
        participant: ParticipantId,
        connection: ConnectionId,
        outbox: Outbox,
        reply: oneshot::Sender<Vec<ParticipantId>>,
    },

    /// Выход участника (явный или по разрыву WebSocket).
    Leave {
        participant: ParticipantId,
        connection: ConnectionId,
        reply: oneshot::Sender<LeaveOutcome>,
    },

    /// Пересылка offer/answer/candidate адресату.
    Relay {
        message: SignalMessage,
        reply: oneshot::Sender<RelayOutcome>,
    },

    Snapshot {
        reply: oneshot::Sender<Vec<ParticipantId>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Removed { room_empty: bool },
    NotMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Delivered,
    /// Target unknown or already gone. Expected when racing a departure.
    Dropped,
}
