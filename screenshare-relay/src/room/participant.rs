use screenshare_core::{ParticipantId, SignalMessage};
use std::time::SystemTime;
use tokio::sync::mpsc;

/// Очередь исходящих сообщений конкретного WebSocket-соединения.
pub type Outbox = mpsc::UnboundedSender<SignalMessage>;

/// Identity of one accepted socket. A participant that reconnects gets a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

#[derive(Debug)]
pub struct Participant {
    pub id: ParticipantId,
    pub connection: ConnectionId,
    pub joined_at: SystemTime,
    outbox: Outbox,
}

impl Participant {
    pub fn new(id: ParticipantId, connection: ConnectionId, outbox: Outbox) -> Self {
        Self {
            id,
            connection,
            joined_at: SystemTime::now(),
            outbox,
        }
    }

    /// Returns false when the socket behind the outbox is already gone.
    pub fn deliver(&self, msg: SignalMessage) -> bool {
        self.outbox.send(msg).is_ok()
    }
}
