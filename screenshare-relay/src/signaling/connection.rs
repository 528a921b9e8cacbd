use crate::error::RelayError;
use crate::room::{ConnectionId, LeaveOutcome, Outbox, RelayOutcome};
use crate::signaling::SignalingService;
use screenshare_core::{ParticipantId, RoomId, SignalMessage};
use tracing::{debug, info, warn};

/// Состояние одного WebSocket-соединения: кто подключён и в какой комнате.
pub struct Connection {
    participant: ParticipantId,
    id: ConnectionId,
    outbox: Outbox,
    room: Option<RoomId>,
    service: SignalingService,
}

impl Connection {
    pub fn new(participant: ParticipantId, outbox: Outbox, service: SignalingService) -> Self {
        let id = service.next_connection_id();
        Self {
            participant,
            id,
            outbox,
            room: None,
            service,
        }
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    pub async fn handle(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::Join { room_id, token } => self.join(room_id, token).await,

            SignalMessage::Leave {} => self.leave().await,

            msg @ (SignalMessage::Offer { .. }
            | SignalMessage::Answer { .. }
            | SignalMessage::Candidate { .. }
            | SignalMessage::Renegotiate { .. }) => self.relay(msg).await,

            other => warn!(
                "Unexpected signal from {:?}: {:?}",
                self.participant, other
            ),
        }
    }

    /// Called once the socket is gone; detaches the participant from its room.
    pub async fn close(&mut self) {
        self.leave().await;
    }

    async fn join(&mut self, room_id: RoomId, token: Option<String>) {
        if let Err(e) = self.service.authorize(token.as_deref()) {
            warn!("Join of {:?} to room {} rejected: {}", self.participant, room_id, e);
            let _ = self.outbox.send(SignalMessage::Error {
                reason: e.to_string(),
            });
            return;
        }

        if self.room.as_ref().is_some_and(|current| current != &room_id) {
            self.leave().await;
        }

        // До ответа реестра: прерванный join тоже снимается в `close()`.
        self.room = Some(room_id.clone());
        let existing = self
            .service
            .registry()
            .join(&room_id, self.participant.clone(), self.id, self.outbox.clone())
            .await;

        let _ = self.outbox.send(SignalMessage::Existing {
            participants: existing,
        });
    }

    async fn leave(&mut self) {
        let Some(room_id) = self.room.take() else {
            return;
        };

        let outcome = self
            .service
            .registry()
            .leave(&room_id, &self.participant, self.id)
            .await;
        if outcome == LeaveOutcome::NotMember {
            debug!(
                "{:?} was no longer registered in room {}",
                self.participant, room_id
            );
        }
    }

    async fn relay(&mut self, msg: SignalMessage) {
        let Some(room_id) = self.room.clone() else {
            let kind = match msg {
                SignalMessage::Offer { .. } => "offer",
                SignalMessage::Answer { .. } => "answer",
                SignalMessage::Renegotiate { .. } => "renegotiate",
                _ => "candidate",
            };
            warn!(
                "{}",
                RelayError::NotJoined {
                    participant: self.participant.clone(),
                    kind,
                }
            );
            return;
        };

        let msg = msg.stamped(&self.participant);
        let outcome = self.service.registry().relay(&room_id, msg).await;
        if outcome == RelayOutcome::Dropped {
            info!(
                "Signal from {:?} in room {} was dropped",
                self.participant, room_id
            );
        }
    }
}
