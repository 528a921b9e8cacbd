use crate::room::{
    ConnectionId, LeaveOutcome, MembershipRegistry, Outbox, RelayOutcome, Room, RoomCommand,
};
use async_trait::async_trait;
use dashmap::DashMap;
use screenshare_core::{ParticipantId, RoomId, SignalMessage};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

const ROOM_MAILBOX: usize = 100;

#[derive(Clone, Default)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, mpsc::Sender<RoomCommand>>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sender of a live room actor, spawning one if the room does not exist yet.
    fn get_room_sender(&self, room_id: &RoomId) -> mpsc::Sender<RoomCommand> {
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                info!("Creating new room: {}", room_id);
                let (tx, rx) = mpsc::channel(ROOM_MAILBOX);
                let room = Room::new(room_id.clone(), rx);
                tokio::spawn(room.run());
                tx
            })
            .clone()
    }

    fn existing_room_sender(&self, room_id: &RoomId) -> Option<mpsc::Sender<RoomCommand>> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }

    /// Drops the map entry only while it still points at the retired actor, so a
    /// freshly created room with the same id survives.
    fn forget_room(&self, room_id: &RoomId, sender: &mpsc::Sender<RoomCommand>) {
        let removed = self
            .rooms
            .remove_if(room_id, |_, current| current.same_channel(sender));
        if removed.is_some() {
            info!("Room {} removed", room_id);
        }
    }

    async fn request<T>(
        sender: &mpsc::Sender<RoomCommand>,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Option<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        sender.send(command(reply_tx)).await.ok()?;
        reply_rx.await.ok()
    }
}

#[async_trait]
impl MembershipRegistry for RoomManager {
    async fn join(
        &self,
        room_id: &RoomId,
        participant: ParticipantId,
        connection: ConnectionId,
        outbox: Outbox,
    ) -> Vec<ParticipantId> {
        loop {
            let sender = self.get_room_sender(room_id);
            let reply = Self::request(&sender, |reply| RoomCommand::Join {
                participant: participant.clone(),
                connection,
                outbox: outbox.clone(),
                reply,
            })
            .await;

            match reply {
                Some(existing) => return existing,
                None => {
                    // Lost the race with the last member leaving; the actor is
                    // gone, start over on a fresh room.
                    debug!("Room {} retired during join, retrying", room_id);
                    self.forget_room(room_id, &sender);
                }
            }
        }
    }

    async fn leave(
        &self,
        room_id: &RoomId,
        participant: &ParticipantId,
        connection: ConnectionId,
    ) -> LeaveOutcome {
        let Some(sender) = self.existing_room_sender(room_id) else {
            return LeaveOutcome::NotMember;
        };

        let outcome = Self::request(&sender, |reply| RoomCommand::Leave {
            participant: participant.clone(),
            connection,
            reply,
        })
        .await
        .unwrap_or(LeaveOutcome::NotMember);

        if let LeaveOutcome::Removed { room_empty: true } = outcome {
            self.forget_room(room_id, &sender);
        }
        outcome
    }

    async fn relay(&self, room_id: &RoomId, message: SignalMessage) -> RelayOutcome {
        let Some(sender) = self.existing_room_sender(room_id) else {
            return RelayOutcome::Dropped;
        };

        Self::request(&sender, |reply| RoomCommand::Relay { message, reply })
            .await
            .unwrap_or(RelayOutcome::Dropped)
    }

    async fn snapshot(&self, room_id: &RoomId) -> Vec<ParticipantId> {
        let Some(sender) = self.existing_room_sender(room_id) else {
            return Vec::new();
        };

        Self::request(&sender, |reply| RoomCommand::Snapshot { reply })
            .await
            .unwrap_or_default()
    }

    fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
