use crate::error::RelayError;
use crate::room::{ConnectionId, LeaveOutcome, Outbox, Participant, RelayOutcome, RoomCommand};
use screenshare_core::{ParticipantId, RoomId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Актор комнаты. Все изменения состава комнаты проходят через его очередь команд,
/// поэтому два одновременных входа не могут получить противоречивые снимки.
pub struct Room {
    id: RoomId,
    /// Участники в порядке входа.
    members: Vec<Participant>,
    command_rx: mpsc::Receiver<RoomCommand>,
    /// Выставляется, когда комнату покинул последний участник.
    retired: bool,
}

impl Room {
    pub fn new(id: RoomId, command_rx: mpsc::Receiver<RoomCommand>) -> Self {
        Self {
            id,
            members: Vec::new(),
            command_rx,
            retired: false,
        }
    }

    pub async fn run(mut self) {
        info!("Room {} event loop started", self.id);

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);

            if self.retired {
                break;
            }
        }

        // Commands that slipped in after retirement are dropped together with
        // their reply channels; callers see the closed reply and retry.
        self.command_rx.close();
        while let Some(cmd) = self.command_rx.recv().await {
            debug!("Room {} dropping late {} command", self.id, command_name(&cmd));
        }

        info!("Room {} event loop finished", self.id);
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                participant,
                connection,
                outbox,
                reply,
            } => {
                let existing = self.join(participant, connection, outbox);
                let _ = reply.send(existing);
            }

            RoomCommand::Leave {
                participant,
                connection,
                reply,
            } => {
                let outcome = self.leave(&participant, connection);
                let _ = reply.send(outcome);
            }

            RoomCommand::Relay { message, reply } => {
                let outcome = self.relay(message);
                let _ = reply.send(outcome);
            }

            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn join(
        &mut self,
        participant: ParticipantId,
        connection: ConnectionId,
        outbox: Outbox,
    ) -> Vec<ParticipantId> {
        if let Some(pos) = self.position(&participant) {
            if self.members[pos].connection == connection {
                debug!("Repeated join of {:?} in room {}", participant, self.id);
                return self.snapshot_without(&participant);
            }

            // Reconnected before the old socket was reaped: peers must drop the
            // stale link before the new one shows up.
            info!(
                "Participant {:?} rejoined room {} on a new connection",
                participant, self.id
            );
            self.members.remove(pos);
            self.broadcast(SignalMessage::Left {
                participant_id: participant.clone(),
            });
        }

        let existing = self.snapshot();
        self.broadcast(SignalMessage::Joined {
            participant_id: participant.clone(),
        });
        self.members
            .push(Participant::new(participant.clone(), connection, outbox));

        info!(
            "Participant {:?} joined room {} ({} already present)",
            participant,
            self.id,
            existing.len()
        );
        existing
    }

    fn leave(&mut self, participant: &ParticipantId, connection: ConnectionId) -> LeaveOutcome {
        let Some(pos) = self.position(participant) else {
            return LeaveOutcome::NotMember;
        };
        if self.members[pos].connection != connection {
            debug!(
                "Ignoring leave of {:?} from superseded connection {:?}",
                participant, connection
            );
            return LeaveOutcome::NotMember;
        }

        self.members.remove(pos);
        self.broadcast(SignalMessage::Left {
            participant_id: participant.clone(),
        });
        info!("Participant {:?} left room {}", participant, self.id);

        let room_empty = self.members.is_empty();
        if room_empty {
            self.retired = true;
        }
        LeaveOutcome::Removed { room_empty }
    }

    fn relay(&self, message: SignalMessage) -> RelayOutcome {
        let (Some(from), Some(to)) = (message.sender(), message.recipient()) else {
            warn!("Room {} refused to relay {:?}", self.id, message);
            return RelayOutcome::Dropped;
        };

        if self.position(from).is_none() {
            warn!("Room {}: sender {:?} is not a member", self.id, from);
            return RelayOutcome::Dropped;
        }

        let Some(target) = self.members.iter().find(|m| &m.id == to) else {
            warn!("Room {}: {}", self.id, RelayError::TargetUnknown(to.clone()));
            return RelayOutcome::Dropped;
        };

        if target.deliver(message) {
            RelayOutcome::Delivered
        } else {
            warn!("Room {}: outbox of {:?} is closed", self.id, target.id);
            RelayOutcome::Dropped
        }
    }

    fn snapshot(&self) -> Vec<ParticipantId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    fn snapshot_without(&self, participant: &ParticipantId) -> Vec<ParticipantId> {
        self.members
            .iter()
            .filter(|m| &m.id != participant)
            .map(|m| m.id.clone())
            .collect()
    }

    fn position(&self, participant: &ParticipantId) -> Option<usize> {
        self.members.iter().position(|m| &m.id == participant)
    }

    fn broadcast(&self, msg: SignalMessage) {
        for member in &self.members {
            if !member.deliver(msg.clone()) {
                debug!("Broadcast to {:?} skipped: socket closing", member.id);
            }
        }
    }
}

fn command_name(cmd: &RoomCommand) -> &'static str {
    match cmd {
        RoomCommand::Join { .. } => "join",
        RoomCommand::Leave { .. } => "leave",
        RoomCommand::Relay { .. } => "relay",
        RoomCommand::Snapshot { .. } => "snapshot",
    }
}
