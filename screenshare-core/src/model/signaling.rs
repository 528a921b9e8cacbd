use crate::model::participant::ParticipantId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// Сетевой кандидат в формате `RTCIceCandidateInit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default)]
    pub username_fragment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum SignalMessage {
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    Join {
        room_id: RoomId,
        #[serde(default)]
        token: Option<String>,
    },
    /// Ответ на `Join`: участники, присутствовавшие в комнате до входа (в порядке входа).
    Existing {
        participants: Vec<ParticipantId>,
    },
    Joined {
        participant_id: ParticipantId,
    },
    Leave {},
    Left {
        participant_id: ParticipantId,
    },
    Offer {
        from: ParticipantId,
        to: ParticipantId,
        sdp: String,
    },
    Answer {
        from: ParticipantId,
        to: ParticipantId,
        sdp: String,
    },
    Candidate {
        from: ParticipantId,
        to: ParticipantId,
        candidate: IceCandidate,
    },
    /// Non-initiator asks the link initiator for a fresh offer.
    Renegotiate {
        from: ParticipantId,
        to: ParticipantId,
    },
    Error {
        reason: String,
    },
}

impl SignalMessage {
    /// Addressee of a point-to-point negotiation message.
    pub fn recipient(&self) -> Option<&ParticipantId> {
        match self {
            SignalMessage::Offer { to, .. }
            | SignalMessage::Answer { to, .. }
            | SignalMessage::Candidate { to, .. }
            | SignalMessage::Renegotiate { to, .. } => Some(to),
            _ => None,
        }
    }

    pub fn sender(&self) -> Option<&ParticipantId> {
        match self {
            SignalMessage::Offer { from, .. }
            | SignalMessage::Answer { from, .. }
            | SignalMessage::Candidate { from, .. }
            | SignalMessage::Renegotiate { from, .. } => Some(from),
            _ => None,
        }
    }

    /// Overwrites `from` on negotiation messages. The relay calls this with the
    /// identity bound to the socket the message arrived on.
    pub fn stamped(mut self, sender: &ParticipantId) -> Self {
        match &mut self {
            SignalMessage::Offer { from, .. }
            | SignalMessage::Answer { from, .. }
            | SignalMessage::Candidate { from, .. }
            | SignalMessage::Renegotiate { from, .. } => *from = sender.clone(),
            _ => {}
        }
        self
    }

    pub fn is_negotiation(&self) -> bool {
        self.recipient().is_some()
    }
}
