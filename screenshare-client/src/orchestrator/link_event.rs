use crate::orchestrator::LinkState;
use crate::transport::{LinkId, RemoteTrack};
use screenshare_core::ParticipantId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    RemoteLeft,
    LocalLeave,
    /// The participant re-joined; its old link gives way to a new one.
    Superseded,
    SignalingLost,
    TransportFailed(String),
    NegotiationFailed(String),
}

/// События линков для сессии и UI.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    StateChanged {
        remote: ParticipantId,
        link: LinkId,
        state: LinkState,
    },

    RemoteTrack {
        remote: ParticipantId,
        link: LinkId,
        track: RemoteTrack,
    },

    /// Последнее событие линка: транспорт закрыт, треки отпущены.
    Closed {
        remote: ParticipantId,
        link: LinkId,
        reason: CloseReason,
    },
}

impl LinkEvent {
    pub fn remote(&self) -> &ParticipantId {
        match self {
            LinkEvent::StateChanged { remote, .. }
            | LinkEvent::RemoteTrack { remote, .. }
            | LinkEvent::Closed { remote, .. } => remote,
        }
    }

    pub fn link(&self) -> LinkId {
        match self {
            LinkEvent::StateChanged { link, .. }
            | LinkEvent::RemoteTrack { link, .. }
            | LinkEvent::Closed { link, .. } => *link,
        }
    }
}
