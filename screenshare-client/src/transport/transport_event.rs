use screenshare_core::{IceCandidate, ParticipantId, TrackKind};
use std::fmt;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// Identity of one transport instance. A participant that is re-linked gets a
/// fresh id, so late events from the old transport can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link-{}", self.0)
    }
}

/// Media arriving from a remote participant.
#[derive(Clone)]
pub struct RemoteTrack {
    pub kind: TrackKind,
    pub id: String,
    /// Underlying RTP source; absent for transports that carry no real media.
    pub source: Option<Arc<TrackRemote>>,
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

impl PartialEq for RemoteTrack {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.id == other.id
    }
}

/// События, которые транспорт генерирует для оркестратора.
#[derive(Debug, Clone)]
pub struct TransportEvent {
    pub link: LinkId,
    pub remote: ParticipantId,
    pub kind: TransportEventKind,
}

#[derive(Debug, Clone)]
pub enum TransportEventKind {
    /// Сгенерирован локальный ICE-кандидат, его нужно отправить пиру через сигнальный канал.
    CandidateGenerated(IceCandidate),

    /// Пир начал передавать медиа.
    RemoteTrack(RemoteTrack),

    /// Соединение с пиром разорвано без возможности восстановления.
    Failed(String),
}
