use crate::error::MediaError;
use crate::orchestrator::LinkState;
use crate::transport::{LinkId, RemoteTrack};
use screenshare_core::{ParticipantId, TrackKind};
use std::collections::BTreeMap;

/// Media received from one remote participant over its current link.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteMedia {
    pub link: LinkId,
    pub video: Option<RemoteTrack>,
    pub audio: Option<RemoteTrack>,
}

impl RemoteMedia {
    pub fn new(link: LinkId) -> Self {
        Self {
            link,
            video: None,
            audio: None,
        }
    }

    pub fn insert(&mut self, track: RemoteTrack) {
        match track.kind {
            TrackKind::Video => self.video = Some(track),
            TrackKind::Audio => self.audio = Some(track),
        }
    }
}

/// Snapshot of the session the UI renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub connected: bool,
    pub joined: bool,
    pub sharing: bool,
    pub remote: BTreeMap<ParticipantId, RemoteMedia>,
    pub links: BTreeMap<ParticipantId, LinkState>,
    /// Why the last share attempt failed.
    pub last_error: Option<MediaError>,
    pub relay_error: Option<String>,
}
