use crate::media::LocalTrack;
use crate::transport::{LinkId, TransportEvent};
use anyhow::Result;
use async_trait::async_trait;
use screenshare_core::{IceCandidate, IceServerConfig, ParticipantId, TrackKind};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Result of putting a local track on (or taking it off) a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// An already negotiated sender carries the change; no new offer needed.
    Reused,
    NeedsNegotiation,
}

/// One media transport towards one remote participant.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Creates an offer, installs it as the local description and returns its SDP.
    async fn create_offer(&self) -> Result<String>;

    /// Creates an answer to the applied remote offer and installs it locally.
    async fn create_answer(&self) -> Result<String>;

    async fn set_remote_description(&self, kind: SdpKind, sdp: String) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn attach_track(&self, track: &LocalTrack) -> Result<Attachment>;

    async fn detach_track(&self, kind: TrackKind) -> Result<Attachment>;

    async fn close(&self) -> Result<()>;
}

/// Everything a factory needs to build the transport of one link.
pub struct TransportSpec {
    pub link: LinkId,
    pub remote: ParticipantId,
    /// Only the initiator ever creates offers on this transport.
    pub initiator: bool,
    pub ice_servers: Vec<IceServerConfig>,
    pub events: mpsc::Sender<TransportEvent>,
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(&self, spec: TransportSpec) -> Result<Box<dyn PeerTransport>>;
}
