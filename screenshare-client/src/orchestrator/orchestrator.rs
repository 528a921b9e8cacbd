use crate::media::LocalTrack;
use crate::orchestrator::peer_link::{LinkCommand, LinkParams, LinkTimeouts, spawn_link};
use crate::orchestrator::{CandidateBuffer, CloseReason, LinkEvent, LinkHandle, LinkState};
use crate::signaling::SignalingOutput;
use crate::transport::{LinkId, TransportEvent, TransportEventKind, TransportFactory};
use screenshare_core::{IceCandidate, IceServerConfig, ParticipantId, SignalMessage};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub ice_servers: Vec<IceServerConfig>,
    pub op_timeout: Duration,
    pub negotiation_timeout: Duration,
    pub candidate_buffer_limit: usize,
}

/// Владеет таблицей линков (участник -> линк) и маршрутизирует в неё
/// сигнальные сообщения, события транспортов и смену локальных треков.
pub struct Orchestrator {
    local: ParticipantId,
    links: HashMap<ParticipantId, LinkHandle>,
    /// Candidates from participants we have no link with yet.
    early_candidates: HashMap<ParticipantId, CandidateBuffer>,
    tracks: Vec<LocalTrack>,
    settings: OrchestratorSettings,
    next_link: u64,
    factory: Arc<dyn TransportFactory>,
    signaling: Arc<dyn SignalingOutput>,
    transport_tx: mpsc::Sender<TransportEvent>,
    link_events: mpsc::UnboundedSender<LinkEvent>,
}

impl Orchestrator {
    pub fn new(
        local: ParticipantId,
        settings: OrchestratorSettings,
        factory: Arc<dyn TransportFactory>,
        signaling: Arc<dyn SignalingOutput>,
        transport_tx: mpsc::Sender<TransportEvent>,
        link_events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Self {
        Self {
            local,
            links: HashMap::new(),
            early_candidates: HashMap::new(),
            tracks: Vec::new(),
            settings,
            next_link: 1,
            factory,
            signaling,
            transport_tx,
            link_events,
        }
    }

    pub fn local_id(&self) -> &ParticipantId {
        &self.local
    }

    pub fn set_ice_servers(&mut self, ice_servers: Vec<IceServerConfig>) {
        self.settings.ice_servers = ice_servers;
    }

    /// Applies one relay message addressed to this participant.
    pub async fn handle_signal(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::Existing { participants } => self.on_existing(participants),
            SignalMessage::Joined { participant_id } => self.on_joined(participant_id).await,
            SignalMessage::Left { participant_id } => {
                self.close_link(&participant_id, CloseReason::RemoteLeft).await;
            }
            SignalMessage::Offer { from, sdp, .. } => self.on_offer(from, sdp),
            SignalMessage::Answer { from, sdp, .. } => self.on_answer(from, sdp),
            SignalMessage::Candidate {
                from, candidate, ..
            } => self.on_candidate(from, candidate),
            SignalMessage::Renegotiate { from, .. } => match self.links.get(&from) {
                Some(link) => {
                    link.send(LinkCommand::OfferRequested);
                }
                None => debug!("Offer request from {:?} without a link", from),
            },
            SignalMessage::IceConfig { ice_servers } => self.set_ice_servers(ice_servers),
            other => debug!("Orchestrator ignores {:?}", other),
        }
    }

    /// The joiner initiates towards everyone who was already in the room.
    fn on_existing(&mut self, participants: Vec<ParticipantId>) {
        for remote in participants {
            if remote == self.local || self.links.contains_key(&remote) {
                continue;
            }
            info!("Initiating link to existing participant {:?}", remote);
            self.create_link(remote, true).send(LinkCommand::Start);
        }
    }

    /// Later joiners initiate; we only prepare to answer.
    async fn on_joined(&mut self, remote: ParticipantId) {
        if remote == self.local {
            return;
        }
        if self.links.contains_key(&remote) {
            info!("Participant {:?} re-joined, replacing its link", remote);
            self.close_link(&remote, CloseReason::Superseded).await;
        }
        self.early_candidates.remove(&remote);
        self.create_link(remote, false);
    }

    fn on_offer(&mut self, from: ParticipantId, sdp: String) {
        if !self.links.contains_key(&from) {
            self.create_link(from.clone(), false);
        }
        if let Some(link) = self.links.get(&from) {
            link.send(LinkCommand::RemoteOffer(sdp));
        }
    }

    fn on_answer(&mut self, from: ParticipantId, sdp: String) {
        match self.links.get(&from) {
            Some(link) => {
                link.send(LinkCommand::RemoteAnswer(sdp));
            }
            None => warn!("Answer from {:?} without a link, dropping", from),
        }
    }

    fn on_candidate(&mut self, from: ParticipantId, candidate: IceCandidate) {
        if let Some(link) = self.links.get(&from) {
            link.send(LinkCommand::RemoteCandidate(candidate));
            return;
        }

        let limit = self.settings.candidate_buffer_limit;
        let buffer = self
            .early_candidates
            .entry(from.clone())
            .or_insert_with(|| CandidateBuffer::new(limit));
        if !buffer.push(candidate) {
            warn!("Early candidate buffer for {:?} is full, dropping", from);
        }
    }

    fn create_link(&mut self, remote: ParticipantId, initiator: bool) -> &LinkHandle {
        let id = LinkId(self.next_link);
        self.next_link += 1;

        let early_candidates = self
            .early_candidates
            .remove(&remote)
            .unwrap_or_else(|| CandidateBuffer::new(self.settings.candidate_buffer_limit));

        let handle = spawn_link(LinkParams {
            id,
            remote: remote.clone(),
            initiator,
            tracks: self.tracks.clone(),
            early_candidates,
            ice_servers: self.settings.ice_servers.clone(),
            factory: self.factory.clone(),
            signaling: self.signaling.clone(),
            transport_events: self.transport_tx.clone(),
            events: self.link_events.clone(),
            timeouts: LinkTimeouts {
                op: self.settings.op_timeout,
                negotiation: self.settings.negotiation_timeout,
            },
        });

        debug!("Created {} to {:?} (initiator: {})", id, remote, initiator);
        self.links.entry(remote).insert_entry(handle).into_mut()
    }

    /// Publishes a new local track set to every link.
    pub fn set_local_tracks(&mut self, tracks: Vec<LocalTrack>) {
        self.tracks = tracks;
        for link in self.links.values() {
            link.send(LinkCommand::TracksChanged(self.tracks.clone()));
        }
    }

    pub async fn on_transport_event(&mut self, event: TransportEvent) {
        let current = self
            .links
            .get(&event.remote)
            .is_some_and(|link| link.id == event.link);
        if !current {
            debug!("Dropping event of stale {} for {:?}", event.link, event.remote);
            return;
        }

        match event.kind {
            TransportEventKind::CandidateGenerated(candidate) => {
                if let Err(e) = self
                    .signaling
                    .send_candidate(event.remote.clone(), candidate)
                    .await
                {
                    debug!("Candidate for {:?} not sent: {}", event.remote, e);
                }
            }
            TransportEventKind::RemoteTrack(track) => {
                let _ = self.link_events.send(LinkEvent::RemoteTrack {
                    remote: event.remote,
                    link: event.link,
                    track,
                });
            }
            TransportEventKind::Failed(reason) => {
                warn!("Transport to {:?} failed: {}", event.remote, reason);
                self.close_link(&event.remote, CloseReason::TransportFailed(reason))
                    .await;
            }
        }
    }

    /// Keeps the table in step with what the link tasks report.
    pub fn on_link_event(&mut self, event: &LinkEvent) {
        let remote = event.remote();
        let Some(link) = self.links.get_mut(remote) else {
            return;
        };
        if link.id != event.link() {
            return;
        }

        match event {
            LinkEvent::StateChanged { state, .. } => link.state = *state,
            LinkEvent::Closed { .. } => {
                self.links.remove(remote);
            }
            LinkEvent::RemoteTrack { .. } => {}
        }
    }

    /// Tears the link down and waits until its resources are released.
    /// Returns false if there was no link.
    pub async fn close_link(&mut self, remote: &ParticipantId, reason: CloseReason) -> bool {
        self.early_candidates.remove(remote);
        let Some(link) = self.links.remove(remote) else {
            return false;
        };

        link.close(reason, self.settings.op_timeout * 2).await;
        true
    }

    pub async fn close_all(&mut self, reason: CloseReason) {
        self.early_candidates.clear();
        let remotes: Vec<ParticipantId> = self.links.keys().cloned().collect();
        for remote in remotes {
            self.close_link(&remote, reason.clone()).await;
        }
    }

    pub fn link(&self, remote: &ParticipantId) -> Option<&LinkHandle> {
        self.links.get(remote)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn link_states(&self) -> BTreeMap<ParticipantId, LinkState> {
        self.links
            .iter()
            .map(|(remote, link)| (remote.clone(), link.state))
            .collect()
    }
}
