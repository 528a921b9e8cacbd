use crate::error::NegotiationError;
use crate::media::LocalTrack;
use crate::orchestrator::{CandidateBuffer, CloseReason, LinkEvent, LinkState};
use crate::signaling::SignalingOutput;
use crate::transport::{
    Attachment, LinkId, PeerTransport, SdpKind, TransportEvent, TransportFactory, TransportSpec,
};
use screenshare_core::{IceCandidate, IceServerConfig, ParticipantId, TrackKind};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until, timeout};
use tracing::{debug, info, warn};

/// Команды, поступающие в задачу линка от оркестратора.
#[derive(Debug)]
pub(crate) enum LinkCommand {
    /// Инициатор начинает первое согласование.
    Start,
    RemoteOffer(String),
    RemoteAnswer(String),
    RemoteCandidate(IceCandidate),
    /// Удалённая сторона просит новый offer (приходит только инициатору).
    OfferRequested,
    /// Новый полный набор локальных треков.
    TracksChanged(Vec<LocalTrack>),
    Close {
        reason: CloseReason,
        reply: oneshot::Sender<()>,
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct LinkTimeouts {
    pub op: Duration,
    pub negotiation: Duration,
}

/// The orchestrator's record of one running link.
#[derive(Debug)]
pub struct LinkHandle {
    pub id: LinkId,
    pub initiator: bool,
    /// Last state the link reported.
    pub state: LinkState,
    commands: mpsc::UnboundedSender<LinkCommand>,
}

impl LinkHandle {
    pub(crate) fn send(&self, cmd: LinkCommand) -> bool {
        self.commands.send(cmd).is_ok()
    }

    /// Waits until the link has released its transport and tracks.
    pub(crate) async fn close(self, reason: CloseReason, wait: Duration) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.send(LinkCommand::Close {
            reason,
            reply: reply_tx,
        }) && timeout(wait, reply_rx).await.is_err()
        {
            warn!("Link {} did not confirm close in time", self.id);
        }
    }
}

pub(crate) struct LinkParams {
    pub id: LinkId,
    pub remote: ParticipantId,
    pub initiator: bool,
    pub tracks: Vec<LocalTrack>,
    pub early_candidates: CandidateBuffer,
    pub ice_servers: Vec<IceServerConfig>,
    pub factory: Arc<dyn TransportFactory>,
    pub signaling: Arc<dyn SignalingOutput>,
    pub transport_events: mpsc::Sender<TransportEvent>,
    pub events: mpsc::UnboundedSender<LinkEvent>,
    pub timeouts: LinkTimeouts,
}

pub(crate) fn spawn_link(params: LinkParams) -> LinkHandle {
    let (commands, command_rx) = mpsc::unbounded_channel();
    let handle = LinkHandle {
        id: params.id,
        initiator: params.initiator,
        state: LinkState::New,
        commands,
    };

    tokio::spawn(run_link(params, command_rx));
    handle
}

async fn run_link(params: LinkParams, commands: mpsc::UnboundedReceiver<LinkCommand>) {
    let LinkParams {
        id,
        remote,
        initiator,
        tracks,
        early_candidates,
        ice_servers,
        factory,
        signaling,
        transport_events,
        events,
        timeouts,
    } = params;

    let spec = TransportSpec {
        link: id,
        remote: remote.clone(),
        initiator,
        ice_servers,
        events: transport_events,
    };

    let transport = match guarded(timeouts.op, "create transport", factory.create(spec)).await {
        Ok(transport) => transport,
        Err(e) => {
            warn!("Failed to create transport for {:?}: {}", remote, e);
            let _ = events.send(LinkEvent::StateChanged {
                remote: remote.clone(),
                link: id,
                state: LinkState::Closed,
            });
            let _ = events.send(LinkEvent::Closed {
                remote,
                link: id,
                reason: CloseReason::NegotiationFailed(e.to_string()),
            });
            return;
        }
    };

    let link = PeerLink {
        id,
        remote,
        initiator,
        state: LinkState::New,
        transport,
        signaling,
        events,
        timeouts,
        pending: early_candidates,
        remote_applied: false,
        making_offer: false,
        renegotiate: false,
        tracks_dirty: false,
        desired: tracks,
        attached: HashMap::new(),
        deadline: None,
    };
    link.run(commands).await;
}

/// Согласование с одним удалённым участником. Живёт в собственной задаче,
/// поэтому медленный пир не задерживает остальных.
struct PeerLink {
    id: LinkId,
    remote: ParticipantId,
    initiator: bool,
    state: LinkState,
    transport: Box<dyn PeerTransport>,
    signaling: Arc<dyn SignalingOutput>,
    events: mpsc::UnboundedSender<LinkEvent>,
    timeouts: LinkTimeouts,
    /// Remote candidates waiting for the first remote description.
    pending: CandidateBuffer,
    remote_applied: bool,
    /// A local offer is out and unanswered.
    making_offer: bool,
    /// A fresh exchange is owed once the link is back in `Stable`.
    renegotiate: bool,
    /// `desired` changed while the transport could not take it.
    tracks_dirty: bool,
    desired: Vec<LocalTrack>,
    attached: HashMap<TrackKind, LocalTrack>,
    deadline: Option<Instant>,
}

impl PeerLink {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<LinkCommand>) {
        debug!(
            "Link {} to {:?} started (initiator: {})",
            self.id, self.remote, self.initiator
        );

        let reason = loop {
            let deadline = self.deadline;

            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(LinkCommand::Close { reason, reply }) => {
                        self.shutdown(reason).await;
                        let _ = reply.send(());
                        return;
                    }
                    Some(cmd) => {
                        if let Err(e) = self.handle(cmd).await {
                            warn!("Link {} to {:?} failed: {}", self.id, self.remote, e);
                            break match e {
                                NegotiationError::Signaling(_) => CloseReason::SignalingLost,
                                other => CloseReason::NegotiationFailed(other.to_string()),
                            };
                        }
                    }
                    None => break CloseReason::LocalLeave,
                },

                _ = watchdog(deadline) => {
                    warn!("Link {} to {:?} stuck in negotiation", self.id, self.remote);
                    break CloseReason::NegotiationFailed("negotiation timed out".to_owned());
                }
            }
        };

        self.shutdown(reason).await;
    }

    async fn handle(&mut self, cmd: LinkCommand) -> Result<(), NegotiationError> {
        match cmd {
            LinkCommand::Start => self.start().await,
            LinkCommand::RemoteOffer(sdp) => self.on_remote_offer(sdp).await,
            LinkCommand::RemoteAnswer(sdp) => self.on_remote_answer(sdp).await,
            LinkCommand::RemoteCandidate(candidate) => self.on_remote_candidate(candidate).await,
            LinkCommand::OfferRequested => self.on_offer_requested().await,
            LinkCommand::TracksChanged(tracks) => self.on_tracks_changed(tracks).await,
            LinkCommand::Close { .. } => Ok(()),
        }
    }

    async fn start(&mut self) -> Result<(), NegotiationError> {
        if self.state != LinkState::New {
            debug!("Link {} already started", self.id);
            return Ok(());
        }
        self.offer().await
    }

    /// Offers come only from the initiator, so the two sides never hold
    /// unanswered offers at the same time.
    async fn offer(&mut self) -> Result<(), NegotiationError> {
        if !self.initiator {
            return self.request_offer().await;
        }

        self.transition(LinkState::Negotiating)?;
        self.tracks_dirty = false;
        self.sync_tracks().await?;

        let sdp = guarded(self.timeouts.op, "create offer", self.transport.create_offer()).await?;
        self.making_offer = true;
        self.renegotiate = false;

        self.signaling.send_offer(self.remote.clone(), sdp).await?;
        info!("Offer sent to {:?} on {}", self.remote, self.id);
        Ok(())
    }

    async fn request_offer(&mut self) -> Result<(), NegotiationError> {
        self.transition(LinkState::Negotiating)?;
        self.renegotiate = false;
        self.signaling.send_renegotiate(self.remote.clone()).await?;
        info!("Asked {:?} for a new offer on {}", self.remote, self.id);
        Ok(())
    }

    async fn on_offer_requested(&mut self) -> Result<(), NegotiationError> {
        if !self.initiator {
            warn!("Offer request from {:?} on a responder link {}", self.remote, self.id);
            return Ok(());
        }
        if self.state == LinkState::Stable {
            return self.offer().await;
        }
        // Served when the current exchange completes.
        self.renegotiate = true;
        Ok(())
    }

    async fn on_remote_offer(&mut self, sdp: String) -> Result<(), NegotiationError> {
        if self.initiator {
            warn!(
                "Ignoring offer from {:?} on initiator link {}",
                self.remote, self.id
            );
            return Ok(());
        }

        self.transition(LinkState::Negotiating)?;
        guarded(
            self.timeouts.op,
            "apply offer",
            self.transport.set_remote_description(SdpKind::Offer, sdp),
        )
        .await?;
        self.remote_applied = true;

        self.tracks_dirty = false;
        if self.sync_tracks().await? {
            self.renegotiate = true;
        }

        let answer = guarded(self.timeouts.op, "create answer", self.transport.create_answer()).await?;
        self.signaling.send_answer(self.remote.clone(), answer).await?;
        info!("Answer sent to {:?} on {}", self.remote, self.id);

        self.flush_candidates().await?;
        self.transition(LinkState::Stable)?;
        self.after_stable().await
    }

    async fn on_remote_answer(&mut self, sdp: String) -> Result<(), NegotiationError> {
        if !self.making_offer {
            warn!("Unexpected answer from {:?} on {}", self.remote, self.id);
            return Ok(());
        }

        guarded(
            self.timeouts.op,
            "apply answer",
            self.transport.set_remote_description(SdpKind::Answer, sdp),
        )
        .await?;
        self.making_offer = false;
        self.remote_applied = true;

        self.flush_candidates().await?;
        self.transition(LinkState::Stable)?;
        self.after_stable().await
    }

    async fn on_remote_candidate(&mut self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        if !self.remote_applied {
            if !self.pending.push(candidate) {
                warn!("Candidate buffer for {:?} is full, dropping", self.remote);
            }
            return Ok(());
        }

        guarded(
            self.timeouts.op,
            "add candidate",
            self.transport.add_ice_candidate(candidate),
        )
        .await
    }

    async fn on_tracks_changed(&mut self, tracks: Vec<LocalTrack>) -> Result<(), NegotiationError> {
        self.desired = tracks;

        if self.state != LinkState::Stable {
            // Picked up by the negotiation in flight, or once it completes.
            self.tracks_dirty = true;
            return Ok(());
        }

        if self.sync_tracks().await? {
            self.offer().await?;
        }
        Ok(())
    }

    async fn after_stable(&mut self) -> Result<(), NegotiationError> {
        if self.tracks_dirty {
            self.tracks_dirty = false;
            if self.sync_tracks().await? {
                self.renegotiate = true;
            }
        }

        if self.renegotiate {
            self.offer().await?;
        }
        Ok(())
    }

    async fn flush_candidates(&mut self) -> Result<(), NegotiationError> {
        while let Some(candidate) = self.pending.pop() {
            guarded(
                self.timeouts.op,
                "add candidate",
                self.transport.add_ice_candidate(candidate),
            )
            .await?;
        }
        Ok(())
    }

    /// Brings the transport's senders in line with `desired`. Returns true
    /// when the change has to be negotiated.
    async fn sync_tracks(&mut self) -> Result<bool, NegotiationError> {
        let mut needs_offer = false;

        for kind in [TrackKind::Video, TrackKind::Audio] {
            let wanted = self.desired.iter().find(|t| t.kind() == kind).cloned();
            let current = self.attached.get(&kind).cloned();

            let attachment = match (current, wanted) {
                (Some(current), Some(wanted)) if current.same_source(&wanted) => continue,
                (_, Some(wanted)) => {
                    let attachment = guarded(
                        self.timeouts.op,
                        "attach track",
                        self.transport.attach_track(&wanted),
                    )
                    .await?;
                    self.attached.insert(kind, wanted);
                    attachment
                }
                (Some(_), None) => {
                    let attachment = guarded(
                        self.timeouts.op,
                        "detach track",
                        self.transport.detach_track(kind),
                    )
                    .await?;
                    self.attached.remove(&kind);
                    attachment
                }
                (None, None) => continue,
            };

            needs_offer |= attachment == Attachment::NeedsNegotiation;
        }

        Ok(needs_offer)
    }

    fn transition(&mut self, next: LinkState) -> Result<(), NegotiationError> {
        if self.state == next {
            return Ok(());
        }
        if !self.state.can_transition_to(next) {
            return Err(NegotiationError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        debug!("Link {} to {:?}: {:?} -> {:?}", self.id, self.remote, self.state, next);
        self.state = next;
        self.deadline =
            (next == LinkState::Negotiating).then(|| Instant::now() + self.timeouts.negotiation);

        let _ = self.events.send(LinkEvent::StateChanged {
            remote: self.remote.clone(),
            link: self.id,
            state: next,
        });
        Ok(())
    }

    /// Закрыть транспорт и отпустить все треки. Повторный вызов ничего не делает.
    async fn shutdown(&mut self, reason: CloseReason) {
        if self.state.is_closed() {
            return;
        }

        if let Err(e) = guarded(self.timeouts.op, "close transport", self.transport.close()).await {
            debug!("Closing transport of {:?} failed: {}", self.remote, e);
        }
        self.attached.clear();
        self.desired.clear();
        self.pending.clear();

        let _ = self.transition(LinkState::Closed);
        info!("Link {} to {:?} closed: {:?}", self.id, self.remote, reason);
        let _ = self.events.send(LinkEvent::Closed {
            remote: self.remote.clone(),
            link: self.id,
            reason,
        });
    }
}

async fn guarded<T>(
    limit: Duration,
    operation: &'static str,
    fut: impl Future<Output = anyhow::Result<T>>,
) -> Result<T, NegotiationError> {
    match timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(NegotiationError::Transport {
            operation,
            message: format!("{:#}", e),
        }),
        Err(_) => Err(NegotiationError::Timeout { operation }),
    }
}

async fn watchdog(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
