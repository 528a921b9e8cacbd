use crate::config::ClientConfig;
use crate::error::{MediaError, SessionError};
use crate::media::{AcquiredCapture, CaptureSource, LocalMediaController, MediaEvent};
use crate::orchestrator::{CloseReason, LinkEvent, Orchestrator, OrchestratorSettings};
use crate::session::{RemoteMedia, SessionCommand, SessionHandle, SessionView};
use crate::signaling::{ChannelEvent, SignalingChannel, SignalingOutput, SignalingSink};
use crate::transport::{TransportEvent, TransportFactory, transport_channel};
use screenshare_core::SignalMessage;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

struct Acquisition {
    generation: u64,
    result: Result<AcquiredCapture, MediaError>,
}

struct PendingStart {
    generation: u64,
    waiters: Vec<oneshot::Sender<Result<(), SessionError>>>,
}

/// Цикл клиента: один таск владеет сигнальным каналом, оркестратором и захватом.
/// Всё остальное общается с ним через очереди.
pub struct Session {
    config: ClientConfig,
    channel: SignalingChannel,
    sink: SignalingSink,
    orchestrator: Orchestrator,
    media: LocalMediaController,
    commands: mpsc::Receiver<SessionCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    link_rx: mpsc::UnboundedReceiver<LinkEvent>,
    media_rx: mpsc::UnboundedReceiver<MediaEvent>,
    acquired_tx: mpsc::UnboundedSender<Acquisition>,
    acquired_rx: mpsc::UnboundedReceiver<Acquisition>,
    /// Bumped on every start; a capture that resolves for an older generation is released.
    generation: u64,
    pending_start: Option<PendingStart>,
    view: SessionView,
    view_tx: watch::Sender<SessionView>,
}

impl Session {
    /// Connects to the relay, joins the configured room and returns a handle.
    pub fn spawn(
        config: ClientConfig,
        capture: Arc<dyn CaptureSource>,
        transports: Arc<dyn TransportFactory>,
    ) -> SessionHandle {
        let channel = SignalingChannel::connect(
            config.endpoint(),
            config.participant_id.clone(),
            config.backoff.clone(),
        );
        let sink = channel.sink();

        let (transport_tx, transport_rx) = transport_channel();
        let (link_tx, link_rx) = mpsc::unbounded_channel();
        let (media_tx, media_rx) = mpsc::unbounded_channel();
        let (acquired_tx, acquired_rx) = mpsc::unbounded_channel();
        let (command_tx, commands) = mpsc::channel(32);
        let (view_tx, view_rx) = watch::channel(SessionView::default());

        let settings = OrchestratorSettings {
            ice_servers: config.transport.ice_servers.clone(),
            op_timeout: config.transport.op_timeout,
            negotiation_timeout: config.negotiation_timeout,
            candidate_buffer_limit: config.candidate_buffer_limit,
        };
        let orchestrator = Orchestrator::new(
            config.participant_id.clone(),
            settings,
            transports,
            Arc::new(sink.clone()),
            transport_tx,
            link_tx,
        );
        let media = LocalMediaController::new(capture, media_tx);
        let handle = SessionHandle::new(config.participant_id.clone(), command_tx, view_rx);

        let session = Session {
            config,
            channel,
            sink,
            orchestrator,
            media,
            commands,
            transport_rx,
            link_rx,
            media_rx,
            acquired_tx,
            acquired_rx,
            generation: 0,
            pending_start: None,
            view: SessionView::default(),
            view_tx,
        };
        tokio::spawn(session.run());

        handle
    }

    async fn run(mut self) {
        info!(
            "Session of {:?} started for room {}",
            self.config.participant_id, self.config.room_id
        );

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(SessionCommand::LeaveRoom { reply }) => {
                        self.leave().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        debug!("All session handles dropped, leaving");
                        self.leave().await;
                        break;
                    }
                },
                event = self.channel.next_event() => match event {
                    Some(event) => self.handle_channel_event(event).await,
                    None => {
                        error!("Signaling channel task ended unexpectedly");
                        self.leave().await;
                        break;
                    }
                },
                Some(event) = self.transport_rx.recv() => {
                    self.orchestrator.on_transport_event(event).await;
                }
                Some(event) = self.link_rx.recv() => self.handle_link_event(event),
                Some(event) = self.media_rx.recv() => self.handle_media_event(event),
                Some(acquisition) = self.acquired_rx.recv() => self.handle_acquisition(acquisition),
            }

            self.publish();
        }

        self.publish();
        info!("Session of {:?} finished", self.config.participant_id);
    }

    fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::StartSharing { reply } => self.start_sharing(reply),
            SessionCommand::StopSharing { reply } => {
                self.stop_sharing();
                let _ = reply.send(Ok(()));
            }
            SessionCommand::LeaveRoom { reply } => {
                let _ = reply.send(());
            }
        }
    }

    /// Capture is acquired on its own task; the result comes back through
    /// `acquired_rx`.
    fn start_sharing(&mut self, reply: oneshot::Sender<Result<(), SessionError>>) {
        if self.media.is_active() {
            let _ = reply.send(Ok(()));
            return;
        }
        if let Some(pending) = &mut self.pending_start {
            pending.waiters.push(reply);
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let capture = self.media.capture_source();
        let options = self.config.share;
        let acquired_tx = self.acquired_tx.clone();
        tokio::spawn(async move {
            let result = LocalMediaController::acquire(capture, options).await;
            if let Err(mpsc::error::SendError(acquisition)) =
                acquired_tx.send(Acquisition { generation, result })
                && let Ok(capture) = acquisition.result
            {
                capture.release();
            }
        });

        self.pending_start = Some(PendingStart {
            generation,
            waiters: vec![reply],
        });
    }

    fn handle_acquisition(&mut self, acquisition: Acquisition) {
        let pending = match self.pending_start.take() {
            Some(pending) if pending.generation == acquisition.generation => pending,
            other => {
                self.pending_start = other;
                if let Ok(capture) = acquisition.result {
                    debug!("Releasing capture of a cancelled share");
                    capture.release();
                }
                return;
            }
        };

        let outcome = match acquisition.result {
            Ok(capture) => {
                let stream = self.media.activate(capture);
                self.orchestrator.set_local_tracks(stream.tracks());
                self.view.sharing = true;
                self.view.last_error = None;
                info!("Sharing started with {} track(s)", stream.tracks().len());
                Ok(())
            }
            Err(e) => {
                warn!("Share failed: {}", e);
                self.view.last_error = Some(e.clone());
                Err(SessionError::Media(e))
            }
        };

        for waiter in pending.waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    fn stop_sharing(&mut self) {
        if let Some(pending) = self.pending_start.take() {
            for waiter in pending.waiters {
                let _ = waiter.send(Err(SessionError::Cancelled));
            }
        }
        if self.media.stop() {
            self.orchestrator.set_local_tracks(Vec::new());
            info!("Sharing stopped");
        }
        self.view.sharing = false;
    }

    async fn leave(&mut self) {
        self.stop_sharing();
        self.orchestrator.close_all(CloseReason::LocalLeave).await;

        if self.view.joined
            && let Err(e) = self.sink.send(SignalMessage::Leave {}).await
        {
            debug!("Leave not sent: {}", e);
        }

        self.view.joined = false;
        self.view.connected = false;
        self.view.remote.clear();
        self.channel.close(self.config.transport.op_timeout).await;
    }

    async fn handle_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected => {
                self.view.connected = true;
                let join = SignalMessage::Join {
                    room_id: self.config.room_id.clone(),
                    token: self.config.access_token.clone(),
                };
                if let Err(e) = self.sink.send(join).await {
                    warn!("Join not sent: {}", e);
                }
            }
            ChannelEvent::Disconnected => {
                warn!("Signaling lost, closing all links");
                self.view.connected = false;
                self.view.joined = false;
                self.orchestrator
                    .close_all(CloseReason::SignalingLost)
                    .await;
                self.view.remote.clear();
            }
            ChannelEvent::Message(msg) => self.handle_signal(msg).await,
        }
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::Existing { .. } => {
                info!("Joined room {}", self.config.room_id);
                self.view.joined = true;
                self.view.relay_error = None;
                self.orchestrator.handle_signal(msg).await;
            }
            SignalMessage::Error { reason } => {
                error!("Relay rejected request: {}", reason);
                self.view.relay_error = Some(reason);
            }
            other => self.orchestrator.handle_signal(other).await,
        }
    }

    fn handle_link_event(&mut self, event: LinkEvent) {
        self.orchestrator.on_link_event(&event);

        match event {
            LinkEvent::RemoteTrack {
                remote,
                link,
                track,
            } => {
                let media = self
                    .view
                    .remote
                    .entry(remote)
                    .or_insert_with(|| RemoteMedia::new(link));
                if media.link != link {
                    *media = RemoteMedia::new(link);
                }
                media.insert(track);
            }
            LinkEvent::Closed { remote, link, .. } => {
                if self.view.remote.get(&remote).is_some_and(|m| m.link == link) {
                    self.view.remote.remove(&remote);
                }
            }
            LinkEvent::StateChanged { .. } => {}
        }
    }

    fn handle_media_event(&mut self, event: MediaEvent) {
        if self.media.handle_event(&event) {
            info!("Capture ended outside the app, sharing stopped");
            self.orchestrator.set_local_tracks(Vec::new());
            self.view.sharing = false;
        }
    }

    fn publish(&mut self) {
        self.view.links = self.orchestrator.link_states();
        let view = &self.view;
        self.view_tx.send_if_modified(|published| {
            if *published == *view {
                return false;
            }
            *published = view.clone();
            true
        });
    }
}
