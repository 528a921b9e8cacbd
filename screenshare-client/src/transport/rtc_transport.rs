use crate::media::LocalTrack;
use crate::transport::{
    Attachment, LinkId, PeerTransport, RemoteTrack, SdpKind, TransportEvent, TransportEventKind,
    TransportFactory, TransportSpec,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use screenshare_core::{IceCandidate, IceServerConfig, ParticipantId, TrackKind};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::track::track_local::TrackLocal;

/// Отправитель одного вида медиа. Пока локального трека нет, в нём стоит
/// `idle`: трек, в который никто не пишет.
struct SenderSlot {
    sender: Arc<RTCRtpSender>,
    idle: Arc<dyn TrackLocal + Send + Sync>,
}

/// `PeerTransport` on top of a webrtc-rs `RTCPeerConnection`.
pub struct RtcTransport {
    pub link: LinkId,
    pub remote: ParticipantId,
    pub peer_connection: Arc<RTCPeerConnection>,
    slots: Mutex<HashMap<TrackKind, SenderSlot>>,
}

impl RtcTransport {
    /// Инициализация нового WebRTC соединения.
    /// События транспорта уходят в `spec.events` с пометкой `spec.link`.
    pub async fn new(spec: TransportSpec) -> Result<Self> {
        let TransportSpec {
            link,
            remote,
            initiator,
            ice_servers,
            events,
        } = spec;

        // 1. Настройка MediaEngine (VP8/Opus и остальные кодеки по умолчанию)
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        // 2. Регистрация интерцепторов (NACK, RTCP отчеты)
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        // 3. Только STUN: relay-кандидаты не используются
        let rtc_config = RTCConfiguration {
            ice_servers: rtc_ice_servers(ice_servers),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        // A. Мониторинг состояния соединения
        let state_tx = events.clone();
        let uid_state = remote.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    info!("Peer connection state for {:?} ({}): {:?}", uid, link, s);
                    if matches!(
                        s,
                        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed
                    ) {
                        let _ = tx
                            .send(TransportEvent {
                                link,
                                remote: uid,
                                kind: TransportEventKind::Failed(format!("connection {:?}", s)),
                            })
                            .await;
                    }
                })
            },
        ));

        // B. Trickle ICE: локальные кандидаты отправляются пиру по мере появления
        let ice_tx = events.clone();
        let uid_ice = remote.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx
                    .send(TransportEvent {
                        link,
                        remote: uid,
                        kind: TransportEventKind::CandidateGenerated(IceCandidate {
                            candidate: init.candidate,
                            sdp_mid: init.sdp_mid,
                            sdp_m_line_index: init.sdp_mline_index,
                            username_fragment: init.username_fragment,
                        }),
                    })
                    .await;
            })
        }));

        // C. Входящие медиа-треки. Хендлер должен вернуться сразу, трек читает UI.
        let track_tx = events;
        let uid_track = remote.clone();
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let uid = uid_track.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    RTPCodecType::Video => TrackKind::Video,
                    other => {
                        debug!("Ignoring remote track of kind {:?} from {:?}", other, uid);
                        return;
                    }
                };
                let remote_track = RemoteTrack {
                    kind,
                    id: track.id().to_string(),
                    source: Some(track),
                };
                let _ = tx
                    .send(TransportEvent {
                        link,
                        remote: uid,
                        kind: TransportEventKind::RemoteTrack(remote_track),
                    })
                    .await;
            })
        }));

        // D. По одному sendrecv-слоту на аудио и видео с обеих сторон.
        // У инициатора они дают m-секции первого offer, у отвечающего
        // сопоставляются с ними при применении offer.
        let mut slots = HashMap::new();
        for kind in [TrackKind::Audio, TrackKind::Video] {
            let idle: Arc<dyn TrackLocal + Send + Sync> = LocalTrack::new(kind).rtc_track();
            let transceiver = peer_connection
                .add_transceiver_from_track(
                    idle.clone(),
                    Some(RTCRtpTransceiverInit {
                        direction: RTCRtpTransceiverDirection::Sendrecv,
                        send_encodings: vec![],
                    }),
                )
                .await
                .with_context(|| format!("Failed to add {} transceiver", kind))?;
            let sender = transceiver.sender().await;
            drain_rtcp(sender.clone());
            slots.insert(kind, SenderSlot { sender, idle });
        }
        debug!("Transport {} to {:?} ready (initiator: {})", link, remote, initiator);

        Ok(Self {
            link,
            remote,
            peer_connection,
            slots: Mutex::new(slots),
        })
    }
}

/// RTCP нужно вычитывать, иначе интерцепторы не работают.
fn drain_rtcp(sender: Arc<RTCRtpSender>) {
    tokio::spawn(async move {
        let mut rtcp_buf = vec![0u8; 1500];
        while sender.read(&mut rtcp_buf).await.is_ok() {}
    });
}

fn rtc_ice_servers(servers: Vec<IceServerConfig>) -> Vec<RTCIceServer> {
    servers
        .into_iter()
        .filter(|server| !server.urls.is_empty())
        .map(|server| RTCIceServer {
            urls: server.urls,
            username: server.username.unwrap_or_default(),
            credential: server.credential.unwrap_or_default(),
        })
        .collect()
}

#[async_trait]
impl PeerTransport for RtcTransport {
    async fn create_offer(&self) -> Result<String> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn set_remote_description(&self, kind: SdpKind, sdp: String) -> Result<()> {
        let desc = match kind {
            SdpKind::Offer => RTCSessionDescription::offer(sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn attach_track(&self, track: &LocalTrack) -> Result<Attachment> {
        let mut slots = self.slots.lock().await;
        let rtc_track: Arc<dyn TrackLocal + Send + Sync> = track.rtc_track();

        if let Some(slot) = slots.get(&track.kind()) {
            slot.sender
                .replace_track(Some(rtc_track))
                .await
                .context("Failed to replace track")?;
            return Ok(Attachment::Reused);
        }

        let sender = self
            .peer_connection
            .add_track(rtc_track)
            .await
            .context("Failed to add track")?;
        drain_rtcp(sender.clone());

        let idle: Arc<dyn TrackLocal + Send + Sync> = LocalTrack::new(track.kind()).rtc_track();
        slots.insert(track.kind(), SenderSlot { sender, idle });
        Ok(Attachment::NeedsNegotiation)
    }

    /// Слот остаётся за линком: вместо снятия трека ставится `idle`,
    /// так что повторный attach не добавляет новую m-секцию.
    async fn detach_track(&self, kind: TrackKind) -> Result<Attachment> {
        let slots = self.slots.lock().await;
        if let Some(slot) = slots.get(&kind) {
            slot.sender
                .replace_track(Some(slot.idle.clone()))
                .await
                .context("Failed to park sender")?;
        }
        Ok(Attachment::Reused)
    }

    async fn close(&self) -> Result<()> {
        self.slots.lock().await.clear();
        self.peer_connection.close().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RtcTransportFactory;

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(&self, spec: TransportSpec) -> Result<Box<dyn PeerTransport>> {
        Ok(Box::new(RtcTransport::new(spec).await?))
    }
}

/// Creates the event channel a transport reports into.
pub fn transport_channel() -> (mpsc::Sender<TransportEvent>, mpsc::Receiver<TransportEvent>) {
    mpsc::channel(256)
}
