use anyhow::{Result, bail};
use bytes::Bytes;
use screenshare_core::TrackKind;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Stream id shared by all tracks of one local share.
pub const LOCAL_STREAM_ID: &str = "screenshare";

/// Локальный трек захвата. Клоны ссылаются на один и тот же источник.
#[derive(Clone)]
pub struct LocalTrack {
    kind: TrackKind,
    inner: Arc<TrackLocalStaticSample>,
    ended: Arc<watch::Sender<bool>>,
}

impl LocalTrack {
    pub fn new(kind: TrackKind) -> Self {
        let capability = match kind {
            TrackKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
            TrackKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
        };
        let id = format!("{}-{}", kind, Uuid::new_v4());
        let inner = TrackLocalStaticSample::new(capability, id, LOCAL_STREAM_ID.to_owned());
        let (ended, _) = watch::channel(false);

        Self {
            kind,
            inner: Arc::new(inner),
            ended: Arc::new(ended),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        self.inner.id()
    }

    pub fn rtc_track(&self) -> Arc<TrackLocalStaticSample> {
        self.inner.clone()
    }

    /// Feeds one encoded frame from the capture pipeline.
    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> Result<()> {
        if self.is_ended() {
            bail!("track {} has ended", self.id());
        }
        self.inner
            .write_sample(&Sample {
                data,
                duration,
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    /// Marks the track as finished. Used both for local release and for the
    /// capture backend reporting an out-of-band stop.
    pub fn end(&self) {
        self.ended.send_replace(true);
    }

    pub fn is_ended(&self) -> bool {
        *self.ended.borrow()
    }

    pub fn ended(&self) -> watch::Receiver<bool> {
        self.ended.subscribe()
    }

    /// Number of live handles on the underlying source, transports included.
    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn same_source(&self, other: &LocalTrack) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("kind", &self.kind)
            .field("id", &self.id())
            .field("ended", &self.is_ended())
            .finish()
    }
}
