use crate::error::MediaError;
use crate::media::LocalTrack;
use async_trait::async_trait;

/// What the display picker produced.
#[derive(Debug, Clone)]
pub struct DisplayCapture {
    pub video: LocalTrack,
    /// Present only when system audio was requested and the platform offers it.
    pub system_audio: Option<LocalTrack>,
}

/// Platform capture backend (screen picker, microphone, audio mixer).
#[async_trait]
pub trait CaptureSource: Send + Sync {
    async fn display(&self, with_audio: bool) -> Result<DisplayCapture, MediaError>;

    async fn microphone(&self) -> Result<LocalTrack, MediaError>;

    /// Produces one track carrying both inputs.
    async fn mix_audio(
        &self,
        system: &LocalTrack,
        microphone: &LocalTrack,
    ) -> Result<LocalTrack, MediaError>;
}
