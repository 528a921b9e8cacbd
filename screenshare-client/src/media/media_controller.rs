use crate::config::ShareOptions;
use crate::error::MediaError;
use crate::media::{CaptureSource, LocalTrack, MediaEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The tracks a share publishes to every peer.
#[derive(Debug, Clone)]
pub struct LocalStream {
    pub video: LocalTrack,
    pub audio: Option<LocalTrack>,
}

impl LocalStream {
    pub fn tracks(&self) -> Vec<LocalTrack> {
        std::iter::once(self.video.clone())
            .chain(self.audio.clone())
            .collect()
    }
}

/// A capture that is acquired but not yet published.
#[derive(Debug)]
pub struct AcquiredCapture {
    stream: LocalStream,
    /// Inputs feeding a mixed track; released together with the stream.
    sources: Vec<LocalTrack>,
}

impl AcquiredCapture {
    pub fn stream(&self) -> &LocalStream {
        &self.stream
    }

    /// Ends every track, published or not.
    pub fn release(self) {
        for track in self.stream.tracks().iter().chain(&self.sources) {
            track.end();
        }
    }
}

struct ActiveCapture {
    capture: AcquiredCapture,
    watcher: JoinHandle<()>,
}

/// Владелец локального захвата: не более одного активного потока.
pub struct LocalMediaController {
    capture: Arc<dyn CaptureSource>,
    active: Option<ActiveCapture>,
    events: mpsc::UnboundedSender<MediaEvent>,
}

impl LocalMediaController {
    pub fn new(capture: Arc<dyn CaptureSource>, events: mpsc::UnboundedSender<MediaEvent>) -> Self {
        Self {
            capture,
            active: None,
            events,
        }
    }

    pub fn capture_source(&self) -> Arc<dyn CaptureSource> {
        self.capture.clone()
    }

    pub async fn start(&mut self, options: ShareOptions) -> Result<LocalStream, MediaError> {
        let acquired = Self::acquire(self.capture.clone(), options).await?;
        Ok(self.activate(acquired))
    }

    /// Runs the capture pickers without touching controller state, so callers
    /// can do it off their event loop.
    pub async fn acquire(
        capture: Arc<dyn CaptureSource>,
        options: ShareOptions,
    ) -> Result<AcquiredCapture, MediaError> {
        let display = capture.display(options.system_audio).await?;

        if !options.with_microphone {
            return Ok(AcquiredCapture {
                stream: LocalStream {
                    video: display.video,
                    audio: display.system_audio,
                },
                sources: Vec::new(),
            });
        }

        let microphone = match capture.microphone().await {
            Ok(track) => track,
            Err(e) => {
                warn!("Microphone capture failed, aborting share: {}", e);
                display.video.end();
                if let Some(system) = display.system_audio {
                    system.end();
                }
                return Err(e);
            }
        };

        let Some(system) = display.system_audio else {
            debug!("No system audio in display capture, using microphone only");
            return Ok(AcquiredCapture {
                stream: LocalStream {
                    video: display.video,
                    audio: Some(microphone),
                },
                sources: Vec::new(),
            });
        };

        match capture.mix_audio(&system, &microphone).await {
            Ok(mixed) => Ok(AcquiredCapture {
                stream: LocalStream {
                    video: display.video,
                    audio: Some(mixed),
                },
                sources: vec![system, microphone],
            }),
            Err(e) => {
                warn!("Audio mixing failed, falling back to microphone: {}", e);
                system.end();
                Ok(AcquiredCapture {
                    stream: LocalStream {
                        video: display.video,
                        audio: Some(microphone),
                    },
                    sources: Vec::new(),
                })
            }
        }
    }

    /// Publishes an acquired capture, replacing whatever was active.
    pub fn activate(&mut self, capture: AcquiredCapture) -> LocalStream {
        self.stop();

        let stream = capture.stream.clone();
        let mut ended = stream.video.ended();
        let track_id = stream.video.id().to_owned();
        let events = self.events.clone();

        let watcher = tokio::spawn(async move {
            if ended.wait_for(|e| *e).await.is_ok() {
                let _ = events.send(MediaEvent::EndedExternally { track_id });
            }
        });

        info!("Local capture started: {:?}", stream);
        self.active = Some(ActiveCapture { capture, watcher });
        stream
    }

    /// Releases every owned track. Returns false when nothing was active.
    pub fn stop(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };

        // The watcher goes first so a local stop is not reported as external.
        active.watcher.abort();
        active.capture.release();
        info!("Local capture stopped");
        true
    }

    /// Routes capture events to `stop`. Returns true when the share ended.
    pub fn handle_event(&mut self, event: &MediaEvent) -> bool {
        match event {
            MediaEvent::EndedExternally { track_id } => {
                let current = self
                    .active
                    .as_ref()
                    .is_some_and(|a| a.capture.stream.video.id() == track_id);
                if !current {
                    debug!("Ignoring end of stale track {}", track_id);
                    return false;
                }

                info!("Capture ended externally");
                self.stop()
            }
        }
    }

    pub fn stream(&self) -> Option<&LocalStream> {
        self.active.as_ref().map(|a| &a.capture.stream)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for LocalMediaController {
    fn drop(&mut self) {
        self.stop();
    }
}
