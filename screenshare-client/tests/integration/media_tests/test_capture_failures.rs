use screenshare_client::{LocalMediaController, MediaError, ShareOptions};
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::{FakeCapture, IssuedAs};

#[tokio::test]
async fn test_denied_display_is_reported() {
    init_tracing();

    let capture = FakeCapture::new();
    capture.fail_display(MediaError::CaptureDenied("user dismissed picker".to_owned()));
    let (events_tx, _events) = mpsc::unbounded_channel();
    let mut media = LocalMediaController::new(capture.clone(), events_tx);

    let result = media.start(ShareOptions::default()).await;
    assert_eq!(
        result.unwrap_err(),
        MediaError::CaptureDenied("user dismissed picker".to_owned())
    );
    assert!(!media.is_active());
    assert!(capture.all_issued().is_empty());
}

#[tokio::test]
async fn test_microphone_failure_aborts_share() {
    init_tracing();

    let capture = FakeCapture::new();
    capture.fail_microphone(MediaError::CaptureUnavailable("no input device".to_owned()));
    let (events_tx, _events) = mpsc::unbounded_channel();
    let mut media = LocalMediaController::new(capture.clone(), events_tx);

    let options = ShareOptions {
        system_audio: true,
        with_microphone: true,
    };
    let result = media.start(options).await;
    assert!(matches!(result, Err(MediaError::CaptureUnavailable(_))));
    assert!(!media.is_active());

    // The display capture obtained before the failure is released.
    assert!(capture.issued(IssuedAs::Display)[0].is_ended());
    assert!(capture.issued(IssuedAs::SystemAudio)[0].is_ended());
}
