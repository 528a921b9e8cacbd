use std::time::Duration;

use screenshare_client::{SignalingChannel, SignalingError, SignalingOutput};
use screenshare_core::ParticipantId;
use tokio::net::TcpListener;

use crate::integration::init_tracing;
use crate::integration::signaling_tests::fast_backoff;
use crate::utils::test_candidate;

#[tokio::test]
async fn test_sink_fails_fast() {
    init_tracing();

    // A port with nobody listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let channel = SignalingChannel::connect(
        format!("ws://{}/ws/alice", addr),
        ParticipantId::from("alice"),
        fast_backoff(),
    );
    let sink = channel.sink();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!sink.is_connected());
    let started = tokio::time::Instant::now();
    let result = sink
        .send_candidate(ParticipantId::from("bob"), test_candidate("c1"))
        .await;
    assert!(matches!(result, Err(SignalingError::Disconnected)));
    assert!(started.elapsed() < Duration::from_millis(50));
}
