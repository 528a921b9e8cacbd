use screenshare_client::{LinkState, LocalTrack};
use screenshare_core::{ParticipantId, SignalMessage, TrackKind};

use crate::integration::init_tracing;
use crate::utils::{OrchestratorHarness, SETTLE_TIMEOUT_MS, fake_sdp};

#[tokio::test]
async fn test_initiator_ignores_stray_offer() {
    init_tracing();

    let mut h = OrchestratorHarness::new("carol");
    let alice = ParticipantId::from("alice");

    h.signal(SignalMessage::Existing {
        participants: vec![alice.clone()],
    })
    .await;
    assert!(h.wait_for_state("alice", LinkState::Negotiating).await);

    h.offer_from("alice", fake_sdp("offer", &[TrackKind::Video]))
        .await;
    h.settle(100).await;

    assert!(h.signaling.answers_to(&alice).is_empty());
    assert_eq!(h.current_state(&alice), Some(LinkState::Negotiating));

    h.answer_from("alice", fake_sdp("answer", &[])).await;
    assert!(h.wait_for_state("alice", LinkState::Stable).await);
}

#[tokio::test]
async fn test_responder_requests_offer_instead_of_offering() {
    init_tracing();

    let mut h = OrchestratorHarness::new("alice");
    let dave = ParticipantId::from("dave");

    h.offer_from("dave", fake_sdp("offer", &[])).await;
    assert!(h.wait_for_state("dave", LinkState::Stable).await);

    // Alice starts sharing while dave renegotiates on his own.
    let video = LocalTrack::new(TrackKind::Video);
    h.orchestrator.set_local_tracks(vec![video.clone()]);
    let requested = h
        .wait_for(|h| h.signaling.offer_requests_to(&dave) == 1, SETTLE_TIMEOUT_MS)
        .await;
    assert!(requested);
    assert_eq!(h.current_state(&dave), Some(LinkState::Negotiating));

    h.offer_from("dave", fake_sdp("offer", &[TrackKind::Audio]))
        .await;
    assert!(h.wait_for_state("dave", LinkState::Stable).await);

    assert!(h.signaling.offers_to(&dave).is_empty());
    let answers = h.signaling.answers_to(&dave);
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[1], fake_sdp("answer", &[TrackKind::Video]));
    assert_eq!(h.signaling.offer_requests_to(&dave), 1);
}

#[tokio::test]
async fn test_initiator_serves_offer_request() {
    init_tracing();

    let mut h = OrchestratorHarness::new("carol");
    let bob = ParticipantId::from("bob");

    h.signal(SignalMessage::Existing {
        participants: vec![bob.clone()],
    })
    .await;
    assert!(h.wait_for_state("bob", LinkState::Negotiating).await);

    // A request during the first exchange is served once it completes.
    h.offer_request_from("bob").await;
    h.settle(100).await;
    assert_eq!(h.signaling.offers_to(&bob).len(), 1);

    h.answer_from("bob", fake_sdp("answer", &[])).await;
    let reoffered = h
        .wait_for(|h| h.signaling.offers_to(&bob).len() == 2, SETTLE_TIMEOUT_MS)
        .await;
    assert!(reoffered);

    h.answer_from("bob", fake_sdp("answer", &[TrackKind::Video]))
        .await;
    assert!(h.wait_for_state("bob", LinkState::Stable).await);
    assert!(
        h.wait_for(|h| h.remote_tracks_of("bob") == 1, SETTLE_TIMEOUT_MS)
            .await
    );

    // From Stable the request is answered right away.
    h.offer_request_from("bob").await;
    let reoffered = h
        .wait_for(|h| h.signaling.offers_to(&bob).len() == 3, SETTLE_TIMEOUT_MS)
        .await;
    assert!(reoffered);
    assert_eq!(h.signaling.offer_requests_to(&bob), 0);
}
