use screenshare_client::{LinkState, LocalTrack};
use screenshare_core::{ParticipantId, SignalMessage, TrackKind};

use crate::integration::init_tracing;
use crate::utils::{OrchestratorHarness, SETTLE_TIMEOUT_MS, TransportOp, fake_sdp};

async fn stable_initiator_link(h: &mut OrchestratorHarness, remote: &str) {
    h.signal(SignalMessage::Existing {
        participants: vec![ParticipantId::from(remote)],
    })
    .await;
    assert!(h.wait_for_state(remote, LinkState::Negotiating).await);
    h.answer_from(remote, fake_sdp("answer", &[])).await;
    assert!(h.wait_for_state(remote, LinkState::Stable).await);
}

#[tokio::test]
async fn test_track_changes_renegotiate() {
    init_tracing();

    let mut h = OrchestratorHarness::new("carol");
    let alice = ParticipantId::from("alice");
    stable_initiator_link(&mut h, "alice").await;

    let video = LocalTrack::new(TrackKind::Video);
    let audio = LocalTrack::new(TrackKind::Audio);
    h.orchestrator
        .set_local_tracks(vec![video.clone(), audio.clone()]);

    let offered = h
        .wait_for(|h| h.signaling.offers_to(&alice).len() == 2, SETTLE_TIMEOUT_MS)
        .await;
    assert!(offered);
    let offer = h.signaling.offers_to(&alice)[1].clone();
    assert!(offer.contains("video") && offer.contains("audio"));

    h.answer_from("alice", fake_sdp("answer", &[])).await;
    assert!(h.wait_for_state("alice", LinkState::Stable).await);
    assert_eq!(
        h.states_of("alice"),
        vec![
            LinkState::Negotiating,
            LinkState::Stable,
            LinkState::Negotiating,
            LinkState::Stable
        ]
    );

    // Swapping the capture source rides on the negotiated sender.
    let transport = h.transports.latest_for(&alice).unwrap();
    let replacement = LocalTrack::new(TrackKind::Video);
    h.orchestrator
        .set_local_tracks(vec![replacement.clone(), audio.clone()]);
    let expected = TransportOp::Attach {
        kind: TrackKind::Video,
        track_id: replacement.id().to_owned(),
    };
    let replaced = h
        .wait_for(|_| transport.ops().contains(&expected), SETTLE_TIMEOUT_MS)
        .await;
    assert!(replaced);
    h.settle(100).await;
    assert_eq!(h.signaling.offers_to(&alice).len(), 2);
    assert_eq!(h.current_state(&alice), Some(LinkState::Stable));

    // Stopping the share removes both senders and renegotiates.
    h.orchestrator.set_local_tracks(Vec::new());
    let offered = h
        .wait_for(|h| h.signaling.offers_to(&alice).len() == 3, SETTLE_TIMEOUT_MS)
        .await;
    assert!(offered);
    let ops = transport.ops();
    assert!(ops.contains(&TransportOp::Detach(TrackKind::Video)));
    assert!(ops.contains(&TransportOp::Detach(TrackKind::Audio)));
    assert_eq!(h.signaling.offers_to(&alice)[2], fake_sdp("offer", &[]));
}

#[tokio::test]
async fn test_track_change_waits_for_stable() {
    init_tracing();

    let mut h = OrchestratorHarness::new("carol");
    let bob = ParticipantId::from("bob");

    h.signal(SignalMessage::Existing {
        participants: vec![bob.clone()],
    })
    .await;
    assert!(h.wait_for_state("bob", LinkState::Negotiating).await);

    let video = LocalTrack::new(TrackKind::Video);
    h.orchestrator.set_local_tracks(vec![video.clone()]);
    h.settle(100).await;

    // Nothing touches the transport while the first offer is out.
    let transport = h.transports.latest_for(&bob).unwrap();
    assert!(
        !transport
            .ops()
            .iter()
            .any(|op| matches!(op, TransportOp::Attach { .. }))
    );
    assert_eq!(h.signaling.offers_to(&bob).len(), 1);

    h.answer_from("bob", fake_sdp("answer", &[])).await;
    let offered = h
        .wait_for(|h| h.signaling.offers_to(&bob).len() == 2, SETTLE_TIMEOUT_MS)
        .await;
    assert!(offered);
    assert_eq!(
        h.signaling.offers_to(&bob)[1],
        fake_sdp("offer", &[TrackKind::Video])
    );
}

#[tokio::test]
async fn test_new_link_starts_with_current_tracks() {
    init_tracing();

    let mut h = OrchestratorHarness::new("alice");
    let video = LocalTrack::new(TrackKind::Video);
    h.orchestrator.set_local_tracks(vec![video.clone()]);

    h.signal(SignalMessage::Existing {
        participants: vec![ParticipantId::from("bob")],
    })
    .await;
    let offered = h
        .wait_for(
            |h| h.signaling.offers_to(&ParticipantId::from("bob")).len() == 1,
            SETTLE_TIMEOUT_MS,
        )
        .await;
    assert!(offered);
    assert_eq!(
        h.signaling.offers_to(&ParticipantId::from("bob"))[0],
        fake_sdp("offer", &[TrackKind::Video])
    );
    assert!(video.reference_count() > 1);
}
