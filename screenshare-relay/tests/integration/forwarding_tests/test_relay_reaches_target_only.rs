use screenshare_core::{IceCandidate, ParticipantId, RoomId, SignalMessage};
use screenshare_relay::{ConnectionId, MembershipRegistry, RelayOutcome, RoomManager};

use crate::integration::init_tracing;
use crate::utils::test_outbox;

#[tokio::test]
async fn test_relay_reaches_target_only() {
    init_tracing();

    let registry = RoomManager::new();
    let room = RoomId::from("review");
    let alice = ParticipantId::from("alice");
    let bob = ParticipantId::from("bob");
    let carol = ParticipantId::from("carol");

    let (alice_tx, mut alice_rx) = test_outbox();
    let (bob_tx, mut bob_rx) = test_outbox();
    let (carol_tx, mut carol_rx) = test_outbox();

    registry.join(&room, alice.clone(), ConnectionId(1), alice_tx).await;
    registry.join(&room, bob.clone(), ConnectionId(2), bob_tx).await;
    registry.join(&room, carol.clone(), ConnectionId(3), carol_tx).await;
    alice_rx.drain();
    bob_rx.drain();

    let offer = SignalMessage::Offer {
        from: alice.clone(),
        to: carol.clone(),
        sdp: "v=0".to_owned(),
    };
    assert_eq!(registry.relay(&room, offer.clone()).await, RelayOutcome::Delivered);
    assert_eq!(carol_rx.next(1000).await, Some(offer));

    let candidate = SignalMessage::Candidate {
        from: carol.clone(),
        to: alice.clone(),
        candidate: IceCandidate {
            candidate: "candidate:1 1 udp 1 10.0.0.3 5000 typ host".to_owned(),
            sdp_mid: Some("0".to_owned()),
            sdp_m_line_index: Some(0),
            username_fragment: None,
        },
    };
    assert_eq!(
        registry.relay(&room, candidate.clone()).await,
        RelayOutcome::Delivered
    );
    assert_eq!(alice_rx.next(1000).await, Some(candidate));

    assert!(bob_rx.drain().is_empty(), "Bystander must not see relayed signals");
}
