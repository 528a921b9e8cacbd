use screenshare_core::{ParticipantId, RoomId};
use screenshare_relay::MembershipRegistry;

use crate::integration::session_tests::{join_peer, wait_all_stable};
use crate::integration::{init_tracing, spawn_test_relay};

#[tokio::test]
async fn test_reserved_characters_in_id() {
    init_tracing();

    let (url, registry) = spawn_test_relay().await;
    let odd = join_peer(&url, "team/alice smith?#1").await;
    let bob = join_peer(&url, "bob").await;
    wait_all_stable(&odd, 1).await;
    wait_all_stable(&bob, 1).await;

    let odd_id = ParticipantId::from("team/alice smith?#1");
    let members = registry.snapshot(&RoomId::from("standup")).await;
    assert_eq!(members, vec![odd_id.clone(), ParticipantId::from("bob")]);
    assert!(bob.handle.view().borrow().links.contains_key(&odd_id));
}
