use screenshare_client::SessionError;
use screenshare_relay::MembershipRegistry;

use crate::integration::session_tests::{VIEW_TIMEOUT, join_peer, wait_all_stable};
use crate::integration::{init_tracing, spawn_test_relay};

#[tokio::test]
async fn test_leave_room() {
    init_tracing();

    let (url, registry) = spawn_test_relay().await;
    let alice = join_peer(&url, "alice").await;
    let bob = join_peer(&url, "bob").await;
    wait_all_stable(&alice, 1).await;
    wait_all_stable(&bob, 1).await;

    bob.handle.start_sharing().await.expect("Bob failed to share");

    bob.handle.leave_room().await;
    bob.handle.leave_room().await;

    let bob_transport = bob.transports.latest_for(alice.id()).unwrap();
    assert!(bob_transport.is_closed());
    for track in bob.capture.all_issued() {
        assert!(track.is_ended());
    }
    assert_eq!(
        bob.handle.start_sharing().await,
        Err(SessionError::Closed)
    );
    assert_eq!(bob.handle.stop_sharing().await, Ok(()));

    let view = alice
        .handle
        .wait_for_view(|v| v.links.is_empty() && v.remote.is_empty(), VIEW_TIMEOUT)
        .await;
    assert!(view.is_some(), "alice kept bob's link");
    assert!(alice.transports.latest_for(bob.id()).unwrap().is_closed());
    assert_eq!(registry.room_count(), 1);

    alice.handle.leave_room().await;
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert_eq!(registry.room_count(), 0);
}
