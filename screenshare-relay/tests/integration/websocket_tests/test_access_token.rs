use screenshare_core::{RoomId, SignalMessage};
use screenshare_relay::MembershipRegistry;

use crate::integration::{init_tracing, spawn_test_relay};
use crate::utils::{SIGNAL_TIMEOUT_MS, TestClient};

#[tokio::test]
async fn test_access_token() {
    init_tracing();

    let (addr, registry) = spawn_test_relay(Some("letmein")).await;
    let room = RoomId::from("private");

    let mut client = TestClient::connect(addr, "eve")
        .await
        .expect("Failed to connect");
    client.recv(SIGNAL_TIMEOUT_MS).await.expect("No ice-config");

    client
        .send(&SignalMessage::Join {
            room_id: room.clone(),
            token: Some("guess".to_owned()),
        })
        .await
        .expect("Join failed");
    let reply = client.recv(SIGNAL_TIMEOUT_MS).await.expect("No reply");
    assert!(matches!(reply, SignalMessage::Error { .. }), "got {:?}", reply);
    assert_eq!(registry.room_count(), 0);

    client
        .send(&SignalMessage::Join {
            room_id: room,
            token: Some("letmein".to_owned()),
        })
        .await
        .expect("Join failed");
    let reply = client.recv(SIGNAL_TIMEOUT_MS).await.expect("No reply");
    assert_eq!(reply, SignalMessage::Existing { participants: vec![] });
    assert_eq!(registry.room_count(), 1);

    client.close().await.expect("Close failed");
}
