pub mod transport_tests;

use std::net::SocketAddr;
use std::sync::Arc;

use screenshare_relay::{RoomManager, SignalingService};
use tokio::net::TcpListener;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Serves a relay on an ephemeral port and returns its `ws://` base address.
pub async fn spawn_test_relay() -> (String, RoomManager) {
    let registry = RoomManager::new();
    let service = SignalingService::new(Arc::new(registry.clone()), Vec::new(), None);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr: SocketAddr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        let _ = axum::serve(listener, service.router()).await;
    });

    (format!("ws://{}", addr), registry)
}
