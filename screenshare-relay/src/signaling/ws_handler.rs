use crate::signaling::{Connection, SignalingService};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use screenshare_core::{ParticipantId, SignalMessage};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(participant_id): Path<String>,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    let participant_id = ParticipantId::from(participant_id);

    ws.on_upgrade(move |socket| handle_socket(socket, participant_id, service))
}

async fn handle_socket(socket: WebSocket, participant_id: ParticipantId, service: SignalingService) {
    info!("New WebSocket connection: {:?}", participant_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<SignalMessage>();

    let _ = tx.send(SignalMessage::IceConfig {
        ice_servers: service.get_ice_servers(),
    });

    let connection = Arc::new(Mutex::new(Connection::new(
        participant_id.clone(),
        tx,
        service,
    )));

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let connection = connection.clone();
        let participant_id = participant_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(signal) => connection.lock().await.handle(signal).await,
                        Err(e) => {
                            warn!("Invalid SignalMessage from {:?}: {:?}", participant_id, e)
                        }
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    connection.lock().await.close().await;
    info!("WebSocket disconnected: {:?}", participant_id);
}
