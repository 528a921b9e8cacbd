use crate::config::BackoffConfig;
use crate::error::SignalingError;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use futures::{Sink, SinkExt, StreamExt};
use screenshare_core::{IceCandidate, ParticipantId, SignalMessage};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Message(SignalMessage),
    Disconnected,
}

type Outbound = Option<mpsc::UnboundedSender<SignalMessage>>;

/// Outbound half of the channel. Fails fast while the socket is down.
#[derive(Clone)]
pub struct SignalingSink {
    local: ParticipantId,
    outbound: watch::Receiver<Outbound>,
}

impl SignalingSink {
    pub fn is_connected(&self) -> bool {
        self.outbound.borrow().is_some()
    }

    fn push(&self, msg: SignalMessage) -> Result<(), SignalingError> {
        let outbound = self.outbound.borrow();
        let tx = outbound.as_ref().ok_or(SignalingError::Disconnected)?;
        tx.send(msg).map_err(|_| SignalingError::Disconnected)
    }
}

#[async_trait]
impl SignalingOutput for SignalingSink {
    async fn send_offer(&self, to: ParticipantId, sdp: String) -> Result<(), SignalingError> {
        self.push(SignalMessage::Offer {
            from: self.local.clone(),
            to,
            sdp,
        })
    }

    async fn send_answer(&self, to: ParticipantId, sdp: String) -> Result<(), SignalingError> {
        self.push(SignalMessage::Answer {
            from: self.local.clone(),
            to,
            sdp,
        })
    }

    async fn send_candidate(
        &self,
        to: ParticipantId,
        candidate: IceCandidate,
    ) -> Result<(), SignalingError> {
        self.push(SignalMessage::Candidate {
            from: self.local.clone(),
            to,
            candidate,
        })
    }

    async fn send_renegotiate(&self, to: ParticipantId) -> Result<(), SignalingError> {
        self.push(SignalMessage::Renegotiate {
            from: self.local.clone(),
            to,
        })
    }

    async fn send(&self, msg: SignalMessage) -> Result<(), SignalingError> {
        self.push(msg)
    }
}

/// Постоянное соединение с релеем с автоматическим переподключением.
pub struct SignalingChannel {
    sink: SignalingSink,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    closing: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SignalingChannel {
    /// Starts dialing `url` in the background. Nothing is sent until the
    /// first `ChannelEvent::Connected`.
    pub fn connect(url: String, local: ParticipantId, backoff: BackoffConfig) -> Self {
        let (outbound_tx, outbound_rx) = watch::channel(None);
        let (events_tx, events) = mpsc::unbounded_channel();
        let (closing, closing_rx) = watch::channel(false);

        let task = tokio::spawn(run_channel(
            url,
            backoff,
            outbound_tx,
            events_tx,
            closing_rx,
        ));

        Self {
            sink: SignalingSink {
                local,
                outbound: outbound_rx,
            },
            events,
            closing,
            task,
        }
    }

    pub fn sink(&self) -> SignalingSink {
        self.sink.clone()
    }

    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    /// Drops the socket and stops reconnecting.
    pub fn shutdown(&self) {
        self.task.abort();
    }

    /// Writes out everything already queued, closes the socket and stops
    /// reconnecting. Falls back to `shutdown` after `grace`.
    pub async fn close(&mut self, grace: Duration) {
        self.closing.send_replace(true);
        if timeout(grace, &mut self.task).await.is_err() {
            debug!("Signaling channel did not close in time, aborting");
            self.task.abort();
        }
    }
}

impl Drop for SignalingChannel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_channel(
    url: String,
    backoff: BackoffConfig,
    outbound: watch::Sender<Outbound>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    mut closing: watch::Receiver<bool>,
) {
    let mut delay = backoff.initial;

    loop {
        if *closing.borrow() {
            return;
        }

        let connected = tokio::select! {
            connected = connect_async(url.as_str()) => connected,
            _ = closing.wait_for(|closing| *closing) => return,
        };

        match connected {
            Ok((socket, _)) => {
                info!("Signaling connected to {}", url);
                delay = backoff.initial;

                let (mut sender, mut receiver) = socket.split();
                let (tx, mut rx) = mpsc::unbounded_channel::<SignalMessage>();
                outbound.send_replace(Some(tx));

                if events.send(ChannelEvent::Connected).is_err() {
                    return;
                }

                loop {
                    tokio::select! {
                        frame = receiver.next() => match frame {
                            Some(Ok(Message::Text(text))) => {
                                match serde_json::from_str::<SignalMessage>(text.as_str()) {
                                    Ok(msg) => {
                                        if events.send(ChannelEvent::Message(msg)).is_err() {
                                            return;
                                        }
                                    }
                                    Err(e) => warn!("Invalid SignalMessage from relay: {:?}", e),
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                warn!("Signaling socket error: {}", e);
                                break;
                            }
                        },

                        msg = rx.recv() => {
                            let Some(msg) = msg else { break };
                            if write_message(&mut sender, &msg).await.is_err() {
                                break;
                            }
                        }

                        _ = async { let _ = closing.wait_for(|closing| *closing).await; } => {
                            outbound.send_replace(None);
                            while let Ok(msg) = rx.try_recv() {
                                if write_message(&mut sender, &msg).await.is_err() {
                                    break;
                                }
                            }
                            let _ = sender.send(Message::Close(None)).await;
                            info!("Signaling closed to {}", url);
                            return;
                        }
                    }
                }

                // Whatever was queued for the dead socket is discarded with `rx`.
                outbound.send_replace(None);
                info!("Signaling disconnected from {}", url);
                if events.send(ChannelEvent::Disconnected).is_err() {
                    return;
                }
            }
            Err(e) => {
                debug!("Signaling connect to {} failed: {}", url, e);
            }
        }

        if events.is_closed() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = closing.wait_for(|closing| *closing) => return,
        }
        delay = backoff.next_delay(delay);
    }
}

async fn write_message<S>(sender: &mut S, msg: &SignalMessage) -> Result<(), S::Error>
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            warn!("{}", SignalingError::Encode(e));
            return Ok(());
        }
    };
    sender.send(Message::text(json)).await
}
