use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use screenshare_client::{SignalingError, SignalingOutput};
use screenshare_core::{IceCandidate, ParticipantId, SignalMessage};

/// Records every outgoing signal instead of sending it.
pub struct MockSignalingOutput {
    local: ParticipantId,
    sent: Mutex<Vec<SignalMessage>>,
    connected: AtomicBool,
}

impl MockSignalingOutput {
    pub fn new(local: &ParticipantId) -> Self {
        Self {
            local: local.clone(),
            sent: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SignalMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn offers_to(&self, remote: &ParticipantId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                SignalMessage::Offer { to, sdp, .. } if &to == remote => Some(sdp),
                _ => None,
            })
            .collect()
    }

    pub fn answers_to(&self, remote: &ParticipantId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                SignalMessage::Answer { to, sdp, .. } if &to == remote => Some(sdp),
                _ => None,
            })
            .collect()
    }

    pub fn candidates_to(&self, remote: &ParticipantId) -> Vec<IceCandidate> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                SignalMessage::Candidate { to, candidate, .. } if &to == remote => Some(candidate),
                _ => None,
            })
            .collect()
    }

    pub fn offer_requests_to(&self, remote: &ParticipantId) -> usize {
        self.sent()
            .iter()
            .filter(|m| matches!(m, SignalMessage::Renegotiate { to, .. } if to == remote))
            .count()
    }

    fn record(&self, msg: SignalMessage) -> Result<(), SignalingError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SignalingError::Disconnected);
        }
        self.sent.lock().unwrap().push(msg);
        Ok(())
    }
}

#[async_trait]
impl SignalingOutput for MockSignalingOutput {
    async fn send_offer(&self, to: ParticipantId, sdp: String) -> Result<(), SignalingError> {
        self.record(SignalMessage::Offer {
            from: self.local.clone(),
            to,
            sdp,
        })
    }

    async fn send_answer(&self, to: ParticipantId, sdp: String) -> Result<(), SignalingError> {
        self.record(SignalMessage::Answer {
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
        self.record(SignalMessage::Candidate {
            from: self.local.clone(),
            to,
            candidate,
        })
    }

    async fn send_renegotiate(&self, to: ParticipantId) -> Result<(), SignalingError> {
        self.record(SignalMessage::Renegotiate {
            from: self.local.clone(),
            to,
        })
    }

    async fn send(&self, msg: SignalMessage) -> Result<(), SignalingError> {
        self.record(msg)
    }
}
